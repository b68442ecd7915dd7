//! Structured input events produced by the runtime.

use crate::core::input::{parse_key, parse_key_event_type, parse_text, KeyEventType};

const PASTE_START: &str = "\x1b[200~";
const PASTE_END: &str = "\x1b[201~";

/// Input event delivered to components.
///
/// `raw` is the exact byte sequence the terminal sent; `key_id` is the
/// normalized identifier keybindings match against. Text and paste events
/// carry decoded text so widgets never parse escape sequences themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key {
        raw: String,
        key_id: String,
        event_type: KeyEventType,
    },
    Text {
        raw: String,
        text: String,
        event_type: KeyEventType,
    },
    Paste {
        raw: String,
        text: String,
    },
    Resize {
        columns: u16,
        rows: u16,
    },
    UnknownRaw {
        raw: String,
    },
}

/// Split one input chunk into events, honoring bracketed-paste markers.
pub fn parse_input_events(data: &str, kitty_active: bool) -> Vec<InputEvent> {
    let mut events = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        let Some((head, tail)) = rest.split_once(PASTE_START) else {
            push_keyboard_events(rest, kitty_active, &mut events);
            break;
        };
        push_keyboard_events(head, kitty_active, &mut events);

        match tail.split_once(PASTE_END) {
            Some((pasted, after)) => {
                events.push(InputEvent::Paste {
                    raw: format!("{PASTE_START}{pasted}{PASTE_END}"),
                    text: pasted.to_string(),
                });
                rest = after;
            }
            None => {
                // Unterminated paste: surface the bytes rather than guessing.
                events.push(InputEvent::UnknownRaw {
                    raw: format!("{PASTE_START}{tail}"),
                });
                break;
            }
        }
    }
    events
}

fn push_keyboard_events(data: &str, kitty_active: bool, events: &mut Vec<InputEvent>) {
    if data.is_empty() {
        return;
    }
    let event_type = parse_key_event_type(data);

    let event = if let Some(text) = parse_text(data, kitty_active) {
        // Releases of printable keys carry no new text.
        if event_type == KeyEventType::Release {
            return;
        }
        InputEvent::Text {
            raw: data.to_string(),
            text,
            event_type,
        }
    } else if let Some(key_id) = parse_key(data, kitty_active) {
        InputEvent::Key {
            raw: data.to_string(),
            key_id,
            event_type,
        }
    } else {
        InputEvent::UnknownRaw {
            raw: data.to_string(),
        }
    };
    events.push(event);
}

#[cfg(test)]
mod tests {
    use super::{parse_input_events, InputEvent};
    use crate::core::input::KeyEventType;

    fn text(raw: &str) -> InputEvent {
        InputEvent::Text {
            raw: raw.to_string(),
            text: raw.to_string(),
            event_type: KeyEventType::Press,
        }
    }

    #[test]
    fn space_is_text_not_key() {
        assert_eq!(parse_input_events(" ", false), vec![text(" ")]);
    }

    #[test]
    fn printable_utf8_is_text() {
        assert_eq!(parse_input_events("tag", false), vec![text("tag")]);
    }

    #[test]
    fn control_keys_become_key_events() {
        assert_eq!(
            parse_input_events("\r", false),
            vec![InputEvent::Key {
                raw: "\r".to_string(),
                key_id: "enter".to_string(),
                event_type: KeyEventType::Press,
            }]
        );
        assert_eq!(
            parse_input_events("\x1b[A", false),
            vec![InputEvent::Key {
                raw: "\x1b[A".to_string(),
                key_id: "up".to_string(),
                event_type: KeyEventType::Press,
            }]
        );
    }

    #[test]
    fn key_release_carries_event_type() {
        assert_eq!(
            parse_input_events("\x1b[1;1:3D", true),
            vec![InputEvent::Key {
                raw: "\x1b[1;1:3D".to_string(),
                key_id: "left".to_string(),
                event_type: KeyEventType::Release,
            }]
        );
    }

    #[test]
    fn bracketed_paste_is_parsed_and_can_be_mixed() {
        assert_eq!(
            parse_input_events("a\x1b[200~b\x1b[201~c", false),
            vec![
                text("a"),
                InputEvent::Paste {
                    raw: "\x1b[200~b\x1b[201~".to_string(),
                    text: "b".to_string(),
                },
                text("c"),
            ]
        );
    }

    #[test]
    fn unterminated_paste_is_surfaced_raw() {
        assert_eq!(
            parse_input_events("\x1b[200~abc", false),
            vec![InputEvent::UnknownRaw {
                raw: "\x1b[200~abc".to_string(),
            }]
        );
    }
}
