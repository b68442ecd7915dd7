//! Key parsing: raw terminal byte sequences to normalized key ids.
//!
//! Key ids are lowercase, modifier-prefixed strings such as `enter`,
//! `alt+left`, or `ctrl+shift+p`. Modifiers are emitted in `shift`, `ctrl`,
//! `alt` order so ids compare with plain string equality.

use std::sync::atomic::{AtomicBool, Ordering};

static KITTY_ACTIVE: AtomicBool = AtomicBool::new(false);

pub fn set_kitty_protocol_active(active: bool) {
    KITTY_ACTIVE.store(active, Ordering::SeqCst);
}

pub fn is_kitty_protocol_active() -> bool {
    KITTY_ACTIVE.load(Ordering::SeqCst)
}

// Kitty modifier bitfield (value minus one on the wire).
const SHIFT_BIT: u8 = 1;
const ALT_BIT: u8 = 2;
const CTRL_BIT: u8 = 4;
const LOCK_BITS: u8 = 64 + 128;

const CP_ESCAPE: i32 = 27;
const CP_TAB: i32 = 9;
const CP_ENTER: i32 = 13;
const CP_SPACE: i32 = 32;
const CP_BACKSPACE: i32 = 127;
const CP_KP_ENTER: i32 = 57414;

// Sentinels for keys without a codepoint (letter-form and tilde-form finals).
const CP_UP: i32 = -1;
const CP_DOWN: i32 = -2;
const CP_RIGHT: i32 = -3;
const CP_LEFT: i32 = -4;
const CP_DELETE: i32 = -10;
const CP_HOME: i32 = -14;
const CP_END: i32 = -15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventType {
    Press,
    Repeat,
    Release,
}

#[derive(Debug, Clone, Copy)]
struct KittyKey {
    code: i32,
    mods: u8,
    event: KeyEventType,
}

/// Kitty sequences carry the event type as `:3` before the final byte.
const RELEASE_MARKERS: &[&str] = &[":3u", ":3~", ":3A", ":3B", ":3C", ":3D", ":3H", ":3F"];

/// Quick scan for kitty key-release sequences without a full parse.
pub fn is_key_release(data: &str) -> bool {
    if data.contains("\x1b[200~") {
        return false;
    }
    RELEASE_MARKERS.iter().any(|marker| data.contains(marker))
}

/// Event type of a raw sequence (Press unless a kitty sequence says otherwise).
pub fn parse_key_event_type(data: &str) -> KeyEventType {
    match parse_kitty_sequence(data) {
        Some(kitty) => kitty.event,
        None => KeyEventType::Press,
    }
}

/// Decode `data` as typed text, if it is printable input rather than a key chord.
pub fn parse_text(data: &str, kitty_active: bool) -> Option<String> {
    if data.is_empty() {
        return None;
    }

    if kitty_active {
        if let Some(kitty) = parse_kitty_sequence(data) {
            if kitty.mods & !LOCK_BITS & !SHIFT_BIT != 0 {
                return None;
            }
            // Functional keys live in the private use area (57344+).
            if kitty.code >= 57344 {
                return None;
            }
            if kitty.code >= 32 && kitty.code != CP_BACKSPACE {
                let ch = char::from_u32(kitty.code as u32)?;
                return Some(ch.to_string());
            }
            return None;
        }
    }

    // Plain text: no escapes, no control bytes. Space alone still counts.
    if data == " " {
        return Some(data.to_string());
    }
    if data.trim().is_empty() {
        return None;
    }
    if data.chars().any(|ch| ch.is_control()) {
        return None;
    }
    Some(data.to_string())
}

/// Normalized key id for a raw sequence, or `None` when it is not a key chord.
pub fn parse_key(data: &str, kitty_active: bool) -> Option<String> {
    if let Some(kitty) = parse_kitty_sequence(data) {
        return kitty_key_id(kitty);
    }

    if let Some(key_id) = legacy_key_id(data, kitty_active) {
        return Some(key_id.to_string());
    }

    if data.len() == 2 && data.starts_with('\x1b') {
        let code = data.as_bytes()[1];
        if (1..=26).contains(&code) {
            return Some(format!("ctrl+alt+{}", (code + 96) as char));
        }
        if code.is_ascii_lowercase() {
            return Some(format!("alt+{}", code as char));
        }
    }

    if data.len() == 1 {
        let code = data.as_bytes()[0];
        if (1..=26).contains(&code) {
            return Some(format!("ctrl+{}", (code + 96) as char));
        }
        if (32..=126).contains(&code) {
            return Some(data.to_string());
        }
    }

    None
}

/// Whether `data` is the raw sequence for the given key id.
pub fn matches_key(data: &str, key_id: &str) -> bool {
    let Some(expected) = normalize_key_id(key_id) else {
        return false;
    };
    parse_key(data, is_kitty_protocol_active()).as_deref() == Some(expected.as_str())
}

fn with_mods(mods: &[&str], key: &str) -> String {
    if mods.is_empty() {
        return key.to_string();
    }
    let mut combined = mods.join("+");
    combined.push('+');
    combined.push_str(key);
    combined
}

/// Canonicalize a key id: lowercase, modifiers in `shift`, `ctrl`, `alt` order.
fn normalize_key_id(key_id: &str) -> Option<String> {
    let lowered = key_id.to_lowercase();
    let parts: Vec<&str> = lowered.split('+').collect();
    let key = *parts.last()?;
    if key.is_empty() {
        return None;
    }

    let key = match key {
        "esc" => "escape",
        "return" => "enter",
        other => other,
    };

    let mods: Vec<&str> = ["shift", "ctrl", "alt"]
        .into_iter()
        .filter(|modifier| parts.contains(modifier))
        .collect();
    Some(with_mods(&mods, key))
}

fn kitty_key_id(kitty: KittyKey) -> Option<String> {
    let active = kitty.mods & !LOCK_BITS;
    let mods: Vec<&str> = [
        (SHIFT_BIT, "shift"),
        (CTRL_BIT, "ctrl"),
        (ALT_BIT, "alt"),
    ]
    .into_iter()
    .filter(|(bit, _)| active & bit != 0)
    .map(|(_, name)| name)
    .collect();

    let key_name = match kitty.code {
        CP_ESCAPE => "escape".to_string(),
        CP_TAB => "tab".to_string(),
        CP_ENTER | CP_KP_ENTER => "enter".to_string(),
        CP_SPACE => "space".to_string(),
        CP_BACKSPACE => "backspace".to_string(),
        CP_DELETE => "delete".to_string(),
        CP_HOME => "home".to_string(),
        CP_END => "end".to_string(),
        CP_UP => "up".to_string(),
        CP_DOWN => "down".to_string(),
        CP_LEFT => "left".to_string(),
        CP_RIGHT => "right".to_string(),
        cp if (33..=126).contains(&cp) => (cp as u8 as char).to_ascii_lowercase().to_string(),
        _ => return None,
    };

    Some(with_mods(&mods, &key_name))
}

fn legacy_key_id(data: &str, kitty_active: bool) -> Option<&'static str> {
    let id = match data {
        "\x1b" => "escape",
        "\t" => "tab",
        "\x1b[Z" => "shift+tab",
        "\r" | "\x1bOM" => "enter",
        "\n" if !kitty_active => "enter",
        "\n" if kitty_active => "shift+enter",
        "\x1b\r" if kitty_active => "shift+enter",
        "\x1b\r" => "alt+enter",
        "\x00" => "ctrl+space",
        "\x1b " if !kitty_active => "alt+space",
        "\x7f" | "\x08" => "backspace",
        "\x1b\x7f" | "\x1b\x08" => "alt+backspace",
        "\x1b[A" | "\x1bOA" => "up",
        "\x1b[B" | "\x1bOB" => "down",
        "\x1b[C" | "\x1bOC" => "right",
        "\x1b[D" | "\x1bOD" => "left",
        "\x1b[H" | "\x1bOH" | "\x1b[1~" => "home",
        "\x1b[F" | "\x1bOF" | "\x1b[4~" => "end",
        "\x1b[3~" => "delete",
        "\x1bb" if !kitty_active => "alt+b",
        "\x1bf" if !kitty_active => "alt+f",
        "\x1c" => "ctrl+\\",
        "\x1d" => "ctrl+]",
        "\x1f" => "ctrl+-",
        _ => return None,
    };
    Some(id)
}

/// Split a sequence body into the code field and the optional `;mod(:event)` field.
fn split_fields(body: &str) -> (&str, Option<&str>) {
    match body.split_once(';') {
        Some((code, rest)) => (code, Some(rest)),
        None => (body, None),
    }
}

fn parse_modifier_field(mod_part: Option<&str>) -> (u8, KeyEventType) {
    let Some(mod_part) = mod_part else {
        return (0, KeyEventType::Press);
    };
    let (mod_value, event_field) = match mod_part.split_once(':') {
        Some((value, event)) => (value, Some(event)),
        None => (mod_part, None),
    };
    let mods = mod_value.parse::<u8>().unwrap_or(1).saturating_sub(1);
    let event = match event_field.and_then(|value| value.parse::<u8>().ok()) {
        Some(2) => KeyEventType::Repeat,
        Some(3) => KeyEventType::Release,
        _ => KeyEventType::Press,
    };
    (mods, event)
}

fn parse_kitty_sequence(data: &str) -> Option<KittyKey> {
    let stripped = data.strip_prefix("\x1b[")?;

    // CSI-u: ESC [ code ; mod(:event) u
    if let Some(body) = stripped.strip_suffix('u') {
        let (code_part, mod_part) = split_fields(body);
        // The code field may carry alternate keys (code:shifted:base); only
        // the primary codepoint matters here.
        let code = code_part.split(':').next()?.parse::<i32>().ok()?;
        let (mods, event) = parse_modifier_field(mod_part);
        return Some(KittyKey { code, mods, event });
    }

    // Tilde form: ESC [ code ; mod(:event) ~
    if let Some(body) = stripped.strip_suffix('~') {
        let (code_part, mod_part) = split_fields(body);
        let code = match code_part.parse::<i32>().ok()? {
            1 | 7 => CP_HOME,
            3 => CP_DELETE,
            4 | 8 => CP_END,
            _ => return None,
        };
        // Unmodified press of these keys is a plain legacy sequence, not kitty.
        if mod_part.is_none() {
            return None;
        }
        let (mods, event) = parse_modifier_field(mod_part);
        return Some(KittyKey { code, mods, event });
    }

    // Letter form: ESC [ 1 ; mod(:event) A/B/C/D/H/F
    let code = match stripped.chars().last()? {
        'A' => CP_UP,
        'B' => CP_DOWN,
        'C' => CP_RIGHT,
        'D' => CP_LEFT,
        'H' => CP_HOME,
        'F' => CP_END,
        _ => return None,
    };
    let body = &stripped[..stripped.len() - 1];
    let (code_part, mod_part) = split_fields(body);
    if code_part != "1" || mod_part.is_none() {
        return None;
    }
    let (mods, event) = parse_modifier_field(mod_part);
    Some(KittyKey { code, mods, event })
}

#[cfg(test)]
mod tests {
    use super::{
        is_key_release, matches_key, parse_key, parse_key_event_type, parse_text, KeyEventType,
    };

    #[test]
    fn legacy_sequences_parse_to_key_ids() {
        assert_eq!(parse_key("\r", false).as_deref(), Some("enter"));
        assert_eq!(parse_key("\x1b", false).as_deref(), Some("escape"));
        assert_eq!(parse_key("\x7f", false).as_deref(), Some("backspace"));
        assert_eq!(parse_key("\x1b[D", false).as_deref(), Some("left"));
        assert_eq!(parse_key("\x1b[Z", false).as_deref(), Some("shift+tab"));
        assert_eq!(parse_key("\x1b[3~", false).as_deref(), Some("delete"));
        assert_eq!(parse_key("\x03", false).as_deref(), Some("ctrl+c"));
        assert_eq!(parse_key("\x1bd", false).as_deref(), Some("alt+d"));
    }

    #[test]
    fn modified_arrows_parse_with_modifier_prefix() {
        assert_eq!(parse_key("\x1b[1;3D", false).as_deref(), Some("alt+left"));
        assert_eq!(parse_key("\x1b[1;3C", false).as_deref(), Some("alt+right"));
        assert_eq!(parse_key("\x1b[1;2A", false).as_deref(), Some("shift+up"));
        assert_eq!(parse_key("\x1b[1;5C", false).as_deref(), Some("ctrl+right"));
    }

    #[test]
    fn kitty_csi_u_sequences_parse() {
        assert_eq!(parse_key("\x1b[13u", true).as_deref(), Some("enter"));
        assert_eq!(parse_key("\x1b[127;1:3u", true).as_deref(), Some("backspace"));
        assert_eq!(parse_key("\x1b[9;2u", true).as_deref(), Some("shift+tab"));
    }

    #[test]
    fn kitty_release_detection() {
        assert!(is_key_release("\x1b[127;1:3u"));
        assert!(is_key_release("\x1b[1;1:3D"));
        assert!(!is_key_release("\x7f"));
        assert!(!is_key_release("\x1b[200~:3u\x1b[201~"));
        assert_eq!(parse_key_event_type("\x1b[127;1:3u"), KeyEventType::Release);
        assert_eq!(parse_key_event_type("\x1b[127;1:2u"), KeyEventType::Repeat);
        assert_eq!(parse_key_event_type("\x7f"), KeyEventType::Press);
    }

    #[test]
    fn printable_input_is_text() {
        assert_eq!(parse_text("a", false).as_deref(), Some("a"));
        assert_eq!(parse_text(" ", false).as_deref(), Some(" "));
        assert_eq!(parse_text("héllo", false).as_deref(), Some("héllo"));
        assert_eq!(parse_text("\r", false), None);
        assert_eq!(parse_text("\x1b[D", false), None);
    }

    #[test]
    fn kitty_text_codepoints_decode() {
        assert_eq!(parse_text("\x1b[97u", true).as_deref(), Some("a"));
        assert_eq!(parse_text("\x1b[97;5u", true), None);
    }

    #[test]
    fn matches_key_normalizes_modifier_order() {
        assert!(matches_key("\x1b[1;3D", "alt+left"));
        assert!(matches_key("\x1b[Z", "shift+tab"));
        assert!(matches_key("\r", "enter"));
        assert!(matches_key("\r", "return"));
        assert!(matches_key("\x17", "ctrl+w"));
        assert!(!matches_key("\x1b[D", "alt+left"));
    }
}
