//! Frame: one complete render of the widget tree.

use crate::core::component::CursorPos;

/// The lines a render produced, plus optional cursor metadata.
///
/// Lines carry their styling pre-baked as ANSI sequences; the renderer
/// treats them as opaque byte runs and only diffs them for equality.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Frame {
    lines: Vec<String>,
    cursor: Option<CursorPos>,
}

impl Frame {
    pub fn with_cursor(mut self, cursor: Option<CursorPos>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn cursor(&self) -> Option<CursorPos> {
        self.cursor
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn into_strings(self) -> Vec<String> {
        self.lines
    }
}

impl From<Vec<String>> for Frame {
    fn from(lines: Vec<String>) -> Self {
        Self {
            lines,
            cursor: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use crate::core::component::CursorPos;

    #[test]
    fn lines_pass_through_byte_for_byte() {
        let input: Vec<String> = vec![
            String::new(),
            " leading and trailing ".to_string(),
            "\u{1b}[31mred\u{1b}[0m".to_string(),
            "unicode: π你好".to_string(),
        ];
        let frame = Frame::from(input.clone());
        assert_eq!(frame.line_count(), 4);
        assert_eq!(frame.into_strings(), input);
    }

    #[test]
    fn cursor_metadata_travels_with_the_frame() {
        let frame =
            Frame::from(vec!["a".to_string()]).with_cursor(Some(CursorPos { row: 0, col: 1 }));
        assert_eq!(frame.cursor().map(|pos| pos.col), Some(1));
    }
}
