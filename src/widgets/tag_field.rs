//! Tag field widget.

use crate::core::component::{Component, Focusable};
use crate::core::component::CursorPos;
use crate::core::input::KeyEventType;
use crate::core::input_event::InputEvent;
use crate::core::keybindings::{FieldAction, FieldKeybindingsHandle};
use crate::core::text::utils::{
    grapheme_segments, is_punctuation_char, is_whitespace_char, truncate_to_width,
};
use crate::core::text::width::visible_width;

/// One element of the content sequence: inert text or a tag token.
///
/// Tags have no identity beyond their label and position; duplicates are
/// allowed, and adjacent text segments are never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Tag(String),
}

impl Segment {
    pub fn is_tag(&self) -> bool {
        matches!(self, Segment::Tag(_))
    }

    pub fn label(&self) -> &str {
        match self {
            Segment::Text(value) | Segment::Tag(value) => value,
        }
    }
}

pub struct TagFieldTheme {
    pub border: Box<dyn Fn(&str) -> String>,
    pub pill: Box<dyn Fn(&str) -> String>,
    pub selected_pill: Box<dyn Fn(&str) -> String>,
    pub dismiss: Box<dyn Fn(&str) -> String>,
    pub suggestion: Box<dyn Fn(&str) -> String>,
    pub highlighted_suggestion: Box<dyn Fn(&str) -> String>,
    pub heading: Box<dyn Fn(&str) -> String>,
}

impl Default for TagFieldTheme {
    fn default() -> Self {
        Self {
            border: Box::new(|text| text.to_string()),
            pill: Box::new(|text| format!("[{text}]")),
            selected_pill: Box::new(|text| format!("[{text}]")),
            dismiss: Box::new(|text| text.to_string()),
            suggestion: Box::new(|text| text.to_string()),
            highlighted_suggestion: Box::new(|text| text.to_string()),
            heading: Box::new(|text| text.to_string()),
        }
    }
}

/// Interactive tag input: free text interleaved with tag tokens, plus a
/// suggestion row. Owns the full content sequence, the pending buffer, and
/// the cursor offset into the buffer.
///
/// Suggestion entries are inserted with Tab/Shift+Tab to move the highlight
/// and Enter to insert; tag pills are selected with Alt+Left/Alt+Right and
/// removed with Delete. Escape drops any highlight or pill selection.
pub struct TagField {
    segments: Vec<Segment>,
    buffer: String,
    cursor: usize,
    focused: bool,
    last_cursor_pos: Option<CursorPos>,
    suggestions: Vec<String>,
    highlighted: Option<usize>,
    selected_tag: Option<usize>,
    heading: String,
    keybindings: FieldKeybindingsHandle,
    theme: TagFieldTheme,
}

impl TagField {
    pub fn new(
        suggestions: Vec<String>,
        keybindings: FieldKeybindingsHandle,
        theme: TagFieldTheme,
    ) -> Self {
        Self {
            segments: Vec::new(),
            buffer: String::new(),
            cursor: 0,
            focused: false,
            last_cursor_pos: None,
            suggestions,
            highlighted: None,
            selected_tag: None,
            heading: "Suggested:".to_string(),
            keybindings,
            theme,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn highlighted_suggestion(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn selected_tag(&self) -> Option<usize> {
        self.selected_tag
    }

    pub fn set_heading(&mut self, heading: impl Into<String>) {
        self.heading = heading.into();
    }

    /// Replace the pending buffer wholesale and place the cursor at the
    /// reported caret position, or at 0 when no caret is available.
    pub fn set_buffer(&mut self, value: impl Into<String>, caret: Option<usize>) {
        self.buffer = value.into();
        self.cursor = caret.unwrap_or(0).min(self.buffer.len());
        self.clamp_cursor();
    }

    /// Commit the pending buffer on Enter.
    ///
    /// The buffer is split at the cursor into `before`/`after`, and the
    /// sequence gains, in order: `before`, the FULL untrimmed buffer, and
    /// `after` (empty pieces skipped). The full buffer lands whole between
    /// the two halves rather than being spliced, so split text shows up
    /// twice; this mirrors the behavior being reproduced and is kept as is.
    /// Whitespace-only buffers commit nothing.
    pub fn commit(&mut self) {
        if self.buffer.trim().is_empty() {
            return;
        }
        let full = self.buffer.clone();
        self.split_and_append(Segment::Text(full));
    }

    /// Insert a tag through the same split-and-append path as `commit`.
    ///
    /// Always allowed, even mid-buffer; the buffer clears and input focus
    /// stays with the text field (any suggestion highlight is dropped).
    pub fn insert_tag(&mut self, label: impl Into<String>) {
        self.split_and_append(Segment::Tag(label.into()));
        self.highlighted = None;
    }

    /// Remove the segment at `index`, preserving the order of the rest.
    /// Out-of-range indices are a no-op.
    pub fn remove_tag(&mut self, index: usize) {
        if index >= self.segments.len() {
            return;
        }
        self.segments.remove(index);
        match self.selected_tag {
            Some(selected) if selected == index => self.selected_tag = None,
            Some(selected) if selected > index => self.selected_tag = Some(selected - 1),
            _ => {}
        }
    }

    fn split_and_append(&mut self, new_item: Segment) {
        self.clamp_cursor();
        let before = self.buffer[..self.cursor].to_string();
        let after = self.buffer[self.cursor..].to_string();

        if !before.is_empty() {
            self.segments.push(Segment::Text(before));
        }
        // Empty-string fragments are filtered; tags keep their slot even
        // with an empty label.
        match &new_item {
            Segment::Text(text) if text.is_empty() => {}
            _ => self.segments.push(new_item),
        }
        if !after.is_empty() {
            self.segments.push(Segment::Text(after));
        }

        self.buffer.clear();
        self.cursor = 0;
    }

    fn clamp_cursor(&mut self) {
        if self.cursor > self.buffer.len() {
            self.cursor = self.buffer.len();
        }
        while self.cursor > 0 && !self.buffer.is_char_boundary(self.cursor) {
            self.cursor -= 1;
        }
    }

    fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut next = String::with_capacity(self.buffer.len() + text.len());
        next.push_str(&self.buffer[..self.cursor]);
        next.push_str(text);
        next.push_str(&self.buffer[self.cursor..]);
        self.buffer = next;
        self.cursor += text.len();
    }

    fn handle_paste(&mut self, pasted_text: &str) {
        let cleaned = pasted_text.replace(['\r', '\n'], "");
        self.insert_text(&cleaned);
    }

    fn delete_char_backward(&mut self) {
        if self.buffer.is_empty() {
            // Only a trailing tag is removable this way; trailing text stays.
            if self.segments.last().is_some_and(Segment::is_tag) {
                self.segments.pop();
                self.selected_tag = None;
            }
            return;
        }
        if self.cursor == 0 {
            return;
        }
        let before_cursor = &self.buffer[..self.cursor];
        let grapheme_len = grapheme_segments(before_cursor)
            .next_back()
            .map(str::len)
            .unwrap_or(1);
        let start = self.cursor.saturating_sub(grapheme_len);
        self.buffer.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    fn delete_char_forward(&mut self) {
        if let Some(index) = self.selected_tag.take() {
            self.remove_tag(index);
            return;
        }
        if self.cursor >= self.buffer.len() {
            return;
        }
        let after_cursor = &self.buffer[self.cursor..];
        let grapheme_len = grapheme_segments(after_cursor)
            .next()
            .map(str::len)
            .unwrap_or(1);
        let end = (self.cursor + grapheme_len).min(self.buffer.len());
        self.buffer.replace_range(self.cursor..end, "");
    }

    fn delete_word_backward(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let old_cursor = self.cursor;
        self.move_word_backward();
        let delete_from = self.cursor;
        self.buffer.replace_range(delete_from..old_cursor, "");
        self.cursor = delete_from;
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let before_cursor = &self.buffer[..self.cursor];
        let grapheme_len = grapheme_segments(before_cursor)
            .next_back()
            .map(str::len)
            .unwrap_or(1);
        self.cursor = self.cursor.saturating_sub(grapheme_len);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.buffer.len() {
            return;
        }
        let after_cursor = &self.buffer[self.cursor..];
        let grapheme_len = grapheme_segments(after_cursor)
            .next()
            .map(str::len)
            .unwrap_or(1);
        self.cursor = (self.cursor + grapheme_len).min(self.buffer.len());
    }

    fn move_word_backward(&mut self) {
        let mut graphemes: Vec<&str> = grapheme_segments(&self.buffer[..self.cursor]).collect();
        let mut cursor = self.cursor;

        while let Some(last) = graphemes.last() {
            if last.chars().any(is_whitespace_char) {
                cursor = cursor.saturating_sub(last.len());
                graphemes.pop();
            } else {
                break;
            }
        }

        let stop_on_punctuation = graphemes
            .last()
            .is_some_and(|seg| seg.chars().any(is_punctuation_char));
        while let Some(last) = graphemes.last() {
            let is_whitespace = last.chars().any(is_whitespace_char);
            let is_punctuation = last.chars().any(is_punctuation_char);
            if is_whitespace || is_punctuation != stop_on_punctuation {
                break;
            }
            cursor = cursor.saturating_sub(last.len());
            graphemes.pop();
        }

        self.cursor = cursor;
    }

    fn move_word_forward(&mut self) {
        let mut iter = grapheme_segments(&self.buffer[self.cursor..]).peekable();
        let mut cursor = self.cursor;

        while let Some(seg) = iter.peek() {
            if seg.chars().any(is_whitespace_char) {
                cursor += seg.len();
                iter.next();
            } else {
                break;
            }
        }

        let stop_on_punctuation = iter
            .peek()
            .is_some_and(|seg| seg.chars().any(is_punctuation_char));
        while let Some(seg) = iter.peek() {
            let is_whitespace = seg.chars().any(is_whitespace_char);
            let is_punctuation = seg.chars().any(is_punctuation_char);
            if is_whitespace || is_punctuation != stop_on_punctuation {
                break;
            }
            cursor += seg.len();
            iter.next();
        }

        self.cursor = cursor;
    }

    fn tag_indices(&self) -> Vec<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| segment.is_tag())
            .map(|(index, _)| index)
            .collect()
    }

    fn select_prev_tag(&mut self) {
        let tags = self.tag_indices();
        if tags.is_empty() {
            return;
        }
        self.selected_tag = match self.selected_tag {
            None => tags.last().copied(),
            Some(current) => tags
                .iter()
                .rev()
                .find(|&&index| index < current)
                .copied()
                .or(Some(current)),
        };
    }

    fn select_next_tag(&mut self) {
        let tags = self.tag_indices();
        if tags.is_empty() {
            return;
        }
        self.selected_tag = match self.selected_tag {
            None => tags.first().copied(),
            Some(current) => tags
                .iter()
                .find(|&&index| index > current)
                .copied()
                .or(Some(current)),
        };
    }

    fn highlight_next_suggestion(&mut self) {
        if self.suggestions.is_empty() {
            return;
        }
        self.highlighted = Some(match self.highlighted {
            None => 0,
            Some(current) => (current + 1) % self.suggestions.len(),
        });
    }

    fn highlight_prev_suggestion(&mut self) {
        if self.suggestions.is_empty() {
            return;
        }
        self.highlighted = Some(match self.highlighted {
            None => self.suggestions.len() - 1,
            Some(0) => self.suggestions.len() - 1,
            Some(current) => current - 1,
        });
    }

    fn render_segment(&self, index: usize, segment: &Segment) -> String {
        match segment {
            Segment::Text(text) => text.clone(),
            Segment::Tag(label) => {
                let body = format!(" {label} ");
                let pill = if self.selected_tag == Some(index) {
                    (self.theme.selected_pill)(&body)
                } else {
                    (self.theme.pill)(&body)
                };
                format!("{pill}{}", (self.theme.dismiss)("✕"))
            }
        }
    }

    fn render_field(&self) -> String {
        if !self.focused {
            return self.buffer.clone();
        }

        let before_cursor = &self.buffer[..self.cursor];
        let after_slice = &self.buffer[self.cursor..];
        let mut graphemes = grapheme_segments(after_slice);

        let (at_cursor, after_cursor) = match graphemes.next() {
            Some(grapheme) => (grapheme, &after_slice[grapheme.len()..]),
            None => (" ", ""),
        };

        format!("{before_cursor}\x1b[7m{at_cursor}\x1b[27m{after_cursor}")
    }

    fn render_suggestion_row(&self) -> String {
        let mut row = (self.theme.heading)(&self.heading);
        for (index, suggestion) in self.suggestions.iter().enumerate() {
            let entry = format!("[{suggestion}]");
            let styled = if self.highlighted == Some(index) {
                (self.theme.highlighted_suggestion)(&entry)
            } else {
                (self.theme.suggestion)(&entry)
            };
            row.push(' ');
            row.push_str(&styled);
        }
        row
    }
}

impl Component for TagField {
    fn render(&mut self, width: usize) -> Vec<String> {
        self.clamp_cursor();
        self.last_cursor_pos = None;

        let width = width.max(6);
        let inner_width = width - 4;

        let mut content = String::new();
        let mut content_prefix_width = 0;
        for (index, segment) in self.segments.iter().enumerate() {
            content.push_str(&self.render_segment(index, segment));
            content.push(' ');
        }
        content_prefix_width += visible_width(&content);
        content.push_str(&self.render_field());

        if self.focused {
            let col = 2 + content_prefix_width + visible_width(&self.buffer[..self.cursor]);
            self.last_cursor_pos = Some(CursorPos {
                row: 1,
                col: col.min(width - 1),
            });
        }

        let horizontal = "─".repeat(width - 2);
        let top = (self.theme.border)(&format!("╭{horizontal}╮"));
        let bottom = (self.theme.border)(&format!("╰{horizontal}╯"));
        let bar = (self.theme.border)("│");
        let body = truncate_to_width(&content, inner_width, "…", true);

        vec![
            top,
            format!("{bar} {body} {bar}"),
            bottom,
            self.render_suggestion_row(),
        ]
    }

    fn cursor_pos(&self) -> Option<CursorPos> {
        self.last_cursor_pos
    }

    fn wants_key_release(&self) -> bool {
        true
    }

    fn handle_event(&mut self, event: &InputEvent) {
        self.clamp_cursor();

        let raw = match event {
            InputEvent::Text { text, event_type, .. } => {
                if *event_type == KeyEventType::Release {
                    return;
                }
                self.insert_text(text);
                return;
            }
            InputEvent::Paste { text, .. } => {
                self.handle_paste(text);
                return;
            }
            InputEvent::Key {
                raw, event_type, ..
            } => {
                // Releases only re-sync the caret; the buffer never changes.
                if *event_type == KeyEventType::Release {
                    return;
                }
                // The matcher wants the raw chunk, not the normalized id.
                raw.as_str()
            }
            _ => return,
        };

        let action = {
            let kb = self
                .keybindings
                .lock()
                .expect("field keybindings lock poisoned");
            [
                FieldAction::SelectCancel,
                FieldAction::Commit,
                FieldAction::SuggestNext,
                FieldAction::SuggestPrev,
                FieldAction::TagPrev,
                FieldAction::TagNext,
                FieldAction::DeleteCharBackward,
                FieldAction::DeleteCharForward,
                FieldAction::DeleteWordBackward,
                FieldAction::DeleteToLineStart,
                FieldAction::DeleteToLineEnd,
                FieldAction::CursorLeft,
                FieldAction::CursorRight,
                FieldAction::CursorLineStart,
                FieldAction::CursorLineEnd,
                FieldAction::CursorWordLeft,
                FieldAction::CursorWordRight,
            ]
            .into_iter()
            .find(|action| kb.matches(raw, *action))
        };

        let Some(action) = action else {
            return;
        };

        match action {
            FieldAction::SelectCancel => {
                self.highlighted = None;
                self.selected_tag = None;
            }
            FieldAction::Commit => match self.highlighted {
                Some(index) => {
                    if let Some(label) = self.suggestions.get(index).cloned() {
                        self.insert_tag(label);
                    }
                }
                None => self.commit(),
            },
            FieldAction::SuggestNext => self.highlight_next_suggestion(),
            FieldAction::SuggestPrev => self.highlight_prev_suggestion(),
            FieldAction::TagPrev => self.select_prev_tag(),
            FieldAction::TagNext => self.select_next_tag(),
            FieldAction::DeleteCharBackward => self.delete_char_backward(),
            FieldAction::DeleteCharForward => self.delete_char_forward(),
            FieldAction::DeleteWordBackward => self.delete_word_backward(),
            FieldAction::DeleteToLineStart => {
                self.buffer = self.buffer[self.cursor..].to_string();
                self.cursor = 0;
            }
            FieldAction::DeleteToLineEnd => {
                self.buffer.truncate(self.cursor);
            }
            FieldAction::CursorLeft => self.move_left(),
            FieldAction::CursorRight => self.move_right(),
            FieldAction::CursorLineStart => self.cursor = 0,
            FieldAction::CursorLineEnd => self.cursor = self.buffer.len(),
            FieldAction::CursorWordLeft => self.move_word_backward(),
            FieldAction::CursorWordRight => self.move_word_forward(),
        }
    }

    fn invalidate(&mut self) {
        // No cached state to invalidate.
    }

    fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
        Some(self)
    }
}

impl Focusable for TagField {
    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn is_focused(&self) -> bool {
        self.focused
    }
}
