//! Static text widget.

use crate::core::component::Component;
use crate::core::text::utils::{apply_background_to_line, wrap_text};
use crate::core::text::width::visible_width;

pub type TextBgFn = Box<dyn Fn(&str) -> String>;

struct CachedRender {
    text: String,
    width: usize,
    lines: Vec<String>,
}

/// Word-wrapped text block with horizontal/vertical padding.
pub struct Text {
    text: String,
    padding_x: usize,
    padding_y: usize,
    background: Option<TextBgFn>,
    cache: Option<CachedRender>,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_padding(text, 1, 1)
    }

    pub fn with_padding(text: impl Into<String>, padding_x: usize, padding_y: usize) -> Self {
        Self {
            text: text.into(),
            padding_x,
            padding_y,
            background: None,
            cache: None,
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cache = None;
    }

    pub fn set_background(&mut self, background: Option<TextBgFn>) {
        self.background = background;
        self.cache = None;
    }

    fn fill_line(&self, line: &str, width: usize) -> String {
        match self.background.as_ref() {
            Some(bg_fn) => apply_background_to_line(line, width, bg_fn),
            None => {
                let pad = width.saturating_sub(visible_width(line));
                format!("{line}{:pad$}", "")
            }
        }
    }

    fn build_lines(&self, width: usize) -> Vec<String> {
        if self.text.trim().is_empty() {
            return Vec::new();
        }

        let normalized = self.text.replace('\t', "   ");
        let content_width = width.saturating_sub(self.padding_x * 2).max(1);
        let margin = " ".repeat(self.padding_x);
        let blank = self.fill_line("", width);

        let mut lines = vec![blank.clone(); self.padding_y];
        for line in wrap_text(&normalized, content_width) {
            lines.push(self.fill_line(&format!("{margin}{line}"), width));
        }
        lines.extend(std::iter::repeat_with(|| blank.clone()).take(self.padding_y));
        lines
    }
}

impl Component for Text {
    fn render(&mut self, width: usize) -> Vec<String> {
        if let Some(cached) = self.cache.as_ref() {
            if cached.text == self.text && cached.width == width {
                return cached.lines.clone();
            }
        }

        let lines = self.build_lines(width);
        self.cache = Some(CachedRender {
            text: self.text.clone(),
            width,
            lines: lines.clone(),
        });
        lines
    }

    fn invalidate(&mut self) {
        self.cache = None;
    }
}
