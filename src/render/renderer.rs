//! Diff renderer.
//!
//! Renders inline (no alternate screen): the frame occupies the lines below
//! the shell prompt, and repaints rewrite only the changed row range. All
//! repaint bytes are bracketed in synchronized-output markers so terminals
//! apply them atomically.

use crate::core::output::Directive;
use crate::core::text::utils::truncate_to_width;
use crate::core::text::width::visible_width;
use crate::logging::{debug_redraw_enabled, log_debug_redraw};
use crate::render::Frame;

const SYNC_START: &str = "\x1b[?2026h";
const SYNC_END: &str = "\x1b[?2026l";
const CLEAR_ALL: &str = "\x1b[3J\x1b[2J\x1b[H";
const CLEAR_LINE: &str = "\x1b[2K";

#[derive(Debug, Default)]
pub struct DiffRenderer {
    /// What the terminal is currently showing, one string per row.
    shown: Vec<String>,
    shown_width: usize,
    /// Most rows ever painted; the shrink check compares against this.
    high_water: usize,
    cursor_row: usize,
    full_repaint_queued: bool,
}

impl DiffRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logical row (within the rendered region) the hardware cursor sits on.
    pub fn cursor_row(&self) -> usize {
        self.cursor_row
    }

    pub fn set_cursor_row(&mut self, row: usize) {
        self.cursor_row = row;
    }

    pub fn queue_full_repaint(&mut self) {
        self.full_repaint_queued = true;
    }

    pub fn shown_line_count(&self) -> usize {
        self.shown.len()
    }

    pub fn high_water_mark(&self) -> usize {
        self.high_water
    }

    pub fn render(&mut self, frame: Frame, width: usize, clear_on_shrink: bool) -> Vec<Directive> {
        let lines: Vec<String> = frame
            .into_strings()
            .into_iter()
            .map(|line| clamp_line_to_width(line, width))
            .collect();

        let full_repaint = std::mem::take(&mut self.full_repaint_queued);
        let width_changed = self.shown_width != 0 && self.shown_width != width;

        if self.shown.is_empty() && !width_changed {
            if debug_redraw_enabled() {
                log_debug_redraw(&format!("first render ({} lines)", lines.len()));
            }
            return vec![Directive::Raw(self.paint_everything(lines, width, false))];
        }

        if width_changed {
            if debug_redraw_enabled() {
                log_debug_redraw(&format!("width changed ({} -> {})", self.shown_width, width));
            }
            return vec![Directive::Raw(self.paint_everything(lines, width, true))];
        }

        if clear_on_shrink && lines.len() < self.high_water {
            if debug_redraw_enabled() {
                log_debug_redraw(&format!("clear on shrink (high water {})", self.high_water));
            }
            return vec![Directive::Raw(self.paint_everything(lines, width, true))];
        }

        let (first_changed, last_changed) = if full_repaint {
            if lines.is_empty() && self.shown.is_empty() {
                return Vec::new();
            }
            (0, lines.len().max(self.shown.len()) - 1)
        } else {
            match self.changed_range(&lines) {
                Some(range) => range,
                None => return Vec::new(),
            }
        };

        // Start the rewrite on a row that already exists on screen; append-only
        // updates scroll into place via `\r\n` at the bottom.
        let on_screen_bottom = self.shown.len().saturating_sub(1);
        let start_row = first_changed.min(on_screen_bottom);

        let mut wire = String::from(SYNC_START);
        move_rows(&mut wire, self.cursor_row as i32, start_row as i32);
        wire.push('\r');
        for row in start_row..=last_changed {
            if row > start_row {
                wire.push_str("\r\n");
            }
            wire.push_str(CLEAR_LINE);
            if let Some(line) = lines.get(row) {
                wire.push_str(line);
            }
        }
        wire.push_str(SYNC_END);

        self.cursor_row = last_changed;
        self.high_water = self.high_water.max(lines.len());
        self.shown = lines;
        self.shown_width = width;

        vec![Directive::Raw(wire)]
    }

    fn changed_range(&self, lines: &[String]) -> Option<(usize, usize)> {
        let row_count = lines.len().max(self.shown.len());
        let mut changed = (0..row_count).filter(|&row| {
            let old_line = self.shown.get(row).map(String::as_str).unwrap_or("");
            let new_line = lines.get(row).map(String::as_str).unwrap_or("");
            old_line != new_line
        });
        let first = changed.next()?;
        Some((first, changed.last().unwrap_or(first)))
    }

    /// Paint every row, optionally clearing the screen and scrollback first.
    fn paint_everything(&mut self, lines: Vec<String>, width: usize, clear: bool) -> String {
        let mut wire = String::from(SYNC_START);
        if clear {
            wire.push_str(CLEAR_ALL);
        }
        for (row, line) in lines.iter().enumerate() {
            if row > 0 {
                wire.push_str("\r\n");
            }
            wire.push_str(line);
        }
        wire.push_str(SYNC_END);

        self.cursor_row = lines.len().saturating_sub(1);
        self.high_water = if clear {
            lines.len()
        } else {
            self.high_water.max(lines.len())
        };
        self.shown = lines;
        self.shown_width = width;

        wire
    }
}

fn clamp_line_to_width(line: String, width: usize) -> String {
    if visible_width(&line) <= width {
        return line;
    }
    truncate_to_width(&line, width, "", false)
}

fn move_rows(wire: &mut String, from: i32, to: i32) {
    let diff = to - from;
    if diff > 0 {
        wire.push_str(&format!("\x1b[{diff}B"));
    } else if diff < 0 {
        wire.push_str(&format!("\x1b[{}A", -diff));
    }
}
