//! The component contract between widgets and the runtime.

use crate::core::input_event::InputEvent;

/// Position of the caret within a component's rendered lines, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPos {
    pub row: usize,
    pub col: usize,
}

/// A renderable piece of UI.
///
/// The runtime calls `render` for a fresh set of lines whenever a repaint is
/// due, and routes parsed input to whichever component holds focus. All other
/// methods have no-op defaults so simple components stay small.
pub trait Component {
    /// Produce the component's lines for the given terminal width. Lines may
    /// contain ANSI styling; the renderer diffs them as opaque strings.
    fn render(&mut self, width: usize) -> Vec<String>;

    /// React to one parsed input event.
    fn handle_event(&mut self, _event: &InputEvent) {}

    /// Where the caret sat in the lines of the last `render` call, if the
    /// component shows one.
    fn cursor_pos(&self) -> Option<CursorPos> {
        None
    }

    /// Drop cached render state; the next `render` must rebuild from scratch.
    fn invalidate(&mut self) {}

    /// Informs the component of the terminal height before each render.
    fn set_terminal_rows(&mut self, _rows: usize) {}

    /// Opt in to receiving key-release events. The runtime drops releases
    /// for components that return false.
    fn wants_key_release(&self) -> bool {
        false
    }

    /// Expose focus behavior, if any. Components returning `None` never
    /// receive focus callbacks.
    fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
        None
    }
}

/// Focus flag callbacks for components that change appearance with focus.
pub trait Focusable {
    fn set_focused(&mut self, focused: bool);
    fn is_focused(&self) -> bool;
}
