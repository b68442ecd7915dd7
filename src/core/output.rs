//! Single output gate: every terminal write funnels through [`OutputGate::flush`].

use crate::core::terminal::Terminal;

/// One queued piece of terminal output. Rendering and the runtime both speak
/// in directives; nothing reaches the terminal until the gate flushes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// An escape sequence or text built at runtime.
    Raw(String),
    /// A fixed escape sequence or text known at compile time.
    Static(&'static str),

    CursorHide,
    CursorShow,

    PasteGuardOn,
    PasteGuardOff,

    /// Ask the terminal whether it speaks the kitty keyboard protocol.
    KittyProbe,
    KittyOn,
    KittyOff,
}

impl Directive {
    pub fn raw(data: impl Into<String>) -> Self {
        Self::Raw(data.into())
    }

    fn wire(&self) -> &str {
        match self {
            Directive::Raw(data) => data,
            Directive::Static(data) => data,
            Directive::CursorHide => "\x1b[?25l",
            Directive::CursorShow => "\x1b[?25h",
            Directive::PasteGuardOn => "\x1b[?2004h",
            Directive::PasteGuardOff => "\x1b[?2004l",
            Directive::KittyProbe => "\x1b[?u",
            Directive::KittyOn => "\x1b[>1u",
            Directive::KittyOff => "\x1b[<u",
        }
    }
}

/// Queue of pending directives. Flushing concatenates the whole queue into a
/// single `write` so a frame never reaches the terminal half-painted.
#[derive(Debug, Default)]
pub struct OutputGate {
    queue: Vec<Directive>,
}

impl OutputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, directive: Directive) {
        self.queue.push(directive);
    }

    pub fn extend(&mut self, directives: impl IntoIterator<Item = Directive>) {
        self.queue.extend(directives);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Write the queued directives as one buffer and empty the queue.
    pub fn flush<T: Terminal>(&mut self, terminal: &mut T) {
        if self.queue.is_empty() {
            return;
        }
        let mut wire = String::new();
        for directive in &self.queue {
            wire.push_str(directive.wire());
        }
        self.queue.clear();
        terminal.write(&wire);
    }
}
