//! Terminal abstraction the runtime drives.

use std::io;

/// Callback invoked with each chunk of terminal input.
pub type InputHandler = Box<dyn FnMut(String) + Send>;

/// Callback invoked when the terminal reports a size change.
pub type ResizeHandler = Box<dyn FnMut() + Send>;

/// What the runtime needs from a terminal: a start/stop lifecycle, input and
/// resize callbacks, a write sink, and the current dimensions.
///
/// `ProcessTerminal` implements this over the process's tty; tests implement
/// it over string buffers or a pty.
pub trait Terminal {
    /// Enter raw mode (or equivalent) and begin delivering input chunks and
    /// resize notifications through the handlers.
    fn start(&mut self, on_input: InputHandler, on_resize: ResizeHandler) -> io::Result<()>;

    /// Restore the terminal and stop the delivery threads.
    fn stop(&mut self) -> io::Result<()>;

    /// Discard pending input, e.g. key releases still in flight at shutdown.
    /// Reads until `idle_ms` passes with no data, bounded by `max_ms` total.
    fn drain_input(&mut self, max_ms: u64, idle_ms: u64);

    /// Write raw bytes to the terminal. Only the output gate calls this.
    fn write(&mut self, data: &str);

    fn columns(&self) -> u16;
    fn rows(&self) -> u16;
}
