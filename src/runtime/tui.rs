//! Runtime: event loop, input dispatch, render scheduling.
//!
//! Invariant: only the output gate writes to the terminal, and all writes
//! happen on the loop thread. The reader/resize threads only enqueue into
//! the inbox.

use std::io;
use std::sync::{Arc, Condvar, Mutex};

use crate::config::EnvConfig;
use crate::core::input::{set_kitty_protocol_active, KeyEventType};
use crate::core::input_event::{parse_input_events, InputEvent};
use crate::core::output::{Directive, OutputGate};
use crate::core::terminal::Terminal;
use crate::logging::{debug_enabled, log_debug};
use crate::render::{DiffRenderer, Frame};
use crate::runtime::focus::{ComponentRc, FocusState};

/// Work queued for the loop thread by terminal callbacks and handles.
#[derive(Default)]
struct Pending {
    input_chunks: Vec<String>,
    resized: bool,
    repaint: bool,
    closing: bool,
}

struct EventInbox {
    pending: Mutex<Pending>,
    wakeup: Condvar,
}

impl EventInbox {
    fn new() -> Self {
        Self {
            pending: Mutex::new(Pending::default()),
            wakeup: Condvar::new(),
        }
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, Pending> {
        self.pending.lock().expect("inbox lock poisoned")
    }

    fn reset(&self) {
        *self.locked() = Pending::default();
    }

    fn push_input(&self, data: String) {
        self.locked().input_chunks.push(data);
        self.wakeup.notify_one();
    }

    fn note_resize(&self) {
        self.locked().resized = true;
        self.wakeup.notify_one();
    }

    fn schedule_repaint(&self) {
        self.locked().repaint = true;
        self.wakeup.notify_one();
    }

    fn close(&self) {
        self.locked().closing = true;
        self.wakeup.notify_all();
    }

    /// Block until something is pending. Returns false once closed.
    fn wait(&self) -> bool {
        let mut pending = self.locked();
        loop {
            if pending.closing {
                return false;
            }
            if !pending.input_chunks.is_empty() || pending.resized || pending.repaint {
                return true;
            }
            pending = self.wakeup.wait(pending).expect("inbox lock poisoned");
        }
    }

    fn take_inputs(&self) -> Vec<String> {
        std::mem::take(&mut self.locked().input_chunks)
    }

    fn take_resized(&self) -> bool {
        std::mem::take(&mut self.locked().resized)
    }

    fn take_repaint(&self) -> bool {
        std::mem::take(&mut self.locked().repaint)
    }
}

/// Cloneable handle for requesting renders from callbacks and other threads.
#[derive(Clone)]
pub struct RenderHandle {
    inbox: Arc<EventInbox>,
}

impl RenderHandle {
    pub fn request_render(&self) {
        self.inbox.schedule_repaint();
    }
}

pub struct TuiRuntime<T: Terminal> {
    terminal: T,
    root: ComponentRc,
    focus: FocusState,
    renderer: DiffRenderer,
    output: OutputGate,
    inbox: Arc<EventInbox>,
    stopped: bool,
    kitty_active: bool,
    kitty_pending: bool,
    hardware_cursor: bool,
    clear_on_shrink: bool,
}

impl<T: Terminal> TuiRuntime<T> {
    pub fn new(terminal: T, root: ComponentRc) -> Self {
        let config = EnvConfig::from_env();
        Self {
            terminal,
            root,
            focus: FocusState::new(),
            renderer: DiffRenderer::new(),
            output: OutputGate::new(),
            inbox: Arc::new(EventInbox::new()),
            stopped: true,
            kitty_active: false,
            kitty_pending: false,
            hardware_cursor: config.hardware_cursor,
            clear_on_shrink: config.clear_on_shrink,
        }
    }

    pub fn render_handle(&self) -> RenderHandle {
        RenderHandle {
            inbox: Arc::clone(&self.inbox),
        }
    }

    pub fn terminal_columns(&self) -> u16 {
        self.terminal.columns()
    }

    pub fn terminal_rows(&self) -> u16 {
        self.terminal.rows()
    }

    pub fn kitty_protocol_active(&self) -> bool {
        self.kitty_active
    }

    pub fn set_show_hardware_cursor(&mut self, enabled: bool) {
        self.hardware_cursor = enabled;
    }

    pub fn set_clear_on_shrink(&mut self, enabled: bool) {
        self.clear_on_shrink = enabled;
    }

    pub fn set_focus(&mut self, target: ComponentRc) {
        self.focus.focus(target);
    }

    pub fn clear_focus(&mut self) {
        self.focus.blur();
    }

    pub fn request_render(&mut self) {
        self.inbox.schedule_repaint();
    }

    pub fn request_full_redraw(&mut self) {
        self.renderer.queue_full_repaint();
        self.inbox.schedule_repaint();
    }

    /// Enter raw mode, query keyboard protocol support, and schedule the
    /// first render.
    pub fn start(&mut self) -> io::Result<()> {
        self.output.clear();
        self.kitty_active = false;
        self.kitty_pending = false;
        set_kitty_protocol_active(false);
        self.inbox.reset();
        self.stopped = false;

        let input_inbox = Arc::clone(&self.inbox);
        let resize_inbox = Arc::clone(&self.inbox);
        if let Err(err) = self.terminal.start(
            Box::new(move |data| input_inbox.push_input(data)),
            Box::new(move || resize_inbox.note_resize()),
        ) {
            self.stopped = true;
            return Err(err);
        }

        self.output.push(Directive::PasteGuardOn);
        self.output.push(Directive::KittyProbe);
        self.output.push(Directive::CursorHide);
        self.flush_output();
        self.inbox.schedule_repaint();

        Ok(())
    }

    /// Undo every protocol toggle, drain stray input, and restore the
    /// terminal. Safe to call twice.
    pub fn stop(&mut self) -> io::Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.inbox.close();
        self.place_cursor_at_end();
        self.output.push(Directive::CursorShow);
        self.output.push(Directive::PasteGuardOff);
        if self.kitty_active || self.kitty_pending {
            self.output.push(Directive::KittyOff);
        }
        self.flush_output();
        self.kitty_active = false;
        self.kitty_pending = false;
        set_kitty_protocol_active(false);
        self.terminal.drain_input(1000, 50);
        let result = self.terminal.stop();
        self.stopped = true;
        result
    }

    /// Block until at least one input/resize/render event is available, then
    /// process pending work and render once. Callers run this in a loop.
    pub fn run_blocking_once(&mut self) {
        if self.stopped {
            return;
        }
        if !self.inbox.wait() {
            return;
        }
        self.run_once();
    }

    /// Process pending work without blocking.
    pub fn run_once(&mut self) {
        if self.stopped {
            return;
        }

        if self.inbox.take_resized() {
            self.focus.dispatch(&InputEvent::Resize {
                columns: self.terminal.columns(),
                rows: self.terminal.rows(),
            });
            self.root.borrow_mut().invalidate();
            self.renderer.queue_full_repaint();
            self.inbox.schedule_repaint();
        }

        for chunk in self.inbox.take_inputs() {
            self.handle_input(&chunk);
        }

        self.render_if_needed();
    }

    pub fn handle_input(&mut self, data: &str) {
        if is_kitty_query_response(data) {
            if !self.kitty_active && !self.kitty_pending {
                self.output.push(Directive::KittyOn);
                self.kitty_pending = true;
            }
            return;
        }

        let events = parse_input_events(data, self.kitty_active);
        if events.is_empty() {
            return;
        }

        let mut handled = false;
        for event in events {
            if let InputEvent::Key {
                key_id, event_type, ..
            } = &event
            {
                if *event_type == KeyEventType::Release && !self.focus.wants_key_release() {
                    continue;
                }
                if debug_enabled() {
                    log_debug(&format!("key {key_id} ({event_type:?})"));
                }
            }

            if self.focus.dispatch(&event) {
                handled = true;
            }
        }

        if handled {
            self.inbox.schedule_repaint();
        }
    }

    pub fn render_if_needed(&mut self) {
        if self.inbox.take_repaint() {
            self.render_frame();
        }
        self.flush_output();
    }

    pub fn render_now(&mut self) {
        self.render_frame();
        self.flush_output();
    }

    fn render_frame(&mut self) {
        let width = self.terminal.columns() as usize;
        let rows = self.terminal.rows() as usize;

        let (lines, mut cursor_pos) = {
            let mut root = self.root.borrow_mut();
            root.set_terminal_rows(rows);
            (root.render(width), root.cursor_pos())
        };

        // Clamp cursor metadata to the rendered region and terminal width.
        if let Some(mut pos) = cursor_pos.take() {
            if pos.row < lines.len() {
                pos.col = pos.col.min(width.saturating_sub(1));
                cursor_pos = Some(pos);
            }
        }

        let frame = Frame::from(lines).with_cursor(cursor_pos);
        let cursor_pos = frame.cursor();
        let render_cmds = self.renderer.render(frame, width, self.clear_on_shrink);
        self.output.extend(render_cmds);

        if self.hardware_cursor {
            if let Some(pos) = cursor_pos {
                self.push_row_move(pos.row as i32 - self.renderer.cursor_row() as i32);
                self.output
                    .push(Directive::raw(format!("\r\x1b[{}G", pos.col + 1)));
                self.renderer.set_cursor_row(pos.row);
            }
        }
    }

    fn push_row_move(&mut self, delta: i32) {
        if delta > 0 {
            self.output
                .push(Directive::raw(format!("\x1b[{delta}B")));
        } else if delta < 0 {
            self.output
                .push(Directive::raw(format!("\x1b[{}A", -delta)));
        }
    }

    fn flush_output(&mut self) {
        if self.output.is_empty() {
            return;
        }
        self.output.flush(&mut self.terminal);
        // The enable sequence is on the wire now; releases may start arriving.
        if self.kitty_pending {
            self.kitty_active = true;
            self.kitty_pending = false;
            set_kitty_protocol_active(true);
        }
    }

    fn place_cursor_at_end(&mut self) {
        let total_lines = self.renderer.shown_line_count();
        if total_lines == 0 {
            return;
        }
        self.push_row_move(total_lines as i32 - self.renderer.cursor_row() as i32);
        self.output.push(Directive::Static("\r\n"));
        self.renderer.set_cursor_row(total_lines);
    }
}

impl<T: Terminal> Drop for TuiRuntime<T> {
    fn drop(&mut self) {
        if !self.stopped {
            let _ = self.stop();
        }
    }
}

fn is_kitty_query_response(data: &str) -> bool {
    data.starts_with("\x1b[?") && data.ends_with('u')
}
