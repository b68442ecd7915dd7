//! Terminal over the process's own tty: raw mode plus reader/resize threads.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::EnvConfig;
use crate::core::terminal::{InputHandler, ResizeHandler, Terminal};

#[cfg(unix)]
use libc::{self, c_int};
#[cfg(unix)]
use signal_hook::iterator::Signals;

#[cfg(unix)]
type SharedInputHandler = Arc<Mutex<Option<InputHandler>>>;
#[cfg(unix)]
type SharedResizeHandler = Arc<Mutex<Option<ResizeHandler>>>;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// True when `data` ends mid escape sequence or mid UTF-8 scalar, in which
/// case the reader should wait briefly for the rest before dispatching.
fn ends_incomplete(data: &[u8]) -> bool {
    if data.is_empty() {
        return false;
    }

    // Trailing multi-byte UTF-8 scalar with missing continuation bytes.
    let tail_start = data.len().saturating_sub(3);
    for (offset, &byte) in data[tail_start..].iter().enumerate() {
        let needed = match byte {
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => continue,
        };
        if data.len() - (tail_start + offset) < needed {
            return true;
        }
    }

    // Trailing unterminated escape sequence.
    let Some(esc_pos) = data.iter().rposition(|&b| b == 0x1b) else {
        return false;
    };
    match &data[esc_pos..] {
        [0x1b] => true,
        // CSI: terminated by a byte in 0x40..=0x7e.
        [0x1b, b'[', params @ ..] => !params.iter().any(|&b| (0x40..=0x7e).contains(&b)),
        // OSC: terminated by BEL or ST.
        [0x1b, b']', rest @ ..] => {
            !rest.contains(&0x07) && !rest.windows(2).any(|pair| pair == [0x1b, b'\\'])
        }
        [0x1b, b'O'] => true,
        _ => false,
    }
}

/// One poll(2) round. Returns whether `interest` is ready within `timeout_ms`
/// (-1 blocks). EINTR retries; other poll failures read as not-ready.
#[cfg(unix)]
fn fd_ready(fd: c_int, interest: libc::c_short, timeout_ms: i32) -> std::io::Result<bool> {
    let mut pollfd = libc::pollfd {
        fd,
        events: interest,
        revents: 0,
    };
    loop {
        let rc = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };
        if rc < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if rc == 0 {
            return Ok(false);
        }
        if (pollfd.revents & interest) != 0 {
            return Ok(true);
        }
        return Err(std::io::Error::other(format!(
            "poll returned revents=0x{:x}",
            pollfd.revents
        )));
    }
}

/// Write every byte of `bytes`, retrying EINTR and polling out WouldBlock.
/// The syscall and the wait are injected so the retry logic is testable.
#[cfg(unix)]
fn write_fully<FWrite, FWait>(
    fd: c_int,
    bytes: &[u8],
    mut write_once: FWrite,
    mut await_writable: FWait,
) -> std::io::Result<()>
where
    FWrite: FnMut(c_int, &[u8]) -> std::io::Result<usize>,
    FWait: FnMut(c_int) -> std::io::Result<()>,
{
    let mut done = 0;
    while done < bytes.len() {
        match write_once(fd, &bytes[done..]) {
            Ok(0) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "write returned 0",
                ));
            }
            Ok(count) if count > bytes.len() - done => {
                return Err(std::io::Error::other(
                    "write returned more bytes than requested",
                ));
            }
            Ok(count) => done += count,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                await_writable(fd)?;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

#[cfg(unix)]
fn write_terminal(fd: c_int, data: &str) {
    if data.is_empty() {
        return;
    }
    let outcome = write_fully(
        fd,
        data.as_bytes(),
        |fd, buf| {
            let rc = unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
            if rc < 0 {
                Err(std::io::Error::last_os_error())
            } else {
                Ok(rc as usize)
            }
        },
        |fd| fd_ready(fd, libc::POLLOUT, -1).map(|_| ()),
    );
    if let Err(err) = outcome {
        panic!("failed to write to terminal: {err}");
    }
}

#[cfg(unix)]
fn query_winsize(fd: c_int) -> Option<(u16, u16)> {
    let mut size: libc::winsize = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    (rc == 0 && size.ws_col > 0 && size.ws_row > 0).then_some((size.ws_col, size.ws_row))
}

#[cfg(unix)]
fn termios_snapshot(fd: c_int) -> std::io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    if unsafe { libc::tcgetattr(fd, &mut termios) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(termios)
}

#[cfg(unix)]
fn apply_termios(fd: c_int, termios: &libc::termios) -> std::io::Result<()> {
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(unix)]
pub struct ProcessTerminal {
    stdin_fd: c_int,
    stdout_fd: c_int,
    saved_termios: Option<libc::termios>,
    input_handler: SharedInputHandler,
    resize_handler: SharedResizeHandler,
    reader_thread: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    discard_input: Arc<AtomicBool>,
    last_read_ms: Arc<AtomicU64>,
    write_log: Option<PathBuf>,
    write_log_failed: bool,
    resize_signal_handle: Option<signal_hook::iterator::Handle>,
    resize_thread: Option<JoinHandle<()>>,
}

#[cfg(unix)]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self {
            stdin_fd: libc::STDIN_FILENO,
            stdout_fd: libc::STDOUT_FILENO,
            saved_termios: None,
            input_handler: Arc::new(Mutex::new(None)),
            resize_handler: Arc::new(Mutex::new(None)),
            reader_thread: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            discard_input: Arc::new(AtomicBool::new(false)),
            last_read_ms: Arc::new(AtomicU64::new(now_ms())),
            write_log: EnvConfig::from_env().write_log.map(PathBuf::from),
            write_log_failed: false,
            resize_signal_handle: None,
            resize_thread: None,
        }
    }

    #[cfg(test)]
    fn with_fds(stdin_fd: c_int, stdout_fd: c_int) -> Self {
        let mut terminal = Self::new();
        terminal.stdin_fd = stdin_fd;
        terminal.stdout_fd = stdout_fd;
        terminal
    }

    fn enter_raw_mode(&mut self) -> std::io::Result<()> {
        if self.saved_termios.is_none() {
            self.saved_termios = Some(termios_snapshot(self.stdin_fd)?);
        }
        let mut raw = self.saved_termios.expect("saved termios missing");
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        apply_termios(self.stdin_fd, &raw)
    }

    fn leave_raw_mode(&mut self) -> std::io::Result<()> {
        match self.saved_termios.as_ref() {
            Some(saved) => apply_termios(self.stdin_fd, saved),
            None => Ok(()),
        }
    }

    fn spawn_reader_thread(&mut self) {
        let stdin_fd = self.stdin_fd;
        let input_handler = Arc::clone(&self.input_handler);
        let shutdown = Arc::clone(&self.shutdown);
        let discard_input = Arc::clone(&self.discard_input);
        let last_read_ms = Arc::clone(&self.last_read_ms);

        self.reader_thread = Some(thread::spawn(move || {
            let mut buffer = [0u8; 4096];
            let mut pending: Vec<u8> = Vec::new();

            while !shutdown.load(Ordering::SeqCst) {
                // Hold partial escapes/scalars for a short followup poll so a
                // split sequence arrives at the parser as one chunk. A lone
                // ESC keypress still flushes when the followup poll times out.
                let timeout_ms = if pending.is_empty() { 50 } else { 10 };
                let got_data = fd_ready(stdin_fd, libc::POLLIN, timeout_ms).unwrap_or(false);

                if got_data {
                    let read_len = unsafe {
                        libc::read(stdin_fd, buffer.as_mut_ptr() as *mut _, buffer.len())
                    };
                    if read_len > 0 {
                        last_read_ms.store(now_ms(), Ordering::SeqCst);
                        pending.extend_from_slice(&buffer[..read_len as usize]);
                    }
                }

                if pending.is_empty() || (got_data && ends_incomplete(&pending)) {
                    continue;
                }

                let chunk = String::from_utf8_lossy(&pending).into_owned();
                pending.clear();

                if discard_input.load(Ordering::SeqCst) {
                    continue;
                }
                let mut handler = input_handler.lock().expect("input handler lock poisoned");
                if let Some(deliver) = handler.as_mut() {
                    deliver(chunk);
                }
            }
        }));
    }

    fn join_reader_thread(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.reader_thread.take() {
            let _ = handle.join();
        }
    }

    fn spawn_resize_thread(&mut self) {
        let mut signals = Signals::new([libc::SIGWINCH]).expect("failed to register SIGWINCH");
        self.resize_signal_handle = Some(signals.handle());

        let resize_handler = Arc::clone(&self.resize_handler);
        self.resize_thread = Some(thread::spawn(move || {
            for _ in signals.forever() {
                let mut handler = resize_handler.lock().expect("resize handler lock poisoned");
                if let Some(notify) = handler.as_mut() {
                    notify();
                }
            }
        }));
    }

    fn join_resize_thread(&mut self) {
        if let Some(handle) = self.resize_signal_handle.take() {
            handle.close();
        }
        if let Some(thread) = self.resize_thread.take() {
            let _ = thread.join();
        }
    }

    fn drop_handlers(&mut self) {
        *self.input_handler.lock().expect("input handler lock poisoned") = None;
        *self
            .resize_handler
            .lock()
            .expect("resize handler lock poisoned") = None;
    }
}

#[cfg(unix)]
impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl Terminal for ProcessTerminal {
    fn start(&mut self, on_input: InputHandler, on_resize: ResizeHandler) -> std::io::Result<()> {
        *self.input_handler.lock().expect("input handler lock poisoned") = Some(on_input);
        *self
            .resize_handler
            .lock()
            .expect("resize handler lock poisoned") = Some(on_resize);

        self.shutdown.store(false, Ordering::SeqCst);
        self.discard_input.store(false, Ordering::SeqCst);
        self.last_read_ms.store(now_ms(), Ordering::SeqCst);

        if let Err(err) = self.enter_raw_mode() {
            self.drop_handlers();
            return Err(err);
        }

        self.spawn_resize_thread();
        // Deliver the initial size through the same path as real resizes.
        unsafe {
            libc::raise(libc::SIGWINCH);
        }

        self.spawn_reader_thread();

        Ok(())
    }

    fn stop(&mut self) -> std::io::Result<()> {
        self.join_reader_thread();
        self.join_resize_thread();
        self.drop_handlers();

        // Flush input before leaving raw mode so buffered bytes never leak to the shell.
        let _ = unsafe { libc::tcflush(self.stdin_fd, libc::TCIFLUSH) };

        self.leave_raw_mode()
    }

    fn drain_input(&mut self, max_ms: u64, idle_ms: u64) {
        self.discard_input.store(true, Ordering::SeqCst);
        self.last_read_ms.store(now_ms(), Ordering::SeqCst);

        let deadline = now_ms().saturating_add(max_ms);
        loop {
            let now = now_ms();
            let idle = now.saturating_sub(self.last_read_ms.load(Ordering::SeqCst));
            if now >= deadline || idle >= idle_ms {
                break;
            }
            let nap = idle_ms.min(deadline - now).max(1);
            thread::sleep(Duration::from_millis(nap));
        }

        self.discard_input.store(false, Ordering::SeqCst);
    }

    fn write(&mut self, data: &str) {
        write_terminal(self.stdout_fd, data);

        if self.write_log_failed {
            return;
        }
        if let Some(path) = self.write_log.as_ref() {
            let logged = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(data.as_bytes()));
            if logged.is_err() {
                self.write_log_failed = true;
            }
        }
    }

    fn columns(&self) -> u16 {
        query_winsize(self.stdout_fd)
            .map(|(cols, _)| cols)
            .unwrap_or(80)
    }

    fn rows(&self) -> u16 {
        query_winsize(self.stdout_fd)
            .map(|(_, rows)| rows)
            .unwrap_or(24)
    }
}

#[cfg(not(unix))]
pub struct ProcessTerminal;

#[cfg(not(unix))]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(unix))]
impl Terminal for ProcessTerminal {
    fn start(&mut self, _on_input: InputHandler, _on_resize: ResizeHandler) -> std::io::Result<()> {
        panic!("ProcessTerminal is only supported on Unix platforms");
    }

    fn stop(&mut self) -> std::io::Result<()> {
        panic!("ProcessTerminal is only supported on Unix platforms");
    }

    fn drain_input(&mut self, _max_ms: u64, _idle_ms: u64) {
        panic!("ProcessTerminal is only supported on Unix platforms");
    }

    fn write(&mut self, _data: &str) {
        panic!("ProcessTerminal is only supported on Unix platforms");
    }

    fn columns(&self) -> u16 {
        80
    }

    fn rows(&self) -> u16 {
        24
    }
}


#[cfg(all(test, unix))]
mod tty_tests {
    use std::io;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    use super::{termios_snapshot, write_fully, ProcessTerminal};
    use crate::core::terminal::Terminal;

    use libc::{self, c_int};

    struct Pty {
        master: c_int,
        slave: c_int,
    }

    impl Drop for Pty {
        fn drop(&mut self) {
            unsafe {
                libc::close(self.master);
                libc::close(self.slave);
            }
        }
    }

    fn open_pty() -> Pty {
        let mut master: c_int = 0;
        let mut slave: c_int = 0;
        let rc = unsafe {
            libc::openpty(
                &mut master,
                &mut slave,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };
        assert_eq!(rc, 0, "openpty failed");
        Pty { master, slave }
    }

    fn feed(pty: &Pty, bytes: &[u8]) {
        let written = unsafe {
            libc::write(
                pty.master,
                bytes.as_ptr() as *const libc::c_void,
                bytes.len(),
            )
        };
        assert_eq!(written, bytes.len() as isize, "short write to pty master");
    }

    fn started_terminal(pty: &Pty) -> (ProcessTerminal, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel();
        let mut terminal = ProcessTerminal::with_fds(pty.slave, pty.slave);
        terminal
            .start(
                Box::new(move |data| {
                    let _ = tx.send(data);
                }),
                Box::new(|| {}),
            )
            .expect("terminal start");
        (terminal, rx)
    }

    #[test]
    fn start_enables_raw_mode_and_stop_restores_it() {
        let pty = open_pty();
        let original = termios_snapshot(pty.slave).expect("get termios");

        let (mut terminal, _rx) = started_terminal(&pty);
        let raw = termios_snapshot(pty.slave).expect("get termios");
        assert_eq!(raw.c_lflag & libc::ICANON, 0, "raw mode not enabled");

        terminal.stop().expect("terminal stop");
        let restored = termios_snapshot(pty.slave).expect("get termios");
        assert_eq!(
            restored.c_lflag & libc::ICANON,
            original.c_lflag & libc::ICANON,
            "raw mode not restored"
        );
    }

    #[test]
    fn split_escape_sequence_is_delivered_as_one_chunk() {
        let pty = open_pty();
        let (mut terminal, rx) = started_terminal(&pty);

        feed(&pty, b"\x1b[");
        std::thread::sleep(Duration::from_millis(3));
        feed(&pty, b"A");

        let received = rx
            .recv_timeout(Duration::from_millis(500))
            .expect("missing input chunk");
        assert_eq!(received, "\x1b[A");

        terminal.stop().expect("terminal stop");
    }

    #[test]
    fn lone_escape_flushes_after_followup_poll() {
        let pty = open_pty();
        let (mut terminal, rx) = started_terminal(&pty);

        feed(&pty, b"\x1b");

        let received = rx
            .recv_timeout(Duration::from_millis(500))
            .expect("missing escape chunk");
        assert_eq!(received, "\x1b");

        terminal.stop().expect("terminal stop");
    }

    #[test]
    fn drain_input_returns_within_limits() {
        let pty = open_pty();
        let (mut terminal, _rx) = started_terminal(&pty);

        let start = Instant::now();
        terminal.drain_input(200, 50);
        let elapsed = start.elapsed();
        assert!(
            elapsed <= Duration::from_millis(300),
            "drain_input exceeded max window: {elapsed:?}"
        );

        terminal.stop().expect("terminal stop");
    }

    #[test]
    fn start_returns_err_on_tcgetattr_failure() {
        let mut terminal = ProcessTerminal::with_fds(-1, -1);
        let err = terminal
            .start(Box::new(|_| {}), Box::new(|| {}))
            .expect_err("expected start to fail");
        assert_eq!(
            err.raw_os_error(),
            Some(libc::EBADF),
            "expected EBADF, got: {err:?}"
        );
    }

    #[test]
    fn write_fully_retries_on_eintr_and_writes_all_bytes() {
        let data = b"hello";
        let mut out = Vec::new();
        let mut calls = 0;
        write_fully(
            1,
            data,
            |_, buf| {
                calls += 1;
                match calls {
                    1 => Err(io::Error::from(io::ErrorKind::Interrupted)),
                    2 => {
                        out.extend_from_slice(&buf[..2]);
                        Ok(2)
                    }
                    _ => {
                        out.extend_from_slice(buf);
                        Ok(buf.len())
                    }
                }
            },
            |_| unreachable!("await_writable should not run for EINTR"),
        )
        .expect("write_fully failed");

        assert_eq!(out, data);
    }

    #[test]
    fn write_fully_waits_for_writable_on_would_block() {
        let data = b"xyz";
        let mut out = Vec::new();
        let mut calls = 0;
        let events = std::cell::RefCell::new(Vec::new());
        write_fully(
            1,
            data,
            |_, buf| {
                events.borrow_mut().push("write");
                calls += 1;
                if calls == 1 {
                    return Err(io::Error::from(io::ErrorKind::WouldBlock));
                }
                out.extend_from_slice(buf);
                Ok(buf.len())
            },
            |_| {
                events.borrow_mut().push("wait");
                Ok(())
            },
        )
        .expect("write_fully failed");

        assert_eq!(out, data);
        assert_eq!(events.into_inner(), vec!["write", "wait", "write"]);
    }
}
