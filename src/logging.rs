//! Debug logging sinks gated on `TAGFIELD_DEBUG` / `TAGFIELD_DEBUG_REDRAW`.
//!
//! Log lines go to the file named by `TAGFIELD_DEBUG_LOG` (default
//! `/tmp/tagfield-debug.log`), never to the terminal: the output gate stays
//! the only terminal writer.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;

use crate::config::EnvConfig;

struct LogState {
    debug: bool,
    debug_redraw: bool,
    path: PathBuf,
    failed: bool,
}

static LOG_STATE: Lazy<Mutex<LogState>> = Lazy::new(|| {
    let config = EnvConfig::from_env();
    let path = std::env::var_os("TAGFIELD_DEBUG_LOG")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp/tagfield-debug.log"));
    Mutex::new(LogState {
        debug: config.debug,
        debug_redraw: config.debug_redraw,
        path,
        failed: false,
    })
});

pub fn debug_enabled() -> bool {
    LOG_STATE.lock().map(|state| state.debug).unwrap_or(false)
}

pub fn debug_redraw_enabled() -> bool {
    LOG_STATE
        .lock()
        .map(|state| state.debug_redraw)
        .unwrap_or(false)
}

pub fn log_debug(message: &str) {
    write_line("debug", message, |state| state.debug);
}

pub fn log_debug_redraw(message: &str) {
    write_line("redraw", message, |state| state.debug_redraw);
}

fn write_line(tag: &str, message: &str, enabled: impl Fn(&LogState) -> bool) {
    let Ok(mut state) = LOG_STATE.lock() else {
        return;
    };
    if !enabled(&state) || state.failed {
        return;
    }

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|dur| dur.as_millis())
        .unwrap_or(0);
    let line = format!("[{millis}] {tag}: {message}\n");

    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&state.path)
        .and_then(|mut file| file.write_all(line.as_bytes()));
    if result.is_err() {
        // Stop retrying on a broken sink instead of failing every render.
        state.failed = true;
    }
}
