//! Runtime options read from `TAGFIELD_*` environment variables.

use std::env;

/// Snapshot of the environment flags, taken once per runtime construction.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Place the real terminal cursor at the widget caret.
    pub hardware_cursor: bool,
    /// Clear and repaint when a frame has fewer rows than the previous one.
    pub clear_on_shrink: bool,
    /// Mirror every byte written to the terminal into this file.
    pub write_log: Option<String>,
    pub debug: bool,
    pub debug_redraw: bool,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            hardware_cursor: flag_set("TAGFIELD_HARDWARE_CURSOR"),
            clear_on_shrink: flag_set("TAGFIELD_CLEAR_ON_SHRINK"),
            write_log: non_empty("TAGFIELD_WRITE_LOG"),
            debug: flag_set("TAGFIELD_DEBUG"),
            debug_redraw: flag_set("TAGFIELD_DEBUG_REDRAW"),
        }
    }
}

fn flag_set(key: &str) -> bool {
    env::var(key).as_deref() == Ok("1")
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::EnvConfig;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    const KEYS: [&str; 5] = [
        "TAGFIELD_HARDWARE_CURSOR",
        "TAGFIELD_CLEAR_ON_SHRINK",
        "TAGFIELD_WRITE_LOG",
        "TAGFIELD_DEBUG",
        "TAGFIELD_DEBUG_REDRAW",
    ];

    // Serializes and sandboxes env mutation across the test binary.
    fn with_env(pairs: &[(&str, &str)], check: impl FnOnce()) {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        let _guard = LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned");

        let saved: Vec<(&str, Option<String>)> =
            KEYS.iter().map(|key| (*key, env::var(*key).ok())).collect();
        for key in KEYS {
            env::remove_var(key);
        }
        for (key, value) in pairs {
            env::set_var(key, value);
        }

        check();

        for (key, value) in saved {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }

    #[test]
    fn everything_defaults_off() {
        with_env(&[], || {
            let config = EnvConfig::from_env();
            assert!(!config.hardware_cursor);
            assert!(!config.clear_on_shrink);
            assert!(config.write_log.is_none());
            assert!(!config.debug);
            assert!(!config.debug_redraw);
        });
    }

    #[test]
    fn flags_set_to_one_enable() {
        with_env(
            &[
                ("TAGFIELD_HARDWARE_CURSOR", "1"),
                ("TAGFIELD_CLEAR_ON_SHRINK", "1"),
                ("TAGFIELD_WRITE_LOG", "/tmp/tagfield-writes.log"),
                ("TAGFIELD_DEBUG", "1"),
                ("TAGFIELD_DEBUG_REDRAW", "1"),
            ],
            || {
                let config = EnvConfig::from_env();
                assert!(config.hardware_cursor);
                assert!(config.clear_on_shrink);
                assert_eq!(config.write_log.as_deref(), Some("/tmp/tagfield-writes.log"));
                assert!(config.debug);
                assert!(config.debug_redraw);
            },
        );
    }

    #[test]
    fn non_one_values_and_blank_paths_are_ignored() {
        with_env(
            &[
                ("TAGFIELD_HARDWARE_CURSOR", "true"),
                ("TAGFIELD_WRITE_LOG", "  "),
            ],
            || {
                let config = EnvConfig::from_env();
                assert!(!config.hardware_cursor);
                assert!(config.write_log.is_none());
            },
        );
    }
}
