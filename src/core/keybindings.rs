//! Field keybindings: action set, defaults, and override config.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::sync::{Arc, Mutex, OnceLock};

use crate::core::input::matches_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldAction {
    CursorLeft,
    CursorRight,
    CursorWordLeft,
    CursorWordRight,
    CursorLineStart,
    CursorLineEnd,
    DeleteCharBackward,
    DeleteCharForward,
    DeleteWordBackward,
    DeleteToLineStart,
    DeleteToLineEnd,
    Commit,
    SuggestNext,
    SuggestPrev,
    TagPrev,
    TagNext,
    SelectCancel,
}

pub type KeyId = String;

const DEFAULT_BINDINGS: &[(FieldAction, &[&str])] = &[
    (FieldAction::CursorLeft, &["left", "ctrl+b"]),
    (FieldAction::CursorRight, &["right", "ctrl+f"]),
    (FieldAction::CursorWordLeft, &["ctrl+left", "alt+b"]),
    (FieldAction::CursorWordRight, &["ctrl+right", "alt+f"]),
    (FieldAction::CursorLineStart, &["home", "ctrl+a"]),
    (FieldAction::CursorLineEnd, &["end", "ctrl+e"]),
    (FieldAction::DeleteCharBackward, &["backspace"]),
    (FieldAction::DeleteCharForward, &["delete", "ctrl+d"]),
    (FieldAction::DeleteWordBackward, &["ctrl+w", "alt+backspace"]),
    (FieldAction::DeleteToLineStart, &["ctrl+u"]),
    (FieldAction::DeleteToLineEnd, &["ctrl+k"]),
    (FieldAction::Commit, &["enter"]),
    (FieldAction::SuggestNext, &["tab"]),
    (FieldAction::SuggestPrev, &["shift+tab"]),
    (FieldAction::TagPrev, &["alt+left"]),
    (FieldAction::TagNext, &["alt+right"]),
    (FieldAction::SelectCancel, &["escape"]),
];

pub static DEFAULT_FIELD_KEYBINDINGS: LazyLock<HashMap<FieldAction, Vec<KeyId>>> =
    LazyLock::new(|| {
        DEFAULT_BINDINGS
            .iter()
            .map(|(action, keys)| (*action, keys.iter().map(|key| (*key).to_string()).collect()))
            .collect()
    });

/// Per-action overrides layered over [`DEFAULT_FIELD_KEYBINDINGS`].
#[derive(Debug, Clone, Default)]
pub struct FieldKeybindingsConfig {
    overrides: HashMap<FieldAction, Vec<KeyId>>,
}

impl FieldKeybindingsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the bindings for `action`. Overriding an action drops its
    /// default keys entirely.
    pub fn set<I, K>(&mut self, action: FieldAction, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<KeyId>,
    {
        self.overrides
            .insert(action, keys.into_iter().map(Into::into).collect());
    }
}

fn resolve(config: &FieldKeybindingsConfig) -> HashMap<FieldAction, Vec<KeyId>> {
    let mut table = DEFAULT_FIELD_KEYBINDINGS.clone();
    for (action, keys) in &config.overrides {
        table.insert(*action, keys.clone());
    }
    table
}

pub struct FieldKeybindingsManager {
    action_to_keys: HashMap<FieldAction, Vec<KeyId>>,
}

impl FieldKeybindingsManager {
    pub fn new(config: FieldKeybindingsConfig) -> Self {
        Self {
            action_to_keys: resolve(&config),
        }
    }

    /// True when `data` (one raw input chunk) triggers `action`.
    pub fn matches(&self, data: &str, action: FieldAction) -> bool {
        self.action_to_keys
            .get(&action)
            .is_some_and(|keys| keys.iter().any(|key| matches_key(data, key)))
    }

    pub fn get_keys(&self, action: FieldAction) -> Vec<KeyId> {
        self.action_to_keys.get(&action).cloned().unwrap_or_default()
    }

    pub fn set_config(&mut self, config: FieldKeybindingsConfig) {
        self.action_to_keys = resolve(&config);
    }
}

pub type FieldKeybindingsHandle = Arc<Mutex<FieldKeybindingsManager>>;

static GLOBAL_FIELD_KEYBINDINGS: OnceLock<FieldKeybindingsHandle> = OnceLock::new();

/// Process-wide handle with the default bindings; widgets share it unless
/// handed their own.
pub fn default_field_keybindings_handle() -> FieldKeybindingsHandle {
    GLOBAL_FIELD_KEYBINDINGS
        .get_or_init(|| {
            Arc::new(Mutex::new(FieldKeybindingsManager::new(
                FieldKeybindingsConfig::default(),
            )))
        })
        .clone()
}
