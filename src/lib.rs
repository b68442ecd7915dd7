//! Inline terminal tag-input widget.
//!
//! Invariant: single output gate — only `core::output::OutputGate::flush(..)` writes to the
//! terminal.
//!
//! # Public API Overview
//! - Build a [`TagField`] (plus supporting widgets) and host it in a runtime via [`TUI`].
//! - Parse/inspect input with key and event helpers.
//! - Use text and width helpers for ANSI-safe formatting.
//!
//! # Runtime Alias
//! [`TUI`] is a type alias for `runtime::tui::TuiRuntime<T>`.

#![allow(clippy::type_complexity)]

pub mod config;
pub mod logging;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;
pub mod widgets;

/// Built-in UI components.
pub use crate::widgets::{Segment, TagField, TagFieldTheme, Text, TextBgFn};

/// Keybinding configuration and default mappings.
pub use crate::core::keybindings::{
    default_field_keybindings_handle, FieldAction, FieldKeybindingsConfig, FieldKeybindingsHandle,
    FieldKeybindingsManager, KeyId, DEFAULT_FIELD_KEYBINDINGS,
};

/// Keyboard input parsing and matching helpers.
pub use crate::core::input::{is_key_release, matches_key, parse_key, parse_text, KeyEventType};
pub use crate::core::input_event::{parse_input_events, InputEvent};

/// Terminal interfaces and process-backed implementation.
pub use crate::core::terminal::{InputHandler, ResizeHandler, Terminal};
pub use crate::platform::process_terminal::ProcessTerminal;

/// Runtime component traits and cursor metadata.
pub use crate::core::component::{Component, CursorPos, Focusable};
/// Render-layer frame types.
pub use crate::render::{DiffRenderer, Frame};
pub use crate::runtime::{ComponentRc, RenderHandle};

/// Alias for the main runtime type.
pub type TUI<T> = crate::runtime::tui::TuiRuntime<T>;

/// ANSI-aware wrapping helper.
pub use crate::core::text::utils::wrap_text;
/// ANSI-aware truncation helper.
pub use crate::core::text::utils::truncate_to_width;
/// Visible width helper that ignores ANSI control sequences.
pub use crate::core::text::width::visible_width;
