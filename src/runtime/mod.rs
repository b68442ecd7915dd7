pub mod focus;
pub mod tui;

pub use focus::{ComponentRc, FocusState};
pub use tui::{RenderHandle, TuiRuntime};
