pub mod process_terminal;

pub use process_terminal::ProcessTerminal;
