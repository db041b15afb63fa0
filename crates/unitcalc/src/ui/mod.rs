//! UI Components for the calculator TUI
//!
//! - `session_pane`: history entries, input line and live preview
//! - `chips`: completion chips
//! - `layout`: screen split and status bar
//! - `wrap`: word wrapping shared by drawing and hit-testing

pub mod chips;
pub mod layout;
pub mod session_pane;
pub mod wrap;
