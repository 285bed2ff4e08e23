//! UI widgets for the TUI.
//!
//! - [`StatusBar`] - Top status line
//! - [`ConversationView`] - Message log
//! - [`PreviewView`] - Rendered document source
//! - [`InputBar`] - Message entry
//! - [`FooterHints`] - Bottom keybinding hints and notifications
//! - [`Pane`] - Generic pane with border and optional title

mod conversation;
mod footer_hints;
mod input_bar;
mod pane;
mod preview;
mod status_bar;

pub use conversation::ConversationView;
pub use footer_hints::{FooterHints, KeyHint, DEFAULT_HINTS};
pub use input_bar::InputBar;
pub use pane::Pane;
pub use preview::PreviewView;
pub use status_bar::{StatusBar, StatusBarContent};
