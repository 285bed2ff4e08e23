//! Theme components for the TUI.
//!
//! - [`Theme`] - Color palette (Catppuccin Mocha or high contrast)
//! - [`BorderSet`] - Border characters with ASCII fallback

mod borders;
mod colors;

pub use borders::BorderSet;
pub use colors::Theme;
