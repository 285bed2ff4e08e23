//! Border sets for Unicode and ASCII fallback.
//!
//! Supports `NO_COLOR` environment variable by using ASCII borders.

use ratatui::symbols::border;

/// Border characters for panes and the split divider.
#[derive(Debug, Clone, Copy, Default)]
pub struct BorderSet {
    ascii: bool,
}

impl BorderSet {
    /// Create a border set; `ascii` selects the fallback characters.
    pub fn new(ascii: bool) -> Self {
        Self { ascii }
    }

    /// Normal (unfocused) borders - rounded for Unicode, plain for ASCII.
    pub fn normal(&self) -> border::Set {
        if self.ascii {
            border::PLAIN
        } else {
            border::ROUNDED
        }
    }

    /// Focused borders - thick for Unicode, double for ASCII.
    pub fn focused(&self) -> border::Set {
        if self.ascii {
            border::DOUBLE
        } else {
            border::THICK
        }
    }

    /// Divider glyph; heavier while it is being dragged.
    pub fn divider(&self, dragging: bool) -> &'static str {
        match (self.ascii, dragging) {
            (true, false) => "|",
            (true, true) => "#",
            (false, false) => "│",
            (false, true) => "┃",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unicode_borders() {
        let borders = BorderSet::new(false);
        assert_eq!(borders.normal().top_left, "╭");
        assert_eq!(borders.focused().top_left, "┏");
        assert_eq!(borders.divider(true), "┃");
    }

    #[test]
    fn test_ascii_borders() {
        let borders = BorderSet::new(true);
        assert_eq!(borders.normal().top_left, "┌");
        assert_eq!(borders.focused().top_left, "╔");
        assert_eq!(borders.divider(false), "|");
    }
}
