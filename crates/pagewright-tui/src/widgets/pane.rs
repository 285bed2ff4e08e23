//! Generic pane widget with border, title and scrollable lines.
//!
//! Supports focused/unfocused states with different border styles.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::theme::{BorderSet, Theme};

/// Generic pane with border and optional title.
pub struct Pane<'a> {
    title: Option<String>,
    focused: bool,
    lines: Vec<Line<'a>>,
    scroll: u16,
    theme: &'a Theme,
    borders: &'a BorderSet,
}

impl<'a> Pane<'a> {
    /// Create a new pane widget.
    pub fn new(theme: &'a Theme, borders: &'a BorderSet) -> Self {
        Self {
            title: None,
            focused: false,
            lines: Vec::new(),
            scroll: 0,
            theme,
            borders,
        }
    }

    /// Set the pane title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set whether the pane is focused.
    #[must_use]
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Set the pane content. Lines are drawn as given, without wrapping.
    #[must_use]
    pub fn lines(mut self, lines: Vec<Line<'a>>) -> Self {
        self.lines = lines;
        self
    }

    /// Skip this many lines from the top.
    #[must_use]
    pub fn scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }

    /// Area inside the border for a pane drawn at `area`.
    pub fn inner(area: Rect) -> Rect {
        Block::default().borders(Borders::ALL).inner(area)
    }
}

impl Widget for Pane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (border_set, border_style, title_style) = if self.focused {
            (
                self.borders.focused(),
                Style::default().fg(self.theme.border_focused),
                Style::default().fg(self.theme.primary),
            )
        } else {
            (
                self.borders.normal(),
                Style::default().fg(self.theme.border),
                Style::default().fg(self.theme.subtext),
            )
        };

        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_set(border_set)
            .border_style(border_style);

        if let Some(title) = self.title {
            block = block.title(title).title_style(title_style);
        }

        Paragraph::new(self.lines)
            .block(block)
            .style(Style::default().fg(self.theme.text).bg(self.theme.base))
            .scroll((self.scroll, 0))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::buffer_to_string;

    #[test]
    fn test_pane_renders_title_and_scrolled_lines() {
        let theme = Theme::default();
        let borders = BorderSet::new(false);
        let area = Rect::new(0, 0, 16, 4);
        let mut buf = Buffer::empty(area);

        Pane::new(&theme, &borders)
            .title(" Notes ")
            .lines(vec![Line::from("one"), Line::from("two"), Line::from("three")])
            .scroll(1)
            .render(area, &mut buf);

        insta::assert_snapshot!(buffer_to_string(&buf), @r"
        ╭ Notes ───────╮
        │two           │
        │three         │
        ╰──────────────╯
        ");
    }
}
