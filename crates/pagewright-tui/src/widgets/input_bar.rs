//! Full-width input bar widget.
//!
//! Always visible at the bottom of the screen for text entry.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::input::TextInputState;
use crate::theme::{BorderSet, Theme};

/// Full-width input bar for text entry.
pub struct InputBar<'a> {
    input: &'a TextInputState,
    theme: &'a Theme,
    borders: &'a BorderSet,
    loading: bool,
}

impl<'a> InputBar<'a> {
    /// Create a new input bar widget.
    pub fn new(input: &'a TextInputState, theme: &'a Theme, borders: &'a BorderSet) -> Self {
        Self {
            input,
            theme,
            borders,
            loading: false,
        }
    }

    /// Show that a reply is being generated.
    #[must_use]
    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    /// Prompt, text and a block cursor, scrolled so the cursor stays visible.
    fn build_line(&self, width: usize) -> Line<'static> {
        let chars: Vec<char> = self.input.content().chars().collect();
        let cursor = self.input.cursor().min(chars.len());

        // Prompt (2) + cursor (1) must fit.
        let room = width.saturating_sub(3).max(1);
        let start = cursor.saturating_sub(room);
        let before: String = chars[start..cursor].iter().collect();
        let after: String = chars[cursor..].iter().collect();

        let text = Style::default().fg(self.theme.text);
        Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.primary)),
            Span::styled(before, text),
            Span::styled("█", Style::default().fg(self.theme.primary)),
            Span::styled(after, text),
        ])
    }
}

impl Widget for InputBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_set(self.borders.focused())
            .border_style(Style::default().fg(self.theme.border_focused))
            .title(" Message ")
            .title_style(Style::default().fg(self.theme.primary));

        let inner_width = block.inner(area).width as usize;
        let line = if self.loading && self.input.is_empty() {
            Line::styled("● Generating…", Style::default().fg(self.theme.muted))
        } else {
            self.build_line(inner_width)
        };

        Paragraph::new(line).block(block).render(area, buf);
    }
}
