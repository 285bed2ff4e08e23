//! Status line at the top of the TUI.
//!
//! Format: `● pagewright │ idle │ relay http://… │ 50% │ 50%`

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::theme::Theme;

/// Status line content.
#[derive(Debug, Clone, Default)]
pub struct StatusBarContent {
    /// Whether a reply is streaming.
    pub busy: bool,
    /// Whether the divider is being dragged.
    pub dragging: bool,
    /// Relay address.
    pub relay: String,
    /// Conversation panel width in percent.
    pub left_percent: f64,
}

/// Status line widget.
pub struct StatusBar<'a> {
    content: &'a StatusBarContent,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    /// Create a new status bar widget.
    pub fn new(content: &'a StatusBarContent, theme: &'a Theme) -> Self {
        Self { content, theme }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (state, color) = match (self.content.busy, self.content.dragging) {
            (_, true) => ("resizing", self.theme.info),
            (true, false) => ("generating", self.theme.warning),
            (false, false) => ("idle", self.theme.success),
        };
        let left = self.content.left_percent.round() as u8;
        let sep = || Span::styled(" │ ", Style::default().fg(self.theme.muted));

        let spans = vec![
            Span::styled("● ", Style::default().fg(color)),
            Span::styled("pagewright", Style::default().fg(self.theme.text)),
            sep(),
            Span::styled(state, Style::default().fg(color)),
            sep(),
            Span::styled(
                format!("relay {}", self.content.relay),
                Style::default().fg(self.theme.subtext),
            ),
            sep(),
            Span::styled(
                format!("{left}% │ {}%", 100 - left),
                Style::default().fg(self.theme.subtext),
            ),
        ];

        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(self.theme.surface))
            .render(area, buf);
    }
}
