//! Footer hints widget.
//!
//! Format: `notification                 [Enter] send │ [Ctrl+L] clear │ ...`

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::app::{Level, Notification};
use crate::theme::Theme;

/// A single keybinding hint.
#[derive(Debug, Clone)]
pub struct KeyHint {
    /// The key or key combination (e.g., "Enter", "Ctrl+L").
    pub key: &'static str,
    /// The action description (e.g., "send").
    pub action: &'static str,
}

impl KeyHint {
    /// Create a new key hint.
    pub const fn new(key: &'static str, action: &'static str) -> Self {
        Self { key, action }
    }
}

/// Hints shown in the footer.
pub const DEFAULT_HINTS: &[KeyHint] = &[
    KeyHint::new("Enter", "send"),
    KeyHint::new("Ctrl+L", "clear"),
    KeyHint::new("Ctrl+R", "reload"),
    KeyHint::new("Esc", "quit"),
];

/// Footer widget.
pub struct FooterHints<'a> {
    hints: &'a [KeyHint],
    notification: Option<&'a Notification>,
    theme: &'a Theme,
}

impl<'a> FooterHints<'a> {
    /// Create a new footer hints widget.
    pub fn new(hints: &'a [KeyHint], theme: &'a Theme) -> Self {
        Self {
            hints,
            notification: None,
            theme,
        }
    }

    /// Notification to show on the left.
    #[must_use]
    pub fn notification(mut self, notification: Option<&'a Notification>) -> Self {
        self.notification = notification;
        self
    }
}

impl Widget for FooterHints<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut left_spans = Vec::new();
        let mut right_spans = Vec::new();

        if let Some(n) = self.notification {
            let color = match n.level {
                Level::Info => self.theme.info,
                Level::Warning => self.theme.warning,
                Level::Error => self.theme.error,
            };
            left_spans.push(Span::styled(n.message.as_str(), Style::default().fg(color)));
        }

        for (i, hint) in self.hints.iter().enumerate() {
            if i > 0 {
                right_spans.push(Span::styled(" │ ", Style::default().fg(self.theme.muted)));
            }
            right_spans.push(Span::styled("[", Style::default().fg(self.theme.muted)));
            right_spans.push(Span::styled(hint.key, Style::default().fg(self.theme.primary)));
            right_spans.push(Span::styled("] ", Style::default().fg(self.theme.muted)));
            right_spans.push(Span::styled(hint.action, Style::default().fg(self.theme.subtext)));
        }

        let left_width: usize = left_spans.iter().map(Span::width).sum();
        let right_width: usize = right_spans.iter().map(Span::width).sum();
        let total_width = area.width as usize;

        // Hints give way to the notification on narrow terminals.
        if left_width + right_width + 1 > total_width && !left_spans.is_empty() {
            right_spans.clear();
        }
        let right_width: usize = if right_spans.is_empty() { 0 } else { right_width };

        let padding = total_width.saturating_sub(left_width + right_width);
        if padding > 0 {
            left_spans.push(Span::raw(" ".repeat(padding)));
        }
        left_spans.extend(right_spans);

        Paragraph::new(Line::from(left_spans))
            .style(Style::default().bg(self.theme.surface))
            .render(area, buf);
    }
}
