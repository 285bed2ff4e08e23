//! Conversation pane: the message log plus the reply being streamed.

use chrono::Local;
use pagewright_engine::{ChatMessage, Role};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use super::Pane;
use crate::theme::{BorderSet, Theme};

/// Conversation pane widget.
pub struct ConversationView<'a> {
    messages: &'a [ChatMessage],
    pending: Option<&'a str>,
    scroll_from_bottom: u16,
    show_times: bool,
    theme: &'a Theme,
    borders: &'a BorderSet,
}

impl<'a> ConversationView<'a> {
    /// Create a conversation view.
    pub fn new(messages: &'a [ChatMessage], theme: &'a Theme, borders: &'a BorderSet) -> Self {
        Self {
            messages,
            pending: None,
            scroll_from_bottom: 0,
            show_times: true,
            theme,
            borders,
        }
    }

    /// Text streamed so far for the running turn.
    #[must_use]
    pub fn pending(mut self, pending: Option<&'a str>) -> Self {
        self.pending = pending;
        self
    }

    /// Lines scrolled up from the newest message.
    #[must_use]
    pub fn scroll_from_bottom(mut self, scroll: u16) -> Self {
        self.scroll_from_bottom = scroll;
        self
    }

    /// Whether message headers carry local times.
    #[must_use]
    pub fn show_times(mut self, show: bool) -> Self {
        self.show_times = show;
        self
    }

    fn header(&self, role: Role, suffix: Option<String>) -> Line<'static> {
        let (name, color) = match role {
            Role::User => ("You", self.theme.user),
            Role::Assistant => ("Assistant", self.theme.assistant),
        };
        let mut spans = vec![Span::styled(
            name,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )];
        if let Some(suffix) = suffix {
            spans.push(Span::styled(
                format!(" · {suffix}"),
                Style::default().fg(self.theme.muted),
            ));
        }
        Line::from(spans)
    }

    /// All lines of the transcript, wrapped to `width`.
    fn build_lines(&self, width: usize) -> Vec<Line<'static>> {
        let width = width.max(1);
        let mut lines = Vec::new();
        let body_style = Style::default().fg(self.theme.text);

        for message in self.messages {
            let time = self
                .show_times
                .then(|| message.timestamp.with_timezone(&Local).format("%H:%M").to_string());
            lines.push(self.header(message.role, time));
            for wrapped in textwrap::wrap(&message.content, width) {
                lines.push(Line::styled(wrapped.into_owned(), body_style));
            }
            lines.push(Line::default());
        }

        if let Some(pending) = self.pending {
            lines.push(self.header(Role::Assistant, Some("typing…".into())));
            if pending.is_empty() {
                lines.push(Line::styled("…", Style::default().fg(self.theme.muted)));
            } else {
                for wrapped in textwrap::wrap(pending, width) {
                    lines.push(Line::styled(wrapped.into_owned(), body_style));
                }
            }
        }

        lines
    }
}

#[allow(clippy::cast_possible_truncation)]
impl Widget for ConversationView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = Pane::inner(area);
        let lines = self.build_lines(inner.width as usize);

        // Pin to the newest line unless scrolled up.
        let overflow = lines.len().saturating_sub(inner.height as usize);
        let offset = overflow.saturating_sub(self.scroll_from_bottom as usize);

        Pane::new(self.theme, self.borders)
            .title(" Conversation ")
            .lines(lines)
            .scroll(offset.min(u16::MAX as usize) as u16)
            .render(area, buf);
    }
}
