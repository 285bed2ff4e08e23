//! Preview pane: what the renderer currently shows.
//!
//! The document itself lives on the render surface (a file a browser can
//! open); the terminal shows its source and where it is rendered.

use pagewright_engine::Confidence;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};

use super::Pane;
use crate::theme::{BorderSet, Theme};

/// Preview pane widget.
pub struct PreviewView<'a> {
    source: &'a str,
    confidence: Confidence,
    placeholder: bool,
    target: &'a str,
    locked: bool,
    scroll: u16,
    theme: &'a Theme,
    borders: &'a BorderSet,
}

impl<'a> PreviewView<'a> {
    /// Create a preview view for the displayed `source`.
    pub fn new(source: &'a str, theme: &'a Theme, borders: &'a BorderSet) -> Self {
        Self {
            source,
            confidence: Confidence::None,
            placeholder: false,
            target: "",
            locked: false,
            scroll: 0,
            theme,
            borders,
        }
    }

    /// How the document was found.
    #[must_use]
    pub fn confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    /// Whether the placeholder document is shown.
    #[must_use]
    pub fn placeholder(mut self, placeholder: bool) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Where the document is rendered (e.g. a file path).
    #[must_use]
    pub fn target(mut self, target: &'a str) -> Self {
        self.target = target;
        self
    }

    /// Whether direct interaction is currently refused.
    #[must_use]
    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Source lines scrolled from the top.
    #[must_use]
    pub fn scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }

    fn title(&self) -> String {
        let state = if self.placeholder {
            "empty"
        } else {
            self.confidence.label()
        };
        if self.locked {
            format!(" Preview · {state} · locked ")
        } else {
            format!(" Preview · {state} ")
        }
    }

    fn build_lines(&self) -> Vec<Line<'a>> {
        let muted = Style::default().fg(self.theme.muted);
        if self.placeholder {
            let mut lines = vec![
                Line::default(),
                Line::styled("Your website will appear here.", muted),
            ];
            if !self.target.is_empty() {
                lines.push(Line::default());
                lines.push(Line::from(vec![
                    Span::styled("Open ", muted),
                    Span::styled(self.target, Style::default().fg(self.theme.info)),
                ]));
            }
            return lines;
        }

        let mut lines = Vec::new();
        if !self.target.is_empty() {
            lines.push(Line::styled(format!("→ {}", self.target), Style::default().fg(self.theme.info)));
        }
        let number_width = self.source.lines().count().max(1).to_string().len();
        for (i, text) in self.source.lines().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!("{:>number_width$} ", i + 1), muted),
                Span::raw(text),
            ]));
        }
        lines
    }
}

impl Widget for PreviewView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Pane::new(self.theme, self.borders)
            .title(self.title())
            .focused(self.locked)
            .lines(self.build_lines())
            .scroll(self.scroll)
            .render(area, buf);
    }
}
