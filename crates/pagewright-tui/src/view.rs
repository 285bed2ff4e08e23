//! Draw the whole screen from app state.

use pagewright_engine::{ChatBackend, RenderSurface};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Paragraph, Widget, Wrap},
};

use crate::app::App;
use crate::layout::{self, MIN_HEIGHT, MIN_WIDTH};
use crate::widgets::{
    ConversationView, FooterHints, InputBar, PreviewView, StatusBar, StatusBarContent,
    DEFAULT_HINTS,
};

/// Render the app into `buf`.
pub fn render<B, S>(app: &App<B, S>, area: Rect, buf: &mut Buffer)
where
    B: ChatBackend + 'static,
    S: RenderSurface + 'static,
{
    if !layout::fits(area) {
        render_too_small(app, area, buf);
        return;
    }

    let regions = app.regions();
    let pane = app.pane_layout();
    let busy = app.is_busy();
    let (messages, pending) = app.transcript();
    let renderer = app.session().renderer();
    let snapshot = renderer.snapshot();

    let status = StatusBarContent {
        busy,
        dragging: pane.dragging,
        relay: app.relay_url().to_string(),
        left_percent: pane.left_width_percent,
    };
    StatusBar::new(&status, &app.theme).render(regions.status, buf);

    ConversationView::new(&messages, &app.theme, &app.borders)
        .pending(pending.as_deref())
        .scroll_from_bottom(app.scroll())
        .render(regions.conversation, buf);

    render_divider(app, regions.divider, pane.dragging, buf);

    PreviewView::new(&snapshot, &app.theme, &app.borders)
        .confidence(app.preview_confidence())
        .placeholder(renderer.is_placeholder())
        .target(app.preview_target())
        .locked(busy || pane.dragging)
        .scroll(app.preview_scroll())
        .render(regions.preview, buf);

    InputBar::new(&app.input, &app.theme, &app.borders)
        .loading(busy)
        .render(regions.input, buf);

    FooterHints::new(DEFAULT_HINTS, &app.theme)
        .notification(app.notification())
        .render(regions.footer, buf);
}

fn render_divider<B, S>(app: &App<B, S>, area: Rect, dragging: bool, buf: &mut Buffer)
where
    B: ChatBackend + 'static,
    S: RenderSurface + 'static,
{
    let color = if dragging {
        app.theme.border_focused
    } else {
        app.theme.border
    };
    let glyph = app.borders.divider(dragging);
    let lines: Vec<Line<'_>> = (0..area.height).map(|_| Line::from(glyph)).collect();
    Paragraph::new(lines)
        .style(Style::default().fg(color))
        .render(area, buf);
}

fn render_too_small<B, S>(app: &App<B, S>, area: Rect, buf: &mut Buffer)
where
    B: ChatBackend + 'static,
    S: RenderSurface + 'static,
{
    let message = format!(
        "Terminal too small ({}x{}). Resize to at least {MIN_WIDTH}x{MIN_HEIGHT}.",
        area.width, area.height
    );
    Paragraph::new(message)
        .style(Style::default().fg(app.theme.warning))
        .wrap(Wrap { trim: true })
        .render(area, buf);
}
