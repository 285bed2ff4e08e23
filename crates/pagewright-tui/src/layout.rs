//! Screen regions.
//!
//! ```text
//! status line
//! conversation │ preview
//! input bar
//! footer hints
//! ```

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Minimum terminal width.
pub const MIN_WIDTH: u16 = 40;
/// Minimum terminal height.
pub const MIN_HEIGHT: u16 = 10;

/// Height of the input bar, borders included.
const INPUT_HEIGHT: u16 = 3;

/// Where each part of the screen is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regions {
    pub status: Rect,
    pub conversation: Rect,
    pub divider: Rect,
    pub preview: Rect,
    pub input: Rect,
    pub footer: Rect,
}

/// Split the frame into status line, body, input bar and footer.
fn rows(area: Rect) -> [Rect; 4] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),            // Status line
            Constraint::Min(0),               // Body (expands)
            Constraint::Length(INPUT_HEIGHT), // Input bar
            Constraint::Length(1),            // Footer hints
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[3]]
}

/// The area shared by the two panels and the divider.
pub fn body_area(area: Rect) -> Rect {
    rows(area)[1]
}

/// Compute all regions for a frame and a left panel width in percent.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn compute(area: Rect, left_percent: f64) -> Regions {
    let [status, body, input, footer] = rows(area);

    let left = if body.width < 3 {
        0
    } else {
        let raw = (f64::from(body.width) * left_percent / 100.0).round() as u16;
        raw.clamp(1, body.width - 2)
    };
    let divider_width = u16::from(body.width > left);

    let conversation = Rect::new(body.x, body.y, left, body.height);
    let divider = Rect::new(body.x + left, body.y, divider_width, body.height);
    let preview = Rect::new(
        divider.x + divider_width,
        body.y,
        body.width.saturating_sub(left + divider_width),
        body.height,
    );

    Regions {
        status,
        conversation,
        divider,
        preview,
        input,
        footer,
    }
}

/// Whether the frame is large enough to lay out.
pub fn fits(area: Rect) -> bool {
    area.width >= MIN_WIDTH && area.height >= MIN_HEIGHT
}

/// Whether a cell lies inside a rect.
pub fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}
