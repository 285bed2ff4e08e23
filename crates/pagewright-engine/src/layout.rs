//! Split-pane layout state.
//!
//! Two panels share the width of a container; a divider between them can be
//! dragged. While a drag is active the controller holds a [`CaptureGuard`],
//! and the front end routes pointer move/release events to it only while
//! [`PointerCapture::is_active`] is true.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Smallest allowed left panel width, in percent.
pub const MIN_LEFT_PERCENT: f64 = 30.0;
/// Largest allowed left panel width, in percent.
pub const MAX_LEFT_PERCENT: f64 = 70.0;
/// Initial left panel width, in percent.
pub const DEFAULT_LEFT_PERCENT: f64 = 50.0;

/// Registry of pointer listeners that live for the duration of a drag.
#[derive(Debug, Clone, Default)]
pub struct PointerCapture {
    subscribers: Arc<AtomicUsize>,
}

impl PointerCapture {
    /// Create a capture with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe; the subscription ends when the guard drops.
    pub fn acquire(&self) -> CaptureGuard {
        self.subscribers.fetch_add(1, Ordering::SeqCst);
        CaptureGuard {
            subscribers: Arc::clone(&self.subscribers),
        }
    }

    /// Whether move/release events should be delivered.
    pub fn is_active(&self) -> bool {
        self.subscribers() > 0
    }

    /// Number of live subscriptions.
    pub fn subscribers(&self) -> usize {
        self.subscribers.load(Ordering::SeqCst)
    }
}

/// Live pointer subscription. Unsubscribes on drop.
#[derive(Debug)]
pub struct CaptureGuard {
    subscribers: Arc<AtomicUsize>,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.subscribers.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Horizontal extent of the container holding both panels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerBounds {
    /// Left edge.
    pub left: f64,
    /// Total width.
    pub width: f64,
}

impl ContainerBounds {
    /// Create bounds from a left edge and a width.
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    /// Pointer position as a percentage of the width, if the container has
    /// any width at all.
    pub fn percent_at(&self, x: f64) -> Option<f64> {
        (self.width > 0.0).then(|| (x - self.left) * 100.0 / self.width)
    }
}

/// Shared panel geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneLayout {
    /// Width of the left panel in percent, always within the allowed range.
    pub left_width_percent: f64,
    /// Whether the divider is being dragged.
    pub dragging: bool,
}

impl Default for PaneLayout {
    fn default() -> Self {
        Self {
            left_width_percent: DEFAULT_LEFT_PERCENT,
            dragging: false,
        }
    }
}

impl PaneLayout {
    /// Width of the right panel in percent.
    pub fn right_width_percent(&self) -> f64 {
        100.0 - self.left_width_percent
    }
}

/// Drag state machine for the divider.
#[derive(Debug)]
pub struct SplitPaneController {
    layout: PaneLayout,
    container: ContainerBounds,
    capture: PointerCapture,
    drag: Option<CaptureGuard>,
}

impl SplitPaneController {
    /// Create a controller for a container, registering drags on `capture`.
    pub fn new(container: ContainerBounds, capture: PointerCapture) -> Self {
        Self {
            layout: PaneLayout::default(),
            container,
            capture,
            drag: None,
        }
    }

    /// Current layout.
    pub fn layout(&self) -> PaneLayout {
        self.layout
    }

    /// Whether a drag is active.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Capture registry drags subscribe to.
    pub fn capture(&self) -> &PointerCapture {
        &self.capture
    }

    /// Update the container geometry (e.g. after a resize).
    pub fn set_container(&mut self, container: ContainerBounds) {
        self.container = container;
    }

    /// Divider pressed: idle -> dragging.
    pub fn press_divider(&mut self) {
        if self.drag.is_none() {
            self.drag = Some(self.capture.acquire());
            self.layout.dragging = true;
        }
    }

    /// Pointer moved to `x`. Returns whether the width changed.
    ///
    /// Positions that would put the divider outside the allowed range leave
    /// the previous width in place.
    pub fn pointer_move(&mut self, x: f64) -> bool {
        if self.drag.is_none() {
            return false;
        }
        let Some(percent) = self.container.percent_at(x) else {
            return false;
        };
        if !(MIN_LEFT_PERCENT..=MAX_LEFT_PERCENT).contains(&percent) {
            return false;
        }
        self.layout.left_width_percent = percent;
        true
    }

    /// Pointer released anywhere: dragging -> idle.
    pub fn release(&mut self) {
        self.end_drag();
    }

    /// Drop any active drag when the owning view goes away.
    pub fn teardown(&mut self) {
        self.end_drag();
    }

    fn end_drag(&mut self) {
        self.drag = None;
        self.layout.dragging = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> SplitPaneController {
        SplitPaneController::new(ContainerBounds::new(100.0, 1000.0), PointerCapture::new())
    }

    #[test]
    fn test_default_layout() {
        let c = controller();
        assert!((c.layout().left_width_percent - DEFAULT_LEFT_PERCENT).abs() < f64::EPSILON);
        assert!(!c.layout().dragging);
        assert!(!c.capture().is_active());
    }

    #[test]
    fn test_moves_ignored_while_idle() {
        let mut c = controller();
        assert!(!c.pointer_move(500.0));
        assert!((c.layout().left_width_percent - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_drag_updates_width() {
        let mut c = controller();
        c.press_divider();
        assert!(c.layout().dragging);
        assert!(c.capture().is_active());

        assert!(c.pointer_move(500.0));
        assert!((c.layout().left_width_percent - 40.0).abs() < 1e-9);
        assert!((c.layout().right_width_percent() - 60.0).abs() < 1e-9);

        c.release();
        assert!(!c.layout().dragging);
        assert!(!c.capture().is_active());
    }

    #[test]
    fn test_out_of_range_keeps_previous_value() {
        let mut c = controller();
        c.press_divider();
        c.pointer_move(700.0); // 60%
        assert!(!c.pointer_move(150.0)); // 5%
        assert!(!c.pointer_move(1090.0)); // 99%
        assert!(!c.pointer_move(-400.0)); // negative
        assert!((c.layout().left_width_percent - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_width_stays_in_range_for_any_sequence() {
        let mut c = controller();
        c.press_divider();
        let mut x = -2000.0;
        while x < 3000.0 {
            c.pointer_move(x);
            let pct = c.layout().left_width_percent;
            assert!((MIN_LEFT_PERCENT..=MAX_LEFT_PERCENT).contains(&pct), "{pct} at {x}");
            x += 37.5;
        }
        // Boundaries are inclusive.
        assert!(c.pointer_move(400.0));
        assert!((c.layout().left_width_percent - 30.0).abs() < 1e-9);
        assert!(c.pointer_move(800.0));
        assert!((c.layout().left_width_percent - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_width_container_ignored() {
        let mut c = SplitPaneController::new(ContainerBounds::new(0.0, 0.0), PointerCapture::new());
        c.press_divider();
        assert!(!c.pointer_move(10.0));
    }

    #[test]
    fn test_repeated_press_holds_one_subscription() {
        let mut c = controller();
        c.press_divider();
        c.press_divider();
        assert_eq!(c.capture().subscribers(), 1);
        c.release();
        assert_eq!(c.capture().subscribers(), 0);
    }

    #[test]
    fn test_teardown_releases_capture() {
        let capture = PointerCapture::new();
        let mut c = SplitPaneController::new(ContainerBounds::new(0.0, 100.0), capture.clone());
        c.press_divider();
        assert!(capture.is_active());
        c.teardown();
        assert!(!capture.is_active());
    }

    #[test]
    fn test_drop_releases_capture() {
        let capture = PointerCapture::new();
        {
            let mut c = SplitPaneController::new(ContainerBounds::new(0.0, 100.0), capture.clone());
            c.press_divider();
            assert_eq!(capture.subscribers(), 1);
        }
        assert_eq!(capture.subscribers(), 0);
    }

    #[test]
    fn test_resize_changes_mapping() {
        let mut c = controller();
        c.set_container(ContainerBounds::new(0.0, 200.0));
        c.press_divider();
        assert!(c.pointer_move(120.0));
        assert!((c.layout().left_width_percent - 60.0).abs() < 1e-9);
    }
}
