//! Application state for the pagewright TUI.

use std::sync::Arc;

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use pagewright_engine::{
    extract, ChatBackend, ChatMessage, ChatSession, Confidence, ContainerBounds, PaneLayout,
    PointerCapture, RenderSurface, Role, SessionError, SplitPaneController, TurnOutcome,
};
use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::event::{key_to_action, Action};
use crate::input::TextInputState;
use crate::layout::{self, Regions};
use crate::theme::{BorderSet, Theme};

/// Ticks a notification stays visible (250ms ticks).
const NOTIFICATION_TTL: usize = 12;

/// UI configuration (from environment).
#[derive(Debug, Clone, Copy, Default)]
pub struct UiConfig {
    /// Plain colors and ASCII borders.
    pub ascii: bool,
}

impl UiConfig {
    /// Create config from environment, respecting `NO_COLOR`.
    pub fn from_env() -> Self {
        Self {
            ascii: std::env::var_os("NO_COLOR").is_some(),
        }
    }
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// Temporary message shown in the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    ttl: usize,
}

type TurnHandle = JoinHandle<Result<TurnOutcome, SessionError>>;

/// Main application state.
pub struct App<B, S> {
    session: ChatSession<B, S>,
    split: SplitPaneController,
    /// Message being typed.
    pub input: TextInputState,
    /// Theme colors.
    pub theme: Theme,
    /// Border set based on config.
    pub borders: BorderSet,
    relay_url: String,
    preview_target: String,
    frame: Rect,
    /// Conversation lines scrolled up from the bottom.
    scroll: u16,
    /// Preview source lines scrolled down from the top.
    preview_scroll: u16,
    notification: Option<Notification>,
    turn: Option<TurnHandle>,
    background: Vec<JoinHandle<()>>,
    /// Should the app quit?
    pub should_quit: bool,
}

impl<B, S> App<B, S>
where
    B: ChatBackend + 'static,
    S: RenderSurface + 'static,
{
    /// Create the app around a session.
    ///
    /// `relay_url` and `preview_target` are only displayed.
    pub fn new(
        session: ChatSession<B, S>,
        relay_url: impl Into<String>,
        preview_target: impl Into<String>,
        ui: UiConfig,
    ) -> Self {
        let theme = if ui.ascii {
            Theme::high_contrast()
        } else {
            Theme::mocha()
        };
        Self {
            session,
            split: SplitPaneController::new(ContainerBounds::new(0.0, 0.0), PointerCapture::new()),
            input: TextInputState::new(),
            theme,
            borders: BorderSet::new(ui.ascii),
            relay_url: relay_url.into(),
            preview_target: preview_target.into(),
            frame: Rect::default(),
            scroll: 0,
            preview_scroll: 0,
            notification: None,
            turn: None,
            background: Vec::new(),
            should_quit: false,
        }
    }

    /// The conversation.
    pub fn session(&self) -> &ChatSession<B, S> {
        &self.session
    }

    /// Relay address shown in the status line.
    pub fn relay_url(&self) -> &str {
        &self.relay_url
    }

    /// Where the preview is rendered, shown in the preview pane.
    pub fn preview_target(&self) -> &str {
        &self.preview_target
    }

    /// Current panel geometry.
    pub fn pane_layout(&self) -> PaneLayout {
        self.split.layout()
    }

    /// Divider drag state machine.
    pub fn split(&self) -> &SplitPaneController {
        &self.split
    }

    /// Messages plus whatever has streamed in for the current turn.
    pub fn transcript(&self) -> (Vec<ChatMessage>, Option<String>) {
        (self.session.messages(), self.session.pending_text())
    }

    /// Whether a turn is running or has not been collected yet.
    pub fn is_busy(&self) -> bool {
        self.turn.is_some() || self.session.is_busy()
    }

    /// Notification currently shown, if any.
    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// Conversation scroll offset from the bottom.
    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    /// Preview scroll offset from the top.
    pub fn preview_scroll(&self) -> u16 {
        self.preview_scroll
    }

    /// Confidence behind what the preview shows, judged from the latest
    /// assistant text.
    pub fn preview_confidence(&self) -> Confidence {
        if self.session.renderer().is_placeholder() {
            return Confidence::None;
        }
        let (messages, pending) = self.transcript();
        let latest = pending.or_else(|| {
            messages
                .iter()
                .rev()
                .find(|m| m.role == Role::Assistant)
                .map(|m| m.content.clone())
        });
        latest.map_or(Confidence::None, |text| extract(&text).confidence)
    }

    /// Frame size the app was last drawn at.
    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// Record the frame size and update the divider geometry.
    pub fn resize(&mut self, area: Rect) {
        self.frame = area;
        let body = layout::body_area(area);
        self.split.set_container(ContainerBounds::new(
            f64::from(body.x),
            f64::from(body.width),
        ));
    }

    /// Regions for the current frame and panel widths.
    pub fn regions(&self) -> Regions {
        layout::compute(self.frame, self.split.layout().left_width_percent)
    }

    fn notify(&mut self, level: Level, message: impl Into<String>) {
        self.notification = Some(Notification {
            level,
            message: message.into(),
            ttl: NOTIFICATION_TTL,
        });
    }

    /// Advance timers.
    pub fn tick(&mut self) {
        if let Some(n) = self.notification.as_mut() {
            n.ttl = n.ttl.saturating_sub(1);
            if n.ttl == 0 {
                self.notification = None;
            }
        }
    }

    /// Handle a key press: text editing first, then shortcuts.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        let edited = plain
            && match key.code {
                KeyCode::Char(c) => {
                    self.input.insert(c);
                    true
                }
                KeyCode::Backspace => {
                    self.input.backspace();
                    true
                }
                KeyCode::Delete => {
                    self.input.delete();
                    true
                }
                KeyCode::Left => {
                    self.input.move_left();
                    true
                }
                KeyCode::Right => {
                    self.input.move_right();
                    true
                }
                KeyCode::Home => {
                    self.input.move_home();
                    true
                }
                KeyCode::End => {
                    self.input.move_end();
                    true
                }
                _ => false,
            };
        if !edited {
            self.handle_action(key_to_action(key));
        }
    }

    /// Perform an action.
    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Send => self.submit(),
            Action::Clear => self.clear(),
            Action::Reload => self.reload(),
            Action::ScrollUp => self.scroll = self.scroll.saturating_add(1),
            Action::ScrollDown => self.scroll = self.scroll.saturating_sub(1),
            Action::None => {}
        }
    }

    fn submit(&mut self) {
        if self.input.is_blank() {
            return;
        }
        if self.is_busy() {
            self.notify(
                Level::Warning,
                "Please wait for the current reply to finish.",
            );
            return;
        }
        let text = self.input.take();
        self.scroll = 0;
        let session = self.session.clone();
        self.turn = Some(tokio::spawn(async move { session.send(&text).await }));
    }

    fn clear(&mut self) {
        self.scroll = 0;
        self.preview_scroll = 0;
        let session = self.session.clone();
        self.background.push(tokio::spawn(async move { session.clear().await }));
        self.notify(Level::Info, "Started a new conversation.");
    }

    fn reload(&mut self) {
        let renderer = Arc::clone(self.session.renderer());
        self.background.push(tokio::spawn(async move {
            if let Err(e) = renderer.force_reload().await {
                warn!(error = %e, "preview reload failed");
            }
        }));
    }

    /// Handle a mouse event.
    ///
    /// Presses on the divider start a drag. Drag and release events reach
    /// the split controller only while its pointer capture is active.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let regions = self.regions();
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if on_divider(&regions, column, row) => {
                self.split.press_divider();
                self.session.renderer().set_dragging(true);
            }
            MouseEventKind::Drag(MouseButton::Left) if self.split.capture().is_active() => {
                if self.split.pointer_move(f64::from(column)) {
                    debug!(left = self.split.layout().left_width_percent, "divider moved");
                }
            }
            MouseEventKind::Up(_) if self.split.capture().is_active() => {
                self.split.release();
                self.session.renderer().set_dragging(false);
            }
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
                let up = mouse.kind == MouseEventKind::ScrollUp;
                if layout::contains(regions.preview, column, row) {
                    self.scroll_preview(up);
                } else if layout::contains(regions.conversation, column, row) {
                    self.handle_action(if up { Action::ScrollUp } else { Action::ScrollDown });
                }
            }
            _ => {}
        }
    }

    fn scroll_preview(&mut self, up: bool) {
        match self.session.renderer().interact() {
            Ok(()) if up => self.preview_scroll = self.preview_scroll.saturating_sub(1),
            Ok(()) => self.preview_scroll = self.preview_scroll.saturating_add(1),
            Err(blocked) => self.notify(Level::Warning, blocked.to_string()),
        }
    }

    /// Collect a finished turn and background tasks.
    pub async fn reap(&mut self) {
        self.background.retain(|task| !task.is_finished());

        let Some(handle) = self.turn.take_if(|h| h.is_finished()) else {
            return;
        };
        match handle.await {
            Ok(Ok(TurnOutcome::Completed { extraction, .. })) => {
                self.preview_scroll = 0;
                if extraction.is_none() {
                    debug!("reply contained no document");
                }
            }
            Ok(Ok(TurnOutcome::Failed(e))) => {
                self.notify(Level::Error, format!("Request failed: {e}"));
            }
            Ok(Err(e)) => self.notify(Level::Warning, e.to_string()),
            Err(e) => warn!(error = %e, "turn task failed"),
        }
    }

    /// Stop running work and release any drag before exit.
    pub fn shutdown(&mut self) {
        if let Some(turn) = self.turn.take() {
            turn.abort();
        }
        for task in self.background.drain(..) {
            task.abort();
        }
        self.split.teardown();
        self.session.renderer().set_dragging(false);
    }
}

fn on_divider(regions: &Regions, column: u16, row: u16) -> bool {
    row >= regions.divider.y
        && row < regions.divider.y.saturating_add(regions.divider.height)
        && column.abs_diff(regions.divider.x) <= 1
}
