//! Test utilities for pagewright-tui rendering and interaction tests.

use std::time::Duration;

use bytes::Bytes;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use futures_util::stream;
use pagewright_engine::{
    ByteStream, ChatBackend, ChatMessage, ChatReply, ChatSession, ClientError, MemorySurface, Role,
};
use ratatui::{backend::TestBackend, buffer::Buffer, layout::Rect, Terminal};

use crate::app::{App, UiConfig};

/// Default terminal width for tests.
pub const TEST_WIDTH: u16 = 80;

/// Default terminal height for tests.
pub const TEST_HEIGHT: u16 = 24;

/// Canned reply streamed by [`StubBackend::bakery`].
pub const BAKERY_EVENTS: &str = "data: {\"content\":\"Here you go:\\n```html\\n\"}\n\n\
data: {\"content\":\"<h1>Bakery</h1>\\n```\"}\n\n\
data: [DONE]\n\n";

/// What the stub does for every turn.
#[derive(Debug, Clone, Copy)]
enum Behavior {
    Stream(&'static str),
    Fail,
    Stall,
}

/// Backend that never touches the network.
#[derive(Debug, Clone, Copy)]
pub struct StubBackend {
    behavior: Behavior,
}

impl StubBackend {
    /// Streams [`BAKERY_EVENTS`].
    pub fn bakery() -> Self {
        Self {
            behavior: Behavior::Stream(BAKERY_EVENTS),
        }
    }

    /// Every turn fails with a 503.
    pub fn failing() -> Self {
        Self {
            behavior: Behavior::Fail,
        }
    }

    /// Streams never produce anything.
    pub fn stalled() -> Self {
        Self {
            behavior: Behavior::Stall,
        }
    }
}

impl ChatBackend for StubBackend {
    async fn open_stream(&self, _messages: &[ChatMessage]) -> Result<Option<ByteStream>, ClientError> {
        match self.behavior {
            Behavior::Stream(events) => {
                let chunks = vec![Ok(Bytes::from_static(events.as_bytes()))];
                Ok(Some(Box::pin(stream::iter(chunks))))
            }
            Behavior::Fail => Err(ClientError::Status {
                status: 503,
                message: "backend offline".into(),
            }),
            Behavior::Stall => Ok(Some(Box::pin(stream::pending::<Result<Bytes, ClientError>>()))),
        }
    }

    async fn complete(&self, _messages: &[ChatMessage]) -> Result<ChatReply, ClientError> {
        Ok(ChatReply {
            role: Role::Assistant,
            content: "ok".into(),
        })
    }

    async fn clear_memory(&self) -> Result<(), ClientError> {
        Ok(())
    }
}

/// App type used in tests.
pub type TestApp = App<StubBackend, MemorySurface>;

/// Create a test app over the bakery stub, sized to the default terminal.
pub fn create_test_app() -> TestApp {
    create_test_app_with(StubBackend::bakery())
}

/// Create a test app over a given backend, sized to the default terminal.
pub fn create_test_app_with(backend: StubBackend) -> TestApp {
    let session = ChatSession::new(backend, MemorySurface::new());
    let mut app = App::new(
        session,
        "http://localhost:3000",
        "memory",
        UiConfig::default(),
    );
    app.resize(Rect::new(0, 0, TEST_WIDTH, TEST_HEIGHT));
    app
}

/// Type each character of `text`.
pub fn type_text(app: &mut TestApp, text: &str) {
    for c in text.chars() {
        app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
    }
}

/// Press a key without modifiers.
pub fn press(app: &mut TestApp, code: KeyCode) {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
}

/// Send a mouse event at a cell.
pub fn mouse(app: &mut TestApp, kind: MouseEventKind, column: u16, row: u16) {
    app.handle_mouse(MouseEvent {
        kind,
        column,
        row,
        modifiers: KeyModifiers::NONE,
    });
}

/// Drive the app until the running turn has been collected.
pub async fn wait_for_turn(app: &mut TestApp) {
    for _ in 0..400 {
        app.reap().await;
        if !app.is_busy() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("turn did not finish");
}

/// Create a test terminal with custom dimensions.
pub fn create_test_terminal_sized(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).expect("Failed to create test terminal")
}

/// Convert a buffer to a string, one line per row, trailing spaces trimmed.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut lines = Vec::with_capacity(area.height as usize);
    for y in area.top()..area.bottom() {
        let mut line = String::new();
        for x in area.left()..area.right() {
            line.push_str(buffer[(x, y)].symbol());
        }
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

/// Draw the app on a test terminal and return the screen text.
pub fn render_app_to_string(app: &mut TestApp, width: u16, height: u16) -> String {
    let mut terminal = create_test_terminal_sized(width, height);
    terminal
        .draw(|frame| {
            app.resize(frame.area());
            crate::view::render(app, frame.area(), frame.buffer_mut());
        })
        .expect("draw");
    buffer_to_string(terminal.backend().buffer())
}
