//! pagewright-tui: Terminal front end for pagewright
//!
//! This crate provides the interactive chat view, including:
//! - Conversation pane with the streaming reply
//! - Preview pane showing the rendered document
//! - Draggable divider between the two
//! - Input bar, status line and footer hints

mod app;
mod event;
mod input;
mod layout;
#[cfg(test)]
mod test_utils;
mod theme;
mod view;
mod widgets;

pub use app::{App, Level, Notification, UiConfig};
pub use event::{Action, Event, EventHandler};
pub use pagewright_engine;

use crossterm::{
    cursor::Show as ShowCursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use pagewright_engine::{
    ChatBackend, ChatSession, Config, FileSurface, RelayClient, RenderSurface,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use tracing::info;

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, ShowCursor);
    }
}

/// Run the TUI against the relay and preview file named in `config`.
///
/// Sets up the terminal, runs the event loop, and restores the terminal on
/// exit.
pub async fn run_tui(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let session = ChatSession::new(
        RelayClient::new(&config.relay_url),
        FileSurface::new(&config.preview_path),
    );
    let mut app = App::new(
        session,
        config.relay_url.clone(),
        config.preview_path.display().to_string(),
        UiConfig::from_env(),
    );
    info!(relay = %config.relay_url, preview = %config.preview_path.display(), "starting chat");

    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // 4 Hz tick rate = 250ms
    let mut events = EventHandler::new(250);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;
    app.shutdown();

    // Restore cursor before guard drops
    terminal.show_cursor()?;

    result
}

async fn run_loop<B, S>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<B, S>,
    events: &mut EventHandler,
) -> Result<(), Box<dyn std::error::Error>>
where
    B: ChatBackend + 'static,
    S: RenderSurface + 'static,
{
    loop {
        terminal.draw(|frame| {
            app.resize(frame.area());
            view::render(app, frame.area(), frame.buffer_mut());
        })?;

        if let Some(event) = events.next().await {
            match event {
                Event::Key(key) => app.handle_key(key),
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                Event::Tick => app.tick(),
                // The next draw picks up the new size.
                Event::Resize(_, _) => {}
            }
        }

        app.reap().await;

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
