//! Event handling for the pagewright TUI.

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use std::time::Duration;
use tokio::sync::mpsc;

/// Events that can occur in the TUI.
#[derive(Debug, Clone)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// A mouse event occurred.
    Mouse(MouseEvent),
    /// A tick event for UI updates.
    Tick,
    /// Terminal was resized.
    Resize(u16, u16),
}

/// Event handler that runs in a background thread.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    _tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Create a new event handler with the specified tick rate.
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let tx_clone = tx.clone();

        // crossterm reads are blocking
        std::thread::spawn(move || {
            let tick_rate = Duration::from_millis(tick_rate_ms);
            loop {
                let event = if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(CrosstermEvent::Key(key)) => Some(Event::Key(key)),
                        Ok(CrosstermEvent::Mouse(mouse)) => Some(Event::Mouse(mouse)),
                        Ok(CrosstermEvent::Resize(w, h)) => Some(Event::Resize(w, h)),
                        _ => None,
                    }
                } else {
                    Some(Event::Tick)
                };
                if let Some(e) = event {
                    if tx_clone.send(e).is_err() {
                        break;
                    }
                }
            }
        });

        Self { rx, _tx: tx }
    }

    /// Get the next event, waiting until one is available.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Key action that can be performed in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Send,
    Clear,
    Reload,
    ScrollUp,
    ScrollDown,
    None,
}

/// Convert a key event to an action.
///
/// Text editing keys are handled by the input bar before this is consulted.
pub fn key_to_action(key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Action::Quit,
            KeyCode::Char('l') => Action::Clear,
            KeyCode::Char('r') => Action::Reload,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Esc => Action::Quit,
        KeyCode::Enter => Action::Send,
        KeyCode::Up | KeyCode::PageUp => Action::ScrollUp,
        KeyCode::Down | KeyCode::PageDown => Action::ScrollDown,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_control_keys() {
        assert_eq!(key_to_action(ctrl('c')), Action::Quit);
        assert_eq!(key_to_action(ctrl('l')), Action::Clear);
        assert_eq!(key_to_action(ctrl('r')), Action::Reload);
        assert_eq!(key_to_action(ctrl('x')), Action::None);
    }

    #[test]
    fn test_plain_keys() {
        assert_eq!(key_to_action(key(KeyCode::Enter)), Action::Send);
        assert_eq!(key_to_action(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(key_to_action(key(KeyCode::Up)), Action::ScrollUp);
        assert_eq!(key_to_action(key(KeyCode::PageDown)), Action::ScrollDown);
        // Plain letters are text, never shortcuts.
        assert_eq!(key_to_action(key(KeyCode::Char('r'))), Action::None);
    }
}
