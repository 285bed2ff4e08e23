//! Single-message text input state.

/// Content and cursor of the message being typed.
///
/// The cursor is a character index, so multi-byte input edits cleanly.
#[derive(Debug, Clone, Default)]
pub struct TextInputState {
    content: String,
    cursor: usize,
}

impl TextInputState {
    /// Create a new empty text input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Check if the content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Whether the content is only whitespace.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map_or(self.content.len(), |(i, _)| i)
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Insert a character at the cursor position.
    pub fn insert(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, ch);
        self.cursor += 1;
    }

    /// Insert a string at the cursor position.
    pub fn insert_str(&mut self, s: &str) {
        let at = self.byte_index(self.cursor);
        self.content.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    /// Delete the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    /// Delete the character at the cursor (delete).
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    /// Move cursor left.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move cursor right.
    pub fn move_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    /// Move cursor to start.
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Move cursor to end.
    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Take the content, clearing the state.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_input_state_basic() {
        let mut state = TextInputState::new();
        assert!(state.is_empty());

        state.insert('H');
        state.insert('i');
        assert_eq!(state.content(), "Hi");
        assert_eq!(state.cursor(), 2);

        state.backspace();
        assert_eq!(state.content(), "H");

        assert_eq!(state.take(), "H");
        assert!(state.is_empty());
        assert_eq!(state.cursor(), 0);
    }

    #[test]
    fn test_cursor_movement() {
        let mut state = TextInputState::new();
        state.insert_str("Hello");

        state.move_left();
        state.move_left();
        assert_eq!(state.cursor(), 3);

        state.insert('X');
        assert_eq!(state.content(), "HelXlo");

        state.move_home();
        state.delete();
        assert_eq!(state.content(), "elXlo");

        state.move_end();
        state.move_right();
        assert_eq!(state.cursor(), 5);
    }

    #[test]
    fn test_multibyte_editing() {
        let mut state = TextInputState::new();
        state.insert_str("café");
        state.move_left();
        state.insert('ñ');
        assert_eq!(state.content(), "cafñé");

        state.move_end();
        state.backspace();
        assert_eq!(state.content(), "cafñ");
    }

    #[test]
    fn test_blank_detection() {
        let mut state = TextInputState::new();
        state.insert_str("  \t ");
        assert!(!state.is_empty());
        assert!(state.is_blank());
    }
}
