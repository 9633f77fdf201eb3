/// Single-line text field with a char-indexed cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextInput {
    content: String,
    cursor: usize,
}

impl TextInput {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let cursor = content.chars().count();
        TextInput { content, cursor }
    }

    pub fn value(&self) -> &str {
        &self.content
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    pub fn insert_char(&mut self, c: char) {
        if c == '\n' || c == '\r' {
            return;
        }
        let idx = self.byte_index(self.cursor);
        self.content.insert(idx, c);
        self.cursor += 1;
    }

    /// Backspace
    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let idx = self.byte_index(self.cursor - 1);
        self.content.remove(idx);
        self.cursor -= 1;
    }

    /// Delete key
    pub fn delete_forward(&mut self) {
        if self.cursor < self.content.chars().count() {
            let idx = self.byte_index(self.cursor);
            self.content.remove(idx);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.content.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn move_to_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_to_end(&mut self) {
        self.cursor = self.content.chars().count();
    }

    /// Text before and after the cursor, for rendering.
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.content.split_at(self.byte_index(self.cursor))
    }
}
