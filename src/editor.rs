//! Plain-text editing surface for the focused note.
//!
//! The tree and sync layers treat this as opaque: they only ever call
//! [`EditorState::replace_all`] and listen for edits. Every editing method
//! returns `true` when the buffer content changed, which is the
//! "content changed" signal that feeds the write scheduler.

/// State of the editor pane.
#[derive(Debug, Clone)]
pub struct EditorState {
    /// Lines of text. Always holds at least one (possibly empty) line.
    pub buffer: Vec<String>,
    /// Cursor line (0-indexed).
    pub cursor_line: usize,
    /// Cursor column in characters (0-indexed).
    pub cursor_col: usize,
    /// First visible line.
    pub scroll_offset: usize,
    /// Number of text rows the pane showed on the last draw.
    pub visible_height: usize,
    /// Relative path of the note being edited, if any.
    pub path: Option<String>,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorState {
    /// An empty editor with no note attached.
    pub fn new() -> Self {
        Self {
            buffer: vec![String::new()],
            cursor_line: 0,
            cursor_col: 0,
            scroll_offset: 0,
            visible_height: 24,
            path: None,
        }
    }

    /// Swap in the content of `path`, resetting cursor and scroll.
    ///
    /// Does not count as an edit.
    pub fn replace_all(&mut self, path: &str, content: &str) {
        self.buffer = split_lines(content);
        self.path = Some(path.to_string());
        self.cursor_line = 0;
        self.cursor_col = 0;
        self.scroll_offset = 0;
    }

    /// Detach from the current note and clear the buffer.
    pub fn close(&mut self) {
        *self = Self {
            visible_height: self.visible_height,
            ..Self::new()
        };
    }

    /// Point the editor at a renamed note without touching its content.
    pub fn retarget(&mut self, path: &str) {
        self.path = Some(path.to_string());
    }

    /// The whole buffer as one string.
    pub fn content(&self) -> String {
        self.buffer.join("\n")
    }

    pub fn is_attached(&self) -> bool {
        self.path.is_some()
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.buffer.len()
    }

    /// Length of the current line in characters.
    pub fn current_line_len(&self) -> usize {
        self.buffer
            .get(self.cursor_line)
            .map(|l| l.chars().count())
            .unwrap_or(0)
    }

    /// Clamp cursor position to valid bounds.
    pub fn clamp_cursor(&mut self) {
        if self.cursor_line >= self.buffer.len() {
            self.cursor_line = self.buffer.len().saturating_sub(1);
        }
        let line_len = self.current_line_len();
        if self.cursor_col > line_len {
            self.cursor_col = line_len;
        }
    }

    /// Ensure the viewport scrolls to keep the cursor visible.
    pub fn ensure_cursor_visible(&mut self) {
        if self.visible_height == 0 {
            return;
        }
        if self.cursor_line < self.scroll_offset {
            self.scroll_offset = self.cursor_line;
        }
        let bottom = self.scroll_offset + self.visible_height;
        if self.cursor_line >= bottom {
            self.scroll_offset = self.cursor_line + 1 - self.visible_height;
        }
    }

    // ── Editing ───────────────────────────────────────────────────────

    /// Insert a character at the cursor.
    pub fn insert_char(&mut self, ch: char) -> bool {
        if !self.is_attached() {
            return false;
        }
        let Some(line) = self.buffer.get_mut(self.cursor_line) else {
            return false;
        };
        let byte_idx = char_to_byte_index(line, self.cursor_col);
        line.insert(byte_idx, ch);
        self.cursor_col += 1;
        true
    }

    /// Delete the character before the cursor (Backspace), joining lines
    /// at column zero.
    pub fn delete_char_before(&mut self) -> bool {
        if !self.is_attached() {
            return false;
        }
        if self.cursor_col > 0 {
            let line = &mut self.buffer[self.cursor_line];
            let prev = char_to_byte_index(line, self.cursor_col - 1);
            line.remove(prev);
            self.cursor_col -= 1;
            true
        } else if self.cursor_line > 0 {
            let current = self.buffer.remove(self.cursor_line);
            self.cursor_line -= 1;
            self.cursor_col = self.current_line_len();
            self.buffer[self.cursor_line].push_str(&current);
            self.ensure_cursor_visible();
            true
        } else {
            false
        }
    }

    /// Delete the character at the cursor (Delete), pulling up the next
    /// line at end of line.
    pub fn delete_char_at(&mut self) -> bool {
        if !self.is_attached() {
            return false;
        }
        if self.cursor_col < self.current_line_len() {
            let line = &mut self.buffer[self.cursor_line];
            let at = char_to_byte_index(line, self.cursor_col);
            line.remove(at);
            true
        } else if self.cursor_line + 1 < self.buffer.len() {
            let next = self.buffer.remove(self.cursor_line + 1);
            self.buffer[self.cursor_line].push_str(&next);
            true
        } else {
            false
        }
    }

    /// Split the current line at the cursor (Enter).
    pub fn insert_newline(&mut self) -> bool {
        if !self.is_attached() {
            return false;
        }
        let Some(line) = self.buffer.get_mut(self.cursor_line) else {
            return false;
        };
        let byte_idx = char_to_byte_index(line, self.cursor_col);
        let remainder = line.split_off(byte_idx);
        self.buffer.insert(self.cursor_line + 1, remainder);
        self.cursor_line += 1;
        self.cursor_col = 0;
        self.ensure_cursor_visible();
        true
    }

    // ── Navigation ────────────────────────────────────────────────────

    pub fn move_up(&mut self) {
        if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.clamp_cursor();
            self.ensure_cursor_visible();
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor_line + 1 < self.buffer.len() {
            self.cursor_line += 1;
            self.clamp_cursor();
            self.ensure_cursor_visible();
        }
    }

    /// Move left one character, wrapping to the end of the previous line.
    pub fn move_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.current_line_len();
            self.ensure_cursor_visible();
        }
    }

    /// Move right one character, wrapping to the start of the next line.
    pub fn move_right(&mut self) {
        if self.cursor_col < self.current_line_len() {
            self.cursor_col += 1;
        } else if self.cursor_line + 1 < self.buffer.len() {
            self.cursor_line += 1;
            self.cursor_col = 0;
            self.ensure_cursor_visible();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_col = self.current_line_len();
    }

    pub fn page_up(&mut self) {
        let page = self.visible_height.max(1);
        self.cursor_line = self.cursor_line.saturating_sub(page);
        self.clamp_cursor();
        self.ensure_cursor_visible();
    }

    pub fn page_down(&mut self) {
        let page = self.visible_height.max(1);
        self.cursor_line = (self.cursor_line + page).min(self.buffer.len().saturating_sub(1));
        self.clamp_cursor();
        self.ensure_cursor_visible();
    }
}

/// Split text into editor lines. A trailing newline leaves an empty last
/// line so that `content()` gives the text back unchanged.
fn split_lines(content: &str) -> Vec<String> {
    content.split('\n').map(String::from).collect()
}

/// Byte offset of the `col`-th character of `s`, or `s.len()` past the end.
fn char_to_byte_index(s: &str, col: usize) -> usize {
    s.char_indices().nth(col).map(|(i, _)| i).unwrap_or(s.len())
}
