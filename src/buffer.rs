use anyhow::{Context, Result};
use ropey::Rope;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A text buffer the user edits; the target for picked URLs.
pub struct Buffer {
    path: Option<PathBuf>,
    rope: Rope,
    cursor_char: usize,
    preferred_col: Option<usize>,
    pub scroll: usize,
    dirty: bool,
}

impl Buffer {
    pub fn scratch() -> Self {
        Self::from_text(None, "")
    }

    /// Opens `path`; a file that does not exist yet starts empty.
    pub fn open(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        Ok(Self::from_text(Some(path.to_path_buf()), &text))
    }

    fn from_text(path: Option<PathBuf>, text: &str) -> Self {
        Self {
            path,
            rope: Rope::from_str(text),
            cursor_char: 0,
            preferred_col: None,
            scroll: 0,
            dirty: false,
        }
    }

    pub fn name(&self) -> String {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "*scratch*".to_string())
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[cfg(test)]
    pub fn cursor_char(&self) -> usize {
        self.cursor_char
    }

    pub fn save(&mut self) -> Result<()> {
        let path = self
            .path
            .as_ref()
            .context("Buffer has no file; start urlpick with a path to save")?;
        fs::write(path, self.text())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        self.dirty = false;
        Ok(())
    }

    pub fn insert_char(&mut self, c: char) {
        self.rope.insert_char(self.cursor_char, c);
        self.cursor_char = self.cursor_char.saturating_add(1);
        self.preferred_col = None;
        self.dirty = true;
    }

    pub fn insert_str(&mut self, text: &str) {
        self.rope.insert(self.cursor_char, text);
        self.cursor_char = self.cursor_char.saturating_add(text.chars().count());
        self.preferred_col = None;
        self.dirty = true;
    }

    pub fn backspace(&mut self) {
        if self.cursor_char == 0 {
            return;
        }
        let prev = self.cursor_char - 1;
        self.rope.remove(prev..self.cursor_char);
        self.cursor_char = prev;
        self.preferred_col = None;
        self.dirty = true;
    }

    pub fn delete(&mut self) {
        if self.cursor_char >= self.rope.len_chars() {
            return;
        }
        let next = self.cursor_char + 1;
        self.rope.remove(self.cursor_char..next);
        self.preferred_col = None;
        self.dirty = true;
    }

    pub fn move_left(&mut self) {
        if self.cursor_char > 0 {
            self.cursor_char -= 1;
        }
        self.preferred_col = None;
    }

    pub fn move_right(&mut self) {
        if self.cursor_char < self.rope.len_chars() {
            self.cursor_char += 1;
        }
        self.preferred_col = None;
    }

    pub fn move_lines(&mut self, delta: isize) {
        let (line, col) = self.cursor_line_col();
        let max_line = self.rope.len_lines().saturating_sub(1);
        let target_line = if delta.is_negative() {
            line.saturating_sub(delta.unsigned_abs())
        } else {
            (line + delta as usize).min(max_line)
        };
        if target_line == line {
            return;
        }
        let desired = self.preferred_col.unwrap_or(col);
        let target_col = desired.min(line_len_chars(&self.rope, target_line));
        self.cursor_char = self.rope.line_to_char(target_line) + target_col;
        self.preferred_col = Some(desired);
    }

    pub fn move_line_start(&mut self) {
        let (line, _) = self.cursor_line_col();
        self.cursor_char = self.rope.line_to_char(line);
        self.preferred_col = None;
    }

    pub fn move_line_end(&mut self) {
        let (line, _) = self.cursor_line_col();
        let len = line_len_chars(&self.rope, line);
        self.cursor_char = self.rope.line_to_char(line) + len;
        self.preferred_col = None;
    }

    pub fn cursor_line_col(&self) -> (usize, usize) {
        let line = self.rope.char_to_line(self.cursor_char);
        let col = self.cursor_char - self.rope.line_to_char(line);
        (line, col)
    }

    pub fn ensure_cursor_visible(&mut self, height: u16) {
        let (line, _) = self.cursor_line_col();
        let height = height.max(1) as usize;
        if line < self.scroll {
            self.scroll = line;
        } else if line >= self.scroll + height {
            self.scroll = line + 1 - height;
        }
    }
}

/// Characters on `line`, excluding its line break.
fn line_len_chars(rope: &Rope, line: usize) -> usize {
    let slice = rope.line(line);
    let mut len = slice.len_chars();
    if len > 0 && slice.char(len - 1) == '\n' {
        len -= 1;
        if len > 0 && slice.char(len - 1) == '\r' {
            len -= 1;
        }
    }
    len
}

#[cfg(test)]
mod tests {
    use super::Buffer;
    use std::fs;

    fn buffer_with(text: &str) -> Buffer {
        let mut buffer = Buffer::scratch();
        buffer.insert_str(text);
        buffer
    }

    #[test]
    fn insert_at_point_advances_cursor() {
        let mut buffer = buffer_with("see ");
        buffer.insert_str("<URL:http://a/>");
        buffer.insert_char('.');
        assert_eq!(buffer.text(), "see <URL:http://a/>.");
        assert_eq!(buffer.cursor_char(), 20);
        assert!(buffer.is_dirty());
    }

    #[test]
    fn insert_lands_mid_line_at_cursor() {
        let mut buffer = buffer_with("ab");
        buffer.move_left();
        buffer.insert_str("XY");
        assert_eq!(buffer.text(), "aXYb");
    }

    #[test]
    fn backspace_and_delete_stay_in_bounds() {
        let mut buffer = buffer_with("ab");
        buffer.delete();
        assert_eq!(buffer.text(), "ab");
        buffer.backspace();
        buffer.backspace();
        buffer.backspace();
        assert_eq!(buffer.text(), "");
    }

    #[test]
    fn vertical_moves_keep_preferred_column() {
        let mut buffer = buffer_with("long line\nx\nanother");
        buffer.move_lines(-2);
        buffer.move_line_start();
        for _ in 0..6 {
            buffer.move_right();
        }
        buffer.move_lines(1);
        assert_eq!(buffer.cursor_line_col(), (1, 1));
        buffer.move_lines(1);
        assert_eq!(buffer.cursor_line_col(), (2, 6));
    }

    #[test]
    fn line_end_skips_crlf() {
        let mut buffer = buffer_with("ab\r\ncd");
        buffer.move_lines(-1);
        buffer.move_line_end();
        assert_eq!(buffer.cursor_line_col(), (0, 2));
    }

    #[test]
    fn missing_file_opens_empty_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let mut buffer = Buffer::open(&path).unwrap();
        assert_eq!(buffer.name(), "notes.txt");
        buffer.insert_str("hello");
        buffer.save().unwrap();
        assert!(!buffer.is_dirty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn scratch_buffer_cannot_save() {
        let mut buffer = buffer_with("x");
        assert!(buffer.save().is_err());
        assert_eq!(buffer.name(), "*scratch*");
    }

    #[test]
    fn scroll_follows_cursor() {
        let mut buffer = buffer_with("1\n2\n3\n4\n5\n6");
        buffer.ensure_cursor_visible(3);
        assert_eq!(buffer.scroll, 3);
        buffer.move_lines(-5);
        buffer.ensure_cursor_visible(3);
        assert_eq!(buffer.scroll, 0);
    }
}
