//! The read-only listing view: rendered lines plus a cursor, and the mapping
//! from cursor back to a record.

use crate::store::{Record, RecordStore};
use ropey::Rope;
use unicode_width::UnicodeWidthStr;

pub const SEPARATOR: &str = " - ";

/// One line per record: name padded to the widest name, separator, url.
pub fn render(records: &[Record]) -> Vec<String> {
    let names: Vec<String> = records.iter().map(|r| single_line(&r.name)).collect();
    let width = names.iter().map(|n| n.width()).max().unwrap_or(0);
    names
        .iter()
        .zip(records)
        .map(|(name, r)| {
            let pad = width - name.width();
            format!("{name}{}{SEPARATOR}{}\n", " ".repeat(pad), single_line(&r.url))
        })
        .collect()
}

/// Line breaks inside a field would shift every following record off its
/// line, so they are shown as spaces.
fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}' => ' ',
            c => c,
        })
        .collect()
}

/// Zero-based line holding `cursor`, clamped to the end of the text.
pub fn line_at(text: &Rope, cursor: usize) -> usize {
    text.char_to_line(cursor.min(text.len_chars()))
}

/// Record shown on the line holding `cursor`, if any.
pub fn resolve<'a>(text: &Rope, cursor: usize, store: &'a RecordStore) -> Option<&'a Record> {
    store.get(line_at(text, cursor))
}

pub struct Listing {
    text: Rope,
    cursor: usize,
}

impl Listing {
    /// Replaces all content with the rendered store and puts the cursor on
    /// the first line.
    pub fn new(store: &RecordStore) -> Self {
        let mut text = Rope::new();
        for line in render(store.records()) {
            let end = text.len_chars();
            text.insert(end, &line);
        }
        Self { text, cursor: 0 }
    }

    pub fn text(&self) -> &Rope {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_line(&self) -> usize {
        line_at(&self.text, self.cursor)
    }

    /// Number of addressable lines, counting the empty line after the last
    /// record.
    pub fn line_count(&self) -> usize {
        self.text.len_lines()
    }

    pub fn move_lines(&mut self, delta: isize) {
        let line = self.cursor_line();
        let max_line = self.line_count().saturating_sub(1);
        let target = if delta.is_negative() {
            line.saturating_sub(delta.unsigned_abs())
        } else {
            (line + delta as usize).min(max_line)
        };
        self.cursor = self.text.line_to_char(target);
    }

    pub fn move_to_top(&mut self) {
        self.cursor = 0;
    }

    pub fn move_to_last_record(&mut self) {
        let last = self.line_count().saturating_sub(2);
        self.cursor = self.text.line_to_char(last);
    }

    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.text
            .lines()
            .map(|line| line.to_string().trim_end_matches('\n').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{render, resolve, Listing};
    use crate::store::{Record, RecordStore};
    use ropey::Rope;

    fn store() -> RecordStore {
        RecordStore::new(vec![
            Record::new("The GNU Project", "http://www.gnu.org/"),
            Record::new("The FSF", "http://www.fsf.org/"),
        ])
    }

    #[test]
    fn render_pads_names_to_the_widest() {
        assert_eq!(
            render(store().records()),
            vec![
                "The GNU Project - http://www.gnu.org/\n",
                "The FSF         - http://www.fsf.org/\n",
            ]
        );
    }

    #[test]
    fn render_empty_store_has_no_lines() {
        assert!(render(&[]).is_empty());
    }

    #[test]
    fn render_pads_by_display_width() {
        let lines = render(&[Record::new("日本", "u1"), Record::new("abcd", "u2")]);
        assert_eq!(lines[0], "日本 - u1\n");
        assert_eq!(lines[1], "abcd - u2\n");
    }

    #[test]
    fn embedded_line_breaks_keep_one_line_per_record() {
        let store = RecordStore::new(vec![
            Record::new("two\nlines", "http://a/\u{2028}b"),
            Record::new("next", "http://n/"),
        ]);
        let listing = Listing::new(&store);
        assert_eq!(listing.line_count(), 3);
        let second = listing.text().line_to_char(1);
        assert_eq!(resolve(listing.text(), second, &store), store.get(1));
        assert_eq!(
            listing.lines().next().unwrap(),
            "two lines - http://a/ b"
        );
    }

    #[test]
    fn line_i_resolves_to_record_i() {
        let store = store();
        let listing = Listing::new(&store);
        for (i, record) in store.records().iter().enumerate() {
            let start = listing.text().line_to_char(i);
            let mid = start + 5;
            assert_eq!(resolve(listing.text(), start, &store), Some(record));
            assert_eq!(resolve(listing.text(), mid, &store), Some(record));
        }
    }

    #[test]
    fn trailing_empty_line_resolves_to_nothing() {
        let store = store();
        let listing = Listing::new(&store);
        let end = listing.text().len_chars();
        assert_eq!(resolve(listing.text(), end, &store), None);
        assert_eq!(resolve(listing.text(), end + 40, &store), None);
    }

    #[test]
    fn empty_store_resolves_to_nothing_anywhere() {
        let store = RecordStore::default();
        let text = Rope::new();
        for cursor in [0, 1, 100] {
            assert_eq!(resolve(&text, cursor, &store), None);
        }
    }

    #[test]
    fn cursor_moves_clamp_to_listing() {
        let store = store();
        let mut listing = Listing::new(&store);
        assert_eq!(listing.cursor_line(), 0);
        listing.move_lines(-3);
        assert_eq!(listing.cursor_line(), 0);
        listing.move_lines(10);
        assert_eq!(listing.cursor_line(), 2);
        listing.move_to_last_record();
        assert_eq!(listing.cursor_line(), 1);
        listing.move_to_top();
        assert_eq!(listing.cursor(), 0);
    }

    #[test]
    fn lines_match_render_without_terminators() {
        let store = store();
        let listing = Listing::new(&store);
        let lines: Vec<String> = listing.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "The FSF         - http://www.fsf.org/");
        assert_eq!(lines[2], "");
    }
}
