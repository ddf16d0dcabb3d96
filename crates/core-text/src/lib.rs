//! Row storage and UTF-8 correctness for the editor's text model.
//!
//! A `Row` holds raw line bytes and a lazily recomputed display-width cache.
//! `RowStore` is a thin, index-stable `Vec<Row>` wrapper providing the
//! insert/delete/char-level mutation primitives the buffer layer builds on.

use std::cell::Cell;
use thiserror::Error;

pub mod width;
pub mod wrap;

pub use width::{TAB_STOP, chars_to_display_column, control_caret, glyph_width};
pub use wrap::{count_screen_lines, word_wrap_break};

/// Errors raised by the row/text layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("index out of range")]
    OutOfRange,
    #[error("invalid UTF-8 content")]
    Utf8Invalid,
}

/// A single line of text: raw UTF-8 bytes plus a memoized display width.
///
/// `cached_width` is `None` ("stale") until queried; any mutation through the
/// methods below invalidates it again. The cache is an optimization only —
/// callers may always recompute from `bytes`.
#[derive(Debug, Clone)]
pub struct Row {
    bytes: Vec<u8>,
    cached_width: Cell<Option<usize>>,
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}
impl Eq for Row {}

impl Row {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            cached_width: Cell::new(None),
        }
    }

    pub fn from_str(s: impl Into<String>) -> Self {
        Self::new(s.into().into_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Panics if the row does not hold valid UTF-8; callers are responsible
    /// for only ever constructing rows from validated text (see
    /// [`crate::validate_utf8`]).
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).expect("row bytes must be valid UTF-8")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns true if `byte_pos` sits on a UTF-8 codepoint boundary (or at
    /// row end).
    pub fn is_char_boundary(&self, byte_pos: usize) -> bool {
        byte_pos <= self.bytes.len() && self.as_str().is_char_boundary(byte_pos)
    }

    fn invalidate(&mut self) {
        self.cached_width.set(None);
    }

    /// Total display-column width of the row, using the cached value when
    /// present.
    pub fn display_width(&self) -> usize {
        if let Some(w) = self.cached_width.get() {
            return w;
        }
        let w = chars_to_display_column(self.as_str(), self.bytes.len());
        self.cached_width.set(Some(w));
        w
    }

    /// Insert raw bytes (one or more codepoints) at `byte_pos`. Caller must
    /// align `byte_pos` on a codepoint boundary.
    pub fn insert_bytes(&mut self, byte_pos: usize, data: &[u8]) -> Result<(), TextError> {
        if byte_pos > self.bytes.len() || !self.is_char_boundary(byte_pos) {
            return Err(TextError::OutOfRange);
        }
        self.bytes.splice(byte_pos..byte_pos, data.iter().copied());
        self.invalidate();
        Ok(())
    }

    /// Delete one codepoint starting at `byte_pos`. Returns the removed
    /// bytes, or `None` if `byte_pos` is at row end.
    pub fn delete_char_at(&mut self, byte_pos: usize) -> Result<Option<Vec<u8>>, TextError> {
        if byte_pos > self.bytes.len() || !self.is_char_boundary(byte_pos) {
            return Err(TextError::OutOfRange);
        }
        if byte_pos == self.bytes.len() {
            return Ok(None);
        }
        let rest = self.as_str()[byte_pos..].chars().next().unwrap();
        let end = byte_pos + rest.len_utf8();
        let removed = self.bytes.splice(byte_pos..end, std::iter::empty()).collect();
        self.invalidate();
        Ok(Some(removed))
    }

    /// Remove and return the bytes in `[start, end)`. Both ends must sit on
    /// codepoint boundaries.
    pub fn delete_range(&mut self, start: usize, end: usize) -> Result<Vec<u8>, TextError> {
        if end > self.bytes.len() || start > end || !self.is_char_boundary(start) || !self.is_char_boundary(end) {
            return Err(TextError::OutOfRange);
        }
        let removed = self.bytes.splice(start..end, std::iter::empty()).collect();
        self.invalidate();
        Ok(removed)
    }

    pub fn append(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
        self.invalidate();
    }

    /// Split this row at `byte_pos`, returning the new (tail) row. `self`
    /// retains the prefix `[0, byte_pos)`.
    pub fn split_off(&mut self, byte_pos: usize) -> Result<Row, TextError> {
        if byte_pos > self.bytes.len() || !self.is_char_boundary(byte_pos) {
            return Err(TextError::OutOfRange);
        }
        let tail = self.bytes.split_off(byte_pos);
        self.invalidate();
        Ok(Row::new(tail))
    }

    pub fn slice(&self, start: usize, end: usize) -> &[u8] {
        &self.bytes[start.min(self.bytes.len())..end.min(self.bytes.len())]
    }
}

/// Index-stable ordered collection of [`Row`]s backing one buffer.
#[derive(Debug, Clone, Default)]
pub struct RowStore(Vec<Row>);

impl RowStore {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self(rows)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Row> {
        self.0.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Row> {
        self.0.get_mut(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Row] {
        &self.0
    }

    /// Insert a row at index `at`, shifting `[at..]` right by one.
    pub fn insert_row(&mut self, at: usize, row: Row) -> Result<(), TextError> {
        if at > self.0.len() {
            return Err(TextError::OutOfRange);
        }
        self.0.insert(at, row);
        Ok(())
    }

    /// Remove and return the row at index `at`, shifting `[at+1..]` left.
    pub fn delete_row(&mut self, at: usize) -> Result<Row, TextError> {
        if at >= self.0.len() {
            return Err(TextError::OutOfRange);
        }
        Ok(self.0.remove(at))
    }
}

impl std::ops::Index<usize> for RowStore {
    type Output = Row;
    fn index(&self, idx: usize) -> &Row {
        &self.0[idx]
    }
}

/// A cursor-like position within a buffer: a row index and a byte offset
/// (not a character or column index) within that row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub byte: usize,
}

impl Position {
    pub fn new(row: usize, byte: usize) -> Self {
        Self { row, byte }
    }
}

/// Validate that `bytes` is UTF-8 text suitable for loading into a buffer:
/// rejects embedded NUL bytes (the spec's binary-file marker) and any
/// malformed UTF-8 (overlong sequences, surrogate codepoints, codepoints
/// beyond `U+10FFFF`, and truncated/misplaced continuation bytes are all
/// already rejected by Rust's strict UTF-8 decoder).
pub fn validate_utf8(bytes: &[u8]) -> Result<String, TextError> {
    if bytes.contains(&0) {
        return Err(TextError::Utf8Invalid);
    }
    std::str::from_utf8(bytes)
        .map(|s| s.to_string())
        .map_err(|_| TextError::Utf8Invalid)
}

/// Split normalized text (CRLF already stripped by the caller) on `\n` into
/// `Row`s.
pub fn rows_from_text(text: &str) -> Vec<Row> {
    if text.is_empty() {
        return vec![Row::from_str("")];
    }
    let mut rows: Vec<Row> = text.split('\n').map(Row::from_str).collect();
    if text.ends_with('\n') {
        rows.pop();
    }
    if rows.is_empty() {
        rows.push(Row::from_str(""));
    }
    rows
}

/// Strip a trailing `\r` before each `\n` (load-time normalization per spec §6).
pub fn strip_cr_before_lf(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Join rows back into newline-terminated text (used by save and round-trip
/// tests).
pub fn rows_to_string(rows: &RowStore) -> String {
    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        out.push_str(row.as_str());
        if i + 1 < rows.len() {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_null() {
        assert_eq!(validate_utf8(b"ab\0cd"), Err(TextError::Utf8Invalid));
    }

    #[test]
    fn validate_rejects_truncated_continuation() {
        assert_eq!(validate_utf8(&[0xE2, 0x82]), Err(TextError::Utf8Invalid));
    }

    #[test]
    fn validate_accepts_plain_utf8() {
        assert_eq!(validate_utf8("héllo".as_bytes()).unwrap(), "héllo");
    }

    #[test]
    fn rows_from_text_basic() {
        let rows = rows_from_text("a\nb\nc");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].as_str(), "b");
    }

    #[test]
    fn rows_from_text_trailing_newline_no_extra_row() {
        let rows = rows_from_text("a\nb\n");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn rows_to_string_round_trip() {
        let rows = RowStore::with_rows(rows_from_text("Hello\nWorld"));
        assert_eq!(rows_to_string(&rows), "Hello\nWorld");
    }

    #[test]
    fn row_insert_and_delete_char_respects_boundary() {
        let mut row = Row::from_str("abc");
        assert_eq!(row.insert_bytes(1, "x".as_bytes()), Ok(()));
        assert_eq!(row.as_str(), "axbc");
        let removed = row.delete_char_at(1).unwrap().unwrap();
        assert_eq!(removed, b"x");
        assert_eq!(row.as_str(), "abc");
    }

    #[test]
    fn row_insert_out_of_range() {
        let mut row = Row::from_str("ab");
        assert_eq!(row.insert_bytes(5, b"x"), Err(TextError::OutOfRange));
    }

    #[test]
    fn rowstore_insert_delete_shifts() {
        let mut store = RowStore::with_rows(rows_from_text("a\nb\nc"));
        store.insert_row(1, Row::from_str("z")).unwrap();
        assert_eq!(rows_to_string(&store), "a\nz\nb\nc");
        store.delete_row(0).unwrap();
        assert_eq!(rows_to_string(&store), "z\nb\nc");
    }

    #[test]
    fn display_width_cache_invalidated_on_mutation() {
        let mut row = Row::from_str("abc");
        assert_eq!(row.display_width(), 3);
        row.insert_bytes(3, b"d").unwrap();
        assert_eq!(row.display_width(), 4);
    }

    #[test]
    fn delete_range_removes_interior_span() {
        let mut row = Row::from_str("hello world");
        let removed = row.delete_range(5, 11).unwrap();
        assert_eq!(removed, b" world");
        assert_eq!(row.as_str(), "hello");
    }

    #[test]
    fn split_off_preserves_content() {
        let mut row = Row::from_str("hello world");
        let tail = row.split_off(5).unwrap();
        assert_eq!(row.as_str(), "hello");
        assert_eq!(tail.as_str(), " world");
    }
}
