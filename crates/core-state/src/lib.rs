//! Editor state: the `Buffer` aggregate (rows, cursor, mark, undo log) plus
//! the kill ring, registers, and region shared across buffers.
//!
//! A `Buffer` owns everything needed to edit one piece of text in
//! isolation; `core-model` arranges buffers and windows into the visible
//! editor, and `core-actions` implements the editing commands that call
//! into the methods here.

use std::path::PathBuf;
use std::time::SystemTime;

use core_text::{Position, Row, RowStore, TextError, rows_from_text, rows_to_string, strip_cr_before_lf};
use thiserror::Error;
use tracing::trace;

pub mod bulk;
pub mod killring;
pub mod region;
pub mod registers;
pub mod undo;

pub use killring::KillRing;
pub use region::{Region, RegionShape};
pub use registers::{RegisterSlot, Registers};
pub use undo::{UndoLog, UndoRecord, UNDO_LIMIT};

use bulk::{bulk_delete, bulk_insert};

/// Errors surfaced by buffer mutation and file I/O (spec §7).
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("buffer is read-only")]
    ReadOnly,
    #[error(transparent)]
    OutOfRange(#[from] TextError),
    #[error("file contains invalid UTF-8 or embedded NUL bytes")]
    Utf8Invalid,
    #[error("I/O error: {0}")]
    IoFailed(String),
    #[error("file is locked by {0}")]
    LockConflict(String),
    #[error("file changed on disk since it was loaded")]
    ExternalModification,
    #[error("no match")]
    NoMatch,
    #[error("cancelled")]
    Cancelled,
}

/// Which way a deletion moves relative to the cursor — determines which
/// undo coalescing rule applies (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDirection {
    /// Backspace: cursor moves left, deleted text precedes it.
    Backward,
    /// Forward delete / kill: cursor stays, deleted text follows it.
    Forward,
}

/// One editable piece of text plus its cursor, mark, and undo history.
#[derive(Debug)]
pub struct Buffer {
    rows: RowStore,
    cursor: Position,
    mark: Option<Position>,
    rectangle_mode: bool,
    dirty: u64,
    revision: u64,
    read_only: bool,
    single_line: bool,
    word_wrap: bool,
    special_buffer: bool,
    filename: Option<PathBuf>,
    display_name: String,
    query: String,
    last_match: Option<(Position, Position)>,
    undo: UndoLog,
    mtime: Option<SystemTime>,
    lock_holder: Option<String>,
}

impl Buffer {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            rows: RowStore::with_rows(vec![Row::from_str("")]),
            cursor: Position::default(),
            mark: None,
            rectangle_mode: false,
            dirty: 0,
            revision: 0,
            read_only: false,
            single_line: false,
            word_wrap: true,
            special_buffer: false,
            filename: None,
            display_name: display_name.into(),
            query: String::new(),
            last_match: None,
            undo: UndoLog::new(),
            mtime: None,
            lock_holder: None,
        }
    }

    /// Build a buffer from already-UTF8-validated text (see
    /// `core_text::validate_utf8`), normalizing CRLF, for loading a file.
    pub fn from_text(display_name: impl Into<String>, text: &str, filename: Option<PathBuf>) -> Self {
        let normalized = strip_cr_before_lf(text);
        let mut buf = Self::new(display_name);
        buf.rows = RowStore::with_rows(rows_from_text(&normalized));
        buf.filename = filename;
        buf
    }

    pub fn single_line(display_name: impl Into<String>) -> Self {
        let mut buf = Self::new(display_name);
        buf.single_line = true;
        buf.word_wrap = false;
        buf
    }

    pub fn special(display_name: impl Into<String>) -> Self {
        let mut buf = Self::new(display_name);
        buf.special_buffer = true;
        buf.read_only = true;
        buf
    }

    // --- accessors -----------------------------------------------------

    pub fn rows(&self) -> &RowStore {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    pub fn line_count(&self) -> usize {
        self.rows.len()
    }

    pub fn to_text(&self) -> String {
        rows_to_string(&self.rows)
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn set_cursor(&mut self, pos: Position) {
        self.cursor = self.clamp(pos);
    }

    pub fn mark(&self) -> Option<Position> {
        self.mark
    }

    pub fn set_mark(&mut self, pos: Position) {
        self.mark = Some(pos);
    }

    pub fn clear_mark(&mut self) {
        self.mark = None;
        self.rectangle_mode = false;
    }

    pub fn rectangle_mode(&self) -> bool {
        self.rectangle_mode
    }

    pub fn set_rectangle_mode(&mut self, on: bool) {
        self.rectangle_mode = on;
    }

    pub fn region(&self) -> Option<Region> {
        Region::from_mark_point(self.mark, self.cursor, self.rectangle_mode)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty > 0
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn mark_clean(&mut self, mtime: SystemTime) {
        self.dirty = 0;
        self.mtime = Some(mtime);
    }

    pub fn mtime(&self) -> Option<SystemTime> {
        self.mtime
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, ro: bool) {
        self.read_only = ro;
    }

    pub fn single_line_buffer(&self) -> bool {
        self.single_line
    }

    pub fn special_buffer(&self) -> bool {
        self.special_buffer
    }

    pub fn word_wrap(&self) -> bool {
        self.word_wrap
    }

    pub fn set_word_wrap(&mut self, on: bool) {
        self.word_wrap = on;
    }

    pub fn filename(&self) -> Option<&PathBuf> {
        self.filename.as_ref()
    }

    pub fn set_filename(&mut self, path: PathBuf) {
        self.filename = Some(path);
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.display_name = name.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, q: impl Into<String>) {
        self.query = q.into();
    }

    pub fn last_match(&self) -> Option<(Position, Position)> {
        self.last_match
    }

    pub fn set_last_match(&mut self, span: Option<(Position, Position)>) {
        self.last_match = span;
    }

    pub fn lock_holder(&self) -> Option<&str> {
        self.lock_holder.as_deref()
    }

    pub fn set_lock_holder(&mut self, holder: Option<String>) {
        self.lock_holder = holder;
    }

    pub fn undo_log(&self) -> &UndoLog {
        &self.undo
    }

    /// Clamp `pos` to valid row/byte bounds within this buffer.
    pub fn clamp(&self, pos: Position) -> Position {
        let row = pos.row.min(self.rows.len().saturating_sub(1));
        let row_len = self.rows.get(row).map(|r| r.len()).unwrap_or(0);
        Position::new(row, pos.byte.min(row_len))
    }

    // --- mutation --------------------------------------------------------

    /// Insert `data` at `pos`, recording an undo entry. Returns the position
    /// after the inserted text.
    pub fn insert_at(&mut self, pos: Position, data: &[u8]) -> Result<Position, EditorError> {
        if self.read_only {
            return Err(EditorError::ReadOnly);
        }
        let end = bulk_insert(&mut self.rows, pos, data);
        self.undo.record_insert(pos, end, data);
        self.dirty += 1;
        self.revision += 1;
        trace!(target: "state.buffer", row = pos.row, byte = pos.byte, len = data.len(), "insert");
        Ok(end)
    }

    /// Delete `[start, end)`, recording an undo entry appropriate to
    /// `direction`. Returns the removed bytes.
    pub fn delete_span(
        &mut self,
        start: Position,
        end: Position,
        direction: DeleteDirection,
    ) -> Result<Vec<u8>, EditorError> {
        if self.read_only {
            return Err(EditorError::ReadOnly);
        }
        let removed = bulk_delete(&mut self.rows, start, end);
        match direction {
            DeleteDirection::Backward => self.undo.record_delete_backward(start, end, &removed),
            DeleteDirection::Forward => self.undo.record_delete_forward(start, end, &removed),
        }
        self.dirty += 1;
        self.revision += 1;
        trace!(target: "state.buffer", row = start.row, byte = start.byte, len = removed.len(), "delete");
        Ok(removed)
    }

    /// End the current undo coalescing run so the next edit starts fresh
    /// (called on cursor motion, mode change, or an explicit boundary).
    pub fn seal_undo(&mut self) {
        self.undo.seal();
    }

    /// Snapshot the undo log's depth, to later chain everything pushed since
    /// into one atomic group via `pair_undo_since` (spec §4.4: a compound
    /// command like `yank-pop` or `indent-region` must undo as one step).
    pub fn undo_mark(&self) -> usize {
        self.undo.undo_count()
    }

    /// Retroactively chain every undo record pushed since `mark` into a
    /// single paired group, so one `undo()` call replays all of them.
    pub fn pair_undo_since(&mut self, mark: usize) {
        self.undo.pair_since(mark);
    }

    /// Replay the most recent undo record (or whole paired group) in
    /// reverse, moving the cursor to match. Returns `false` if there is
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        if self.read_only {
            return false;
        }
        let rows = &mut self.rows;
        let cursor = &mut self.cursor;
        let applied = self.undo.undo_step(|rec| {
            if rec.is_delete {
                *cursor = bulk_insert(rows, rec.start, &rec.data);
            } else {
                bulk_delete(rows, rec.start, rec.end);
                *cursor = rec.start;
            }
        });
        if applied {
            self.dirty += 1;
            self.revision += 1;
        }
        applied
    }

    /// Replay the next redo record forward. Returns `false` if there is
    /// nothing to redo.
    pub fn redo(&mut self) -> bool {
        if self.read_only {
            return false;
        }
        let rows = &mut self.rows;
        let cursor = &mut self.cursor;
        let applied = self.undo.redo_step(|rec| {
            if rec.is_delete {
                bulk_delete(rows, rec.start, rec.end);
                *cursor = rec.start;
            } else {
                *cursor = bulk_insert(rows, rec.start, &rec.data);
            }
        });
        if applied {
            self.dirty += 1;
            self.revision += 1;
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_undo_round_trip() {
        let mut buf = Buffer::new("scratch");
        buf.insert_at(Position::new(0, 0), b"hello").unwrap();
        assert_eq!(buf.to_text(), "hello");
        assert!(buf.is_dirty());
        assert!(buf.undo());
        assert_eq!(buf.to_text(), "");
    }

    #[test]
    fn undo_then_redo_restores_insert() {
        let mut buf = Buffer::new("scratch");
        buf.insert_at(Position::new(0, 0), b"hi").unwrap();
        buf.undo();
        assert_eq!(buf.to_text(), "");
        assert!(buf.redo());
        assert_eq!(buf.to_text(), "hi");
    }

    #[test]
    fn read_only_rejects_mutation() {
        let mut buf = Buffer::new("scratch");
        buf.set_read_only(true);
        assert!(matches!(
            buf.insert_at(Position::new(0, 0), b"x"),
            Err(EditorError::ReadOnly)
        ));
    }

    #[test]
    fn backspace_coalesces_then_undo_restores_whole_run() {
        let mut buf = Buffer::new("scratch");
        buf.insert_at(Position::new(0, 0), b"abc").unwrap();
        buf.seal_undo();
        buf.delete_span(Position::new(0, 2), Position::new(0, 3), DeleteDirection::Backward)
            .unwrap();
        buf.delete_span(Position::new(0, 1), Position::new(0, 2), DeleteDirection::Backward)
            .unwrap();
        assert_eq!(buf.to_text(), "a");
        assert!(buf.undo());
        assert_eq!(buf.to_text(), "abc");
    }

    #[test]
    fn from_text_normalizes_crlf_and_splits_rows() {
        let buf = Buffer::from_text("f.txt", "a\r\nb\r\n", None);
        assert_eq!(buf.line_count(), 2);
        assert_eq!(buf.row(0).unwrap().as_str(), "a");
    }

    #[test]
    fn region_reads_from_mark_and_point() {
        let mut buf = Buffer::new("scratch");
        buf.insert_at(Position::new(0, 0), b"hello world").unwrap();
        buf.set_mark(Position::new(0, 6));
        buf.set_cursor(Position::new(0, 0));
        let region = buf.region().unwrap();
        assert_eq!(region.start, Position::new(0, 0));
        assert_eq!(region.end, Position::new(0, 6));
    }
}
