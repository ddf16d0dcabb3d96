//! Incremental search. A literal, case-sensitive substring search starting
//! just after the cursor and wrapping to the top of the buffer once, mirroring
//! the spec's `NoMatch` policy: on failure the cursor is left exactly where
//! it was.

use core_state::{Buffer, EditorError};
use core_text::Position;

/// Search forward for `query` starting after the cursor, wrapping around the
/// buffer once. On a hit, moves the cursor to the match end and records
/// `last_match`; on a miss, returns `NoMatch` and leaves the cursor alone.
pub fn isearch_forward(buffer: &mut Buffer, query: &str) -> Result<(Position, Position), EditorError> {
    if query.is_empty() {
        return Err(EditorError::NoMatch);
    }
    let start = buffer.cursor();
    let rows = buffer.line_count();

    if let Some(hit) = search_from(buffer, query, start.row, start.byte + 1, rows) {
        return accept(buffer, hit);
    }
    if let Some(hit) = search_from(buffer, query, 0, 0, start.row + 1) {
        return accept(buffer, hit);
    }
    Err(EditorError::NoMatch)
}

fn accept(buffer: &mut Buffer, (start, end): (Position, Position)) -> Result<(Position, Position), EditorError> {
    buffer.set_cursor(end);
    buffer.set_last_match(Some((start, end)));
    buffer.seal_undo();
    Ok((start, end))
}

fn search_from(buffer: &Buffer, query: &str, from_row: usize, from_byte: usize, to_row_exclusive: usize) -> Option<(Position, Position)> {
    for row in from_row..to_row_exclusive.min(buffer.line_count()) {
        let text = buffer.row(row).map(|r| r.as_str()).unwrap_or("");
        let scan_from = if row == from_row { from_byte.min(text.len()) } else { 0 };
        if scan_from > text.len() {
            continue;
        }
        if let Some(rel) = text[scan_from..].find(query) {
            let byte = scan_from + rel;
            return Some((Position::new(row, byte), Position::new(row, byte + query.len())));
        }
    }
    None
}
