//! Row-spanning insert/delete primitives shared by ordinary edits and by
//! undo/redo replay (spec §4.4: "undo/redo must replay as a single bulk
//! mutation, never a per-character loop").

use core_text::{Position, Row, RowStore};

/// Insert possibly-multiline `data` at `pos`, splitting it on `\n` into new
/// rows as needed. Returns the position immediately after the inserted text.
pub fn bulk_insert(rows: &mut RowStore, pos: Position, data: &[u8]) -> Position {
    if !data.contains(&b'\n') {
        rows.get_mut(pos.row)
            .expect("row in range")
            .insert_bytes(pos.byte, data)
            .expect("byte_pos on boundary");
        return Position::new(pos.row, pos.byte + data.len());
    }

    let parts: Vec<&[u8]> = data.split(|&b| b == b'\n').collect();
    let tail = rows
        .get_mut(pos.row)
        .expect("row in range")
        .split_off(pos.byte)
        .expect("byte_pos on boundary");
    rows.get_mut(pos.row).unwrap().append(parts[0]);

    let mut insert_at = pos.row + 1;
    for part in &parts[1..parts.len() - 1] {
        rows.insert_row(insert_at, Row::new(part.to_vec())).unwrap();
        insert_at += 1;
    }
    let last = parts[parts.len() - 1];
    let end_byte = last.len();
    let mut last_row_bytes = last.to_vec();
    last_row_bytes.extend_from_slice(tail.as_bytes());
    rows.insert_row(insert_at, Row::new(last_row_bytes)).unwrap();

    Position::new(insert_at, end_byte)
}

/// Remove the span `[start, end)`, which may cross row boundaries, merging
/// the rows on either side back into one. Returns the removed bytes in file
/// order (row boundaries represented as `\n`).
pub fn bulk_delete(rows: &mut RowStore, start: Position, end: Position) -> Vec<u8> {
    if start.row == end.row {
        return rows
            .get_mut(start.row)
            .expect("row in range")
            .delete_range(start.byte, end.byte)
            .expect("valid span");
    }

    let mut removed = Vec::new();
    let start_row_len = rows.get(start.row).expect("row in range").len();
    let start_suffix = rows
        .get_mut(start.row)
        .unwrap()
        .delete_range(start.byte, start_row_len)
        .expect("valid span");
    removed.extend_from_slice(&start_suffix);
    removed.push(b'\n');

    for _ in (start.row + 1)..end.row {
        let r = rows.delete_row(start.row + 1).expect("interior row present");
        removed.extend_from_slice(r.as_bytes());
        removed.push(b'\n');
    }

    let mut end_row = rows.delete_row(start.row + 1).expect("end row present");
    let end_prefix = end_row
        .delete_range(0, end.byte)
        .expect("valid end span");
    removed.extend_from_slice(&end_prefix);
    rows.get_mut(start.row).unwrap().append(end_row.as_bytes());

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::rows_from_text;

    fn store(text: &str) -> RowStore {
        RowStore::with_rows(rows_from_text(text))
    }

    #[test]
    fn single_row_insert_and_delete_round_trip() {
        let mut rows = store("hello");
        let end = bulk_insert(&mut rows, Position::new(0, 5), b" world");
        assert_eq!(rows.get(0).unwrap().as_str(), "hello world");
        assert_eq!(end, Position::new(0, 11));
        let removed = bulk_delete(&mut rows, Position::new(0, 5), Position::new(0, 11));
        assert_eq!(removed, b" world");
        assert_eq!(rows.get(0).unwrap().as_str(), "hello");
    }

    #[test]
    fn multiline_insert_splits_row() {
        let mut rows = store("foobar");
        let end = bulk_insert(&mut rows, Position::new(0, 3), b"\nbaz\n");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.get(0).unwrap().as_str(), "foo");
        assert_eq!(rows.get(1).unwrap().as_str(), "baz");
        assert_eq!(rows.get(2).unwrap().as_str(), "bar");
        assert_eq!(end, Position::new(2, 0));
    }

    #[test]
    fn cross_row_delete_merges_rows() {
        let mut rows = store("foo\nbaz\nbar");
        let removed = bulk_delete(&mut rows, Position::new(0, 3), Position::new(2, 0));
        assert_eq!(removed, b"\nbaz\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.get(0).unwrap().as_str(), "foobar");
    }

    #[test]
    fn insert_and_delete_are_mutual_inverses() {
        let mut rows = store("foobar");
        let start = Position::new(0, 3);
        let data = b"\none\ntwo\n";
        let end = bulk_insert(&mut rows, start, data);
        let removed = bulk_delete(&mut rows, start, end);
        assert_eq!(removed, data);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.get(0).unwrap().as_str(), "foobar");
    }
}
