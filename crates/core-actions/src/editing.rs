//! Editing primitives. Each function performs exactly one (possibly
//! undo-coalesced) mutation and leaves the cursor where the user expects it
//! next — callers (command dispatch) never touch `Buffer`'s undo log
//! directly.

use core_config::EditingConfig;
use core_state::{Buffer, DeleteDirection, EditorError};
use core_text::Position;

/// Insert a single already-decoded character at the cursor, advancing it.
pub fn insert_char(buffer: &mut Buffer, c: char) -> Result<(), EditorError> {
    let mut buf = [0u8; 4];
    let s = c.encode_utf8(&mut buf);
    let end = buffer.insert_at(buffer.cursor(), s.as_bytes())?;
    buffer.set_cursor(end);
    Ok(())
}

/// Insert raw, possibly multi-codepoint text (e.g. a paste) at the cursor.
pub fn insert_str(buffer: &mut Buffer, text: &str) -> Result<(), EditorError> {
    let end = buffer.insert_at(buffer.cursor(), text.as_bytes())?;
    buffer.set_cursor(end);
    buffer.seal_undo();
    Ok(())
}

/// Plain newline at the cursor (spec's `insert-newline`).
pub fn insert_newline(buffer: &mut Buffer) -> Result<(), EditorError> {
    let end = buffer.insert_at(buffer.cursor(), b"\n")?;
    buffer.set_cursor(end);
    buffer.seal_undo();
    Ok(())
}

/// Newline followed by the current line's leading whitespace, copied onto
/// the new line (spec's `insert-newline-and-indent`).
pub fn insert_newline_and_indent(buffer: &mut Buffer) -> Result<(), EditorError> {
    let cursor = buffer.cursor();
    let indent: String = buffer
        .row(cursor.row)
        .map(|r| r.as_str())
        .unwrap_or("")
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect();
    let mut payload = String::from("\n");
    payload.push_str(&indent);
    let end = buffer.insert_at(cursor, payload.as_bytes())?;
    buffer.set_cursor(end);
    buffer.seal_undo();
    Ok(())
}

/// Open a blank line below the cursor without moving it (spec's
/// `open-line`): insert a newline after the cursor, cursor stays put.
pub fn open_line(buffer: &mut Buffer) -> Result<(), EditorError> {
    let cursor = buffer.cursor();
    buffer.insert_at(cursor, b"\n")?;
    buffer.set_cursor(cursor);
    buffer.seal_undo();
    Ok(())
}

/// Delete the character before the cursor (backspace), joining lines at BOL.
pub fn delete_char_backward(buffer: &mut Buffer) -> Result<(), EditorError> {
    let cursor = buffer.cursor();
    let start = prev_char_position(buffer, cursor);
    if start == cursor {
        return Ok(());
    }
    buffer.delete_span(start, cursor, DeleteDirection::Backward)?;
    buffer.set_cursor(start);
    Ok(())
}

/// Delete the character at/after the cursor (forward delete / `C-d`).
pub fn delete_char_forward(buffer: &mut Buffer) -> Result<(), EditorError> {
    let cursor = buffer.cursor();
    let end = next_char_position(buffer, cursor);
    if end == cursor {
        return Ok(());
    }
    buffer.delete_span(cursor, end, DeleteDirection::Forward)?;
    buffer.set_cursor(cursor);
    Ok(())
}

/// Kill from the cursor to end of line (or, at end of line, the newline
/// itself), pushing the removed text onto the kill ring.
pub fn kill_line(buffer: &mut Buffer, kill_ring: &mut core_state::KillRing, append: bool) -> Result<(), EditorError> {
    let cursor = buffer.cursor();
    let row_len = buffer.row(cursor.row).map(|r| r.len()).unwrap_or(cursor.byte);
    let end = if cursor.byte < row_len {
        Position::new(cursor.row, row_len)
    } else if cursor.row + 1 < buffer.line_count() {
        Position::new(cursor.row + 1, 0)
    } else {
        cursor
    };
    if end == cursor {
        return Ok(());
    }
    let removed = buffer.delete_span(cursor, end, DeleteDirection::Forward)?;
    let text = String::from_utf8(removed).expect("deleted span is valid UTF-8");
    if append {
        kill_ring.append_to_last(&text);
    } else {
        kill_ring.push(text);
    }
    Ok(())
}

/// Insert the kill ring's current entry at the cursor (`yank`).
pub fn yank(buffer: &mut Buffer, kill_ring: &core_state::KillRing) -> Result<Option<(Position, Position)>, EditorError> {
    let Some(text) = kill_ring.current() else {
        return Ok(None);
    };
    let start = buffer.cursor();
    let end = buffer.insert_at(start, text.as_bytes())?;
    buffer.set_cursor(end);
    buffer.seal_undo();
    Ok(Some((start, end)))
}

/// Replace the most recently yanked span with the next kill ring entry
/// (`yank-pop`). `last_yank` must be the span `yank` returned.
pub fn yank_pop(
    buffer: &mut Buffer,
    kill_ring: &mut core_state::KillRing,
    last_yank: (Position, Position),
) -> Result<Option<(Position, Position)>, EditorError> {
    let Some(next) = kill_ring.rotate().map(str::to_string) else {
        return Ok(None);
    };
    let mark = buffer.undo_mark();
    buffer.delete_span(last_yank.0, last_yank.1, DeleteDirection::Forward)?;
    let end = buffer.insert_at(last_yank.0, next.as_bytes())?;
    buffer.set_cursor(end);
    buffer.pair_undo_since(mark);
    buffer.seal_undo();
    Ok(Some((last_yank.0, end)))
}

/// Indent every line touched by `[start_row, end_row]` by `config.indent_width`
/// spaces.
pub fn indent_rows(buffer: &mut Buffer, start_row: usize, end_row: usize, config: &EditingConfig) -> Result<(), EditorError> {
    let pad = " ".repeat(config.indent_width as usize);
    let mark = buffer.undo_mark();
    for row in start_row..=end_row {
        buffer.insert_at(Position::new(row, 0), pad.as_bytes())?;
    }
    buffer.pair_undo_since(mark);
    buffer.seal_undo();
    Ok(())
}

/// Remove up to `config.indent_width` leading spaces/tabs from every line in
/// `[start_row, end_row]`.
pub fn unindent_rows(buffer: &mut Buffer, start_row: usize, end_row: usize, config: &EditingConfig) -> Result<(), EditorError> {
    let max = config.indent_width as usize;
    let mark = buffer.undo_mark();
    for row in start_row..=end_row {
        let Some(text) = buffer.row(row).map(|r| r.as_str().to_string()) else { continue };
        let strip = text.chars().take(max).take_while(|c| *c == ' ' || *c == '\t').count();
        if strip > 0 {
            buffer.delete_span(Position::new(row, 0), Position::new(row, strip), DeleteDirection::Forward)?;
        }
    }
    buffer.pair_undo_since(mark);
    buffer.seal_undo();
    Ok(())
}

fn prev_char_position(buffer: &Buffer, pos: Position) -> Position {
    if pos.byte > 0 {
        let text = buffer.row(pos.row).map(|r| r.as_str()).unwrap_or("");
        let prev_byte = text[..pos.byte]
            .char_indices()
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        Position::new(pos.row, prev_byte)
    } else if pos.row > 0 {
        let prev_row_len = buffer.row(pos.row - 1).map(|r| r.len()).unwrap_or(0);
        Position::new(pos.row - 1, prev_row_len)
    } else {
        pos
    }
}

fn next_char_position(buffer: &Buffer, pos: Position) -> Position {
    let row_len = buffer.row(pos.row).map(|r| r.len()).unwrap_or(0);
    if pos.byte < row_len {
        let text = buffer.row(pos.row).map(|r| r.as_str()).unwrap_or("");
        let next_byte = text[pos.byte..]
            .chars()
            .next()
            .map(|c| pos.byte + c.len_utf8())
            .unwrap_or(row_len);
        Position::new(pos.row, next_byte)
    } else if pos.row + 1 < buffer.line_count() {
        Position::new(pos.row + 1, 0)
    } else {
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::KillRing;

    fn config() -> EditingConfig {
        EditingConfig::default()
    }

    #[test]
    fn insert_char_advances_cursor() {
        let mut buf = Buffer::new("scratch");
        insert_char(&mut buf, 'a').unwrap();
        insert_char(&mut buf, 'b').unwrap();
        assert_eq!(buf.to_text(), "ab");
        assert_eq!(buf.cursor(), Position::new(0, 2));
    }

    #[test]
    fn backspace_joins_lines_at_start() {
        let mut buf = Buffer::new("scratch");
        insert_str(&mut buf, "foo\nbar").unwrap();
        buf.set_cursor(Position::new(1, 0));
        delete_char_backward(&mut buf).unwrap();
        assert_eq!(buf.to_text(), "foobar");
        assert_eq!(buf.cursor(), Position::new(0, 3));
    }

    #[test]
    fn forward_delete_removes_next_char() {
        let mut buf = Buffer::new("scratch");
        insert_str(&mut buf, "abc").unwrap();
        buf.set_cursor(Position::new(0, 1));
        delete_char_forward(&mut buf).unwrap();
        assert_eq!(buf.to_text(), "ac");
    }

    #[test]
    fn kill_line_then_yank_round_trips() {
        let mut buf = Buffer::new("scratch");
        insert_str(&mut buf, "hello world").unwrap();
        buf.set_cursor(Position::new(0, 5));
        let mut ring = KillRing::new();
        kill_line(&mut buf, &mut ring, false).unwrap();
        assert_eq!(buf.to_text(), "hello");
        let span = yank(&mut buf, &ring).unwrap().unwrap();
        assert_eq!(buf.to_text(), "hello world");
        assert_eq!(span.1, Position::new(0, 11));
    }

    #[test]
    fn open_line_keeps_cursor_in_place() {
        let mut buf = Buffer::new("scratch");
        insert_str(&mut buf, "abc").unwrap();
        buf.set_cursor(Position::new(0, 1));
        open_line(&mut buf).unwrap();
        assert_eq!(buf.cursor(), Position::new(0, 1));
        assert_eq!(buf.to_text(), "a\nbc");
    }

    #[test]
    fn insert_newline_and_indent_copies_leading_whitespace() {
        let mut buf = Buffer::new("scratch");
        insert_str(&mut buf, "  foo").unwrap();
        buf.set_cursor(Position::new(0, 5));
        insert_newline_and_indent(&mut buf).unwrap();
        assert_eq!(buf.to_text(), "  foo\n  ");
    }

    #[test]
    fn indent_and_unindent_round_trip() {
        let mut buf = Buffer::new("scratch");
        insert_str(&mut buf, "a\nb").unwrap();
        let cfg = config();
        indent_rows(&mut buf, 0, 1, &cfg).unwrap();
        assert_eq!(buf.to_text(), "    a\n    b");
        unindent_rows(&mut buf, 0, 1, &cfg).unwrap();
        assert_eq!(buf.to_text(), "a\nb");
    }

    #[test]
    fn indent_rows_undoes_all_lines_in_one_step() {
        let mut buf = Buffer::new("scratch");
        insert_str(&mut buf, "a\nb\nc").unwrap();
        let cfg = config();
        indent_rows(&mut buf, 0, 2, &cfg).unwrap();
        assert_eq!(buf.to_text(), "    a\n    b\n    c");
        assert!(buf.undo());
        assert_eq!(buf.to_text(), "a\nb\nc");
    }

    #[test]
    fn unindent_rows_undoes_all_lines_in_one_step() {
        let mut buf = Buffer::new("scratch");
        insert_str(&mut buf, "    a\n    b\n    c").unwrap();
        let cfg = config();
        unindent_rows(&mut buf, 0, 2, &cfg).unwrap();
        assert_eq!(buf.to_text(), "a\nb\nc");
        assert!(buf.undo());
        assert_eq!(buf.to_text(), "    a\n    b\n    c");
    }

    #[test]
    fn yank_pop_undoes_as_one_step() {
        let mut buf = Buffer::new("scratch");
        insert_str(&mut buf, "hello world").unwrap();
        buf.set_cursor(Position::new(0, 5));
        let mut ring = KillRing::new();
        kill_line(&mut buf, &mut ring, false).unwrap();
        ring.push("other".to_string());
        let span = yank(&mut buf, &ring).unwrap().unwrap();
        assert_eq!(buf.to_text(), "helloother");
        let span = yank_pop(&mut buf, &mut ring, span).unwrap().unwrap();
        assert_ne!(span.0, span.1);
        assert_eq!(buf.to_text(), "hello world");
        assert!(buf.undo());
        assert_eq!(buf.to_text(), "helloother");
    }
}
