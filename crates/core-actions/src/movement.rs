//! Cursor motion. Pure `Buffer` + `Position` functions, same shape as the
//! editing primitives: each moves the cursor and returns nothing, since the
//! caller always reads the new position back off the buffer.
//!
//! Positions here are codepoint-boundary byte offsets, not grapheme
//! clusters — a combining-mark sequence moves one codepoint at a time.

use core_state::Buffer;
use core_text::Position;

fn prev_char_byte(text: &str, byte: usize) -> usize {
    text[..byte].char_indices().last().map(|(i, _)| i).unwrap_or(0)
}

fn next_char_byte(text: &str, byte: usize) -> usize {
    text[byte..].chars().next().map(|c| byte + c.len_utf8()).unwrap_or(text.len())
}

pub fn forward_char(buffer: &mut Buffer) {
    let cursor = buffer.cursor();
    let row_len = buffer.row(cursor.row).map(|r| r.len()).unwrap_or(0);
    let next = if cursor.byte < row_len {
        let text = buffer.row(cursor.row).map(|r| r.as_str()).unwrap_or("");
        Position::new(cursor.row, next_char_byte(text, cursor.byte))
    } else if cursor.row + 1 < buffer.line_count() {
        Position::new(cursor.row + 1, 0)
    } else {
        cursor
    };
    buffer.set_cursor(next);
    buffer.seal_undo();
}

pub fn backward_char(buffer: &mut Buffer) {
    let cursor = buffer.cursor();
    let prev = if cursor.byte > 0 {
        let text = buffer.row(cursor.row).map(|r| r.as_str()).unwrap_or("");
        Position::new(cursor.row, prev_char_byte(text, cursor.byte))
    } else if cursor.row > 0 {
        let prev_row_len = buffer.row(cursor.row - 1).map(|r| r.len()).unwrap_or(0);
        Position::new(cursor.row - 1, prev_row_len)
    } else {
        cursor
    };
    buffer.set_cursor(prev);
    buffer.seal_undo();
}

/// Move down one line, preserving display column as best it can (clamped to
/// the target line's length — no sticky-column memory across calls, since
/// the spec never asks for it beyond this).
pub fn next_line(buffer: &mut Buffer) {
    let cursor = buffer.cursor();
    if cursor.row + 1 >= buffer.line_count() {
        return;
    }
    let col = display_col(buffer, cursor);
    let target_len = buffer.row(cursor.row + 1).map(|r| r.len()).unwrap_or(0);
    buffer.set_cursor(Position::new(cursor.row + 1, col.min(target_len)));
    buffer.seal_undo();
}

pub fn previous_line(buffer: &mut Buffer) {
    let cursor = buffer.cursor();
    if cursor.row == 0 {
        return;
    }
    let col = display_col(buffer, cursor);
    let target_len = buffer.row(cursor.row - 1).map(|r| r.len()).unwrap_or(0);
    buffer.set_cursor(Position::new(cursor.row - 1, col.min(target_len)));
    buffer.seal_undo();
}

fn display_col(buffer: &Buffer, pos: Position) -> usize {
    let text = buffer.row(pos.row).map(|r| r.as_str()).unwrap_or("");
    pos.byte.min(text.len())
}

pub fn move_beginning_of_line(buffer: &mut Buffer) {
    let cursor = buffer.cursor();
    buffer.set_cursor(Position::new(cursor.row, 0));
    buffer.seal_undo();
}

pub fn move_end_of_line(buffer: &mut Buffer) {
    let cursor = buffer.cursor();
    let len = buffer.row(cursor.row).map(|r| r.len()).unwrap_or(0);
    buffer.set_cursor(Position::new(cursor.row, len));
    buffer.seal_undo();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordClass {
    Word,
    Other,
}

fn classify(c: char) -> WordClass {
    if c.is_alphanumeric() || c == '_' {
        WordClass::Word
    } else {
        WordClass::Other
    }
}

/// Advance to the start of the next word, skipping intervening
/// non-word/whitespace runs and crossing line boundaries.
pub fn forward_word(buffer: &mut Buffer) {
    let mut pos = buffer.cursor();
    loop {
        let Some(row) = buffer.row(pos.row) else { break };
        let text = row.as_str();
        if pos.byte >= text.len() {
            if pos.row + 1 >= buffer.line_count() {
                break;
            }
            pos = Position::new(pos.row + 1, 0);
            continue;
        }
        let c = text[pos.byte..].chars().next().unwrap();
        if classify(c) == WordClass::Word {
            // already on a word char: skip to its end, then stop
            while pos.byte < text.len() {
                let c = text[pos.byte..].chars().next().unwrap();
                if classify(c) != WordClass::Word {
                    break;
                }
                pos.byte = next_char_byte(text, pos.byte);
            }
            break;
        }
        pos.byte = next_char_byte(text, pos.byte);
    }
    buffer.set_cursor(pos);
    buffer.seal_undo();
}

/// Retreat to the start of the previous word, crossing line boundaries.
pub fn backward_word(buffer: &mut Buffer) {
    let mut pos = buffer.cursor();
    loop {
        if pos.byte == 0 {
            if pos.row == 0 {
                break;
            }
            pos.row -= 1;
            pos.byte = buffer.row(pos.row).map(|r| r.len()).unwrap_or(0);
            continue;
        }
        let text = buffer.row(pos.row).map(|r| r.as_str()).unwrap_or("");
        let prev = prev_char_byte(text, pos.byte);
        let c = text[prev..].chars().next().unwrap();
        if classify(c) == WordClass::Word {
            pos.byte = prev;
            while pos.byte > 0 {
                let before = prev_char_byte(text, pos.byte);
                let c = text[before..].chars().next().unwrap();
                if classify(c) != WordClass::Word {
                    break;
                }
                pos.byte = before;
            }
            break;
        }
        pos.byte = prev;
    }
    buffer.set_cursor(pos);
    buffer.seal_undo();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(text: &str) -> Buffer {
        let mut b = Buffer::new("scratch");
        crate::editing::insert_str(&mut b, text).unwrap();
        b.set_cursor(Position::new(0, 0));
        b
    }

    #[test]
    fn forward_and_backward_char_cross_lines() {
        let mut b = buf("ab\ncd");
        b.set_cursor(Position::new(0, 2));
        forward_char(&mut b);
        assert_eq!(b.cursor(), Position::new(1, 0));
        backward_char(&mut b);
        assert_eq!(b.cursor(), Position::new(0, 2));
    }

    #[test]
    fn vertical_motion_clamps_to_shorter_line() {
        let mut b = buf("longer line\nhi");
        b.set_cursor(Position::new(0, 10));
        next_line(&mut b);
        assert_eq!(b.cursor(), Position::new(1, 2));
        previous_line(&mut b);
        assert_eq!(b.cursor(), Position::new(0, 10));
    }

    #[test]
    fn beginning_and_end_of_line() {
        let mut b = buf("hello");
        b.set_cursor(Position::new(0, 3));
        move_beginning_of_line(&mut b);
        assert_eq!(b.cursor(), Position::new(0, 0));
        move_end_of_line(&mut b);
        assert_eq!(b.cursor(), Position::new(0, 5));
    }

    #[test]
    fn word_forward_and_backward() {
        let mut b = buf("foo bar, baz");
        forward_word(&mut b);
        assert_eq!(b.cursor(), Position::new(0, 4));
        forward_word(&mut b);
        assert_eq!(b.cursor(), Position::new(0, 9));
        backward_word(&mut b);
        assert_eq!(b.cursor(), Position::new(0, 4));
    }

    #[test]
    fn word_forward_crosses_line_boundary() {
        let mut b = buf("foo\nbar");
        b.set_cursor(Position::new(0, 3));
        forward_word(&mut b);
        assert_eq!(b.cursor(), Position::new(1, 0));
    }
}
