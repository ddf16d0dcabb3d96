//! Word-wrap layout: deciding where a logical row breaks across screen
//! lines under a fixed column budget.

use crate::width::advance_column;

/// Printable, non-whitespace characters that also count as word boundaries
/// when found immediately to their right (spec glossary "word boundary").
const PRINTABLE_SEPARATORS: &[char] = &['-', '.', ',', ';', ':', '!', '?', ')', ']', '}', '"', '\''];

fn is_separator(c: char) -> bool {
    c == ' ' || c == '\t' || PRINTABLE_SEPARATORS.contains(&c)
}

/// Walk forward from `line_start_byte` in `text`, returning
/// `(break_col, break_byte, more)`:
///
/// - `more == false` means the remainder of the row fit within `screencols`
///   and `break_byte == text.len()`.
/// - Otherwise the break lands at the right edge of the last word boundary
///   seen, or — if no boundary was seen — hard at the column limit.
/// - A wide (2-column) character that would straddle the right margin
///   forces a break before it, even inside the budget.
pub fn word_wrap_break(
    text: &str,
    screencols: usize,
    line_start_col: usize,
    line_start_byte: usize,
) -> (usize, usize, bool) {
    if screencols == 0 {
        return (line_start_col, line_start_byte, text.len() > line_start_byte);
    }
    let budget_end = line_start_col + screencols;
    let mut col = line_start_col;
    let mut last_boundary: Option<(usize, usize)> = None;

    for (idx, c) in text[line_start_byte..].char_indices() {
        let abs_idx = idx + line_start_byte;
        let next_col = advance_column(col, c);
        let width = next_col.saturating_sub(col);

        if width >= 2 && next_col > budget_end {
            // Wide character would straddle the margin: break before it.
            return (col, abs_idx, true);
        }
        if next_col > budget_end {
            return match last_boundary {
                Some((bcol, bbyte)) => (bcol, bbyte, true),
                None => (col, abs_idx, true),
            };
        }

        col = next_col;
        if is_separator(c) {
            last_boundary = Some((col, abs_idx + c.len_utf8()));
        }
    }

    (col, text.len(), false)
}

/// Number of screen rows required to display `text` under word-wrap with
/// `screencols` columns available. Always >= 1, even for an empty row.
pub fn count_screen_lines(text: &str, screencols: usize) -> usize {
    if text.is_empty() {
        return 1;
    }
    let mut lines = 0usize;
    let mut byte = 0usize;
    loop {
        let (_col, next_byte, more) = word_wrap_break(text, screencols, 0, byte);
        lines += 1;
        if !more {
            break;
        }
        // Guard against zero-progress loops (e.g. screencols so small no
        // char fits); always advance at least one byte.
        byte = if next_byte > byte {
            next_byte
        } else {
            text[byte..]
                .chars()
                .next()
                .map(|c| byte + c.len_utf8())
                .unwrap_or(text.len())
        };
        if byte >= text.len() {
            break;
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_entirely_no_wrap() {
        let (col, byte, more) = word_wrap_break("hi", 10, 0, 0);
        assert_eq!((col, byte, more), (2, 2, false));
    }

    #[test]
    fn breaks_at_word_boundary_spec_example() {
        let (col, byte, more) = word_wrap_break("hello world", 7, 0, 0);
        assert_eq!((col, byte, more), (6, 6, true));
        let (col2, byte2, more2) = word_wrap_break("hello world", 7, 0, byte);
        assert_eq!((col2, byte2, more2), (5, 11, false));
    }

    #[test]
    fn hard_break_when_no_boundary() {
        // 12-char token, no separators, budget of 5.
        let (col, byte, more) = word_wrap_break("abcdefghijkl", 5, 0, 0);
        assert_eq!((col, byte, more), (5, 5, true));
    }

    #[test]
    fn wide_char_forced_before_margin() {
        // "ab" + CJK char at col budget 3: 'a'=1,'b'=1 -> col2, then wide
        // char width2 would land at col4 > budget 3, so break before it.
        let text = "ab漢";
        let (col, byte, more) = word_wrap_break(text, 3, 0, 0);
        assert_eq!(col, 2);
        assert_eq!(byte, 2);
        assert!(more);
    }

    #[test]
    fn count_screen_lines_empty_is_one() {
        assert_eq!(count_screen_lines("", 80), 1);
    }

    #[test]
    fn count_screen_lines_multi_break() {
        assert_eq!(count_screen_lines("hello world", 7), 2);
    }

    #[test]
    fn idempotent_concatenation_reproduces_row() {
        let text = "the quick brown fox jumps over";
        let mut byte = 0;
        let mut rebuilt = String::new();
        loop {
            let (_col, next, more) = word_wrap_break(text, 10, 0, byte);
            rebuilt.push_str(&text[byte..next]);
            byte = next;
            if !more {
                break;
            }
        }
        assert_eq!(rebuilt, text);
    }
}
