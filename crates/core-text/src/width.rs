//! Display-column arithmetic: ASCII printable, control-character `^X`
//! escapes, tab stops, and wide/combining Unicode via an embedded wcwidth
//! table (`unicode-width`, the crate implementing Markus Kuhn's reference
//! table).

use unicode_width::UnicodeWidthChar;

pub const TAB_STOP: usize = 8;

/// Width in display columns of a single char, *not* accounting for tab stops
/// (tabs must be resolved against the running column; see
/// [`chars_to_display_column`]).
pub fn glyph_width(c: char) -> usize {
    match c {
        '\t' => 0, // resolved by the caller against the running column
        '\u{7f}' => 2,
        c if (c as u32) < 0x20 => 2,
        c if (0x20..=0x7e).contains(&(c as u32)) => 1,
        c => UnicodeWidthChar::width(c).unwrap_or(0),
    }
}

/// The caret-notation letter for a control character (`^X`), or `None` if
/// `c` is not one of the control codes the renderer escapes (TAB is never
/// escaped).
pub fn control_caret(c: char) -> Option<char> {
    let v = c as u32;
    if c == '\u{7f}' {
        Some('?')
    } else if v < 0x20 && c != '\t' {
        Some((v ^ 0x40) as u8 as char)
    } else {
        None
    }
}

/// Advance a running display column past one char.
pub fn advance_column(col: usize, c: char) -> usize {
    if c == '\t' {
        col + (TAB_STOP - col % TAB_STOP)
    } else {
        col + glyph_width(c)
    }
}

/// Sum of display widths from byte 0 up to (but not including) `byte_pos`.
/// Monotonic non-decreasing in `byte_pos`; `chars_to_display_column(s, 0) ==
/// 0` always.
pub fn chars_to_display_column(text: &str, byte_pos: usize) -> usize {
    let mut col = 0usize;
    for (idx, c) in text.char_indices() {
        if idx >= byte_pos {
            break;
        }
        col = advance_column(col, c);
    }
    col
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_printable_is_one_column() {
        assert_eq!(chars_to_display_column("hello", 5), 5);
    }

    #[test]
    fn zero_at_start() {
        assert_eq!(chars_to_display_column("anything", 0), 0);
    }

    #[test]
    fn control_char_is_two_columns() {
        assert_eq!(chars_to_display_column("\u{1}x", 1), 2);
        assert_eq!(control_caret('\u{1}'), Some('A'));
        assert_eq!(control_caret('\u{7f}'), Some('?'));
        assert_eq!(control_caret('\t'), None);
    }

    #[test]
    fn tab_advances_to_next_stop() {
        assert_eq!(chars_to_display_column("\t", 1), 8);
        assert_eq!(chars_to_display_column("a\t", 2), 8);
        assert_eq!(chars_to_display_column("ab\t", 3), 8);
        assert_eq!(chars_to_display_column("aaaaaaaa\t", 9), 16);
    }

    #[test]
    fn wide_cjk_is_two_columns() {
        // "漢" is a CJK ideograph, width 2.
        let s = "漢字";
        let first_end = '漢'.len_utf8();
        assert_eq!(chars_to_display_column(s, first_end), 2);
        assert_eq!(chars_to_display_column(s, s.len()), 4);
    }

    #[test]
    fn combining_mark_is_zero_width() {
        // 'e' + combining acute accent (U+0301).
        let s = "e\u{301}x";
        let after_combining = 'e'.len_utf8() + '\u{301}'.len_utf8();
        assert_eq!(chars_to_display_column(s, after_combining), 1);
    }

    #[test]
    fn monotonic_non_decreasing() {
        let s = "a\tbc漢d";
        let mut last = 0;
        for (idx, _) in s.char_indices() {
            let col = chars_to_display_column(s, idx);
            assert!(col >= last);
            last = col;
        }
    }
}
