//! Per-row rendering: turns one logical buffer row into one or more screen
//! lines of [`Cell`]s, honoring tab stops, control-character escapes, word
//! wrap, and highlight spans (region / search match).

use core_text::{chars_to_display_column, control_caret, word_wrap_break};

use crate::{Cell, CellFlags, Frame};

/// A byte range on a single logical row that should be drawn reverse-video.
#[derive(Debug, Clone, Copy)]
pub struct HighlightSpan {
    pub start_byte: usize,
    pub end_byte: usize,
}

impl HighlightSpan {
    fn covers(&self, byte: usize) -> bool {
        byte >= self.start_byte && byte < self.end_byte
    }
}

fn push_char_cell(frame: &mut Frame, x: &mut u16, y: u16, screencols: u16, c: char, flags: CellFlags) {
    if *x >= screencols {
        return;
    }
    if let Some(escaped) = control_caret(c) {
        let glyph = format!("^{escaped}");
        frame.set_glyph(*x, y, &glyph, 2, flags);
        *x += 2;
    } else if c == '\t' {
        // Tabs are expanded to spaces up to the next stop by the caller,
        // which pre-computes column math; here we just render a space.
        frame.set_glyph(*x, y, " ", 1, flags);
        *x += 1;
    } else {
        let w = core_text::glyph_width(c).max(1) as u16;
        frame.set_glyph(*x, y, &c.to_string(), w, flags);
        *x += w;
    }
}

/// Render `text` starting at byte `line_start_byte` into screen row `y`,
/// no-wrap mode: a single screen line, scrolled horizontally by `coloff`
/// display columns.
pub fn render_row_no_wrap(
    frame: &mut Frame,
    y: u16,
    text: &str,
    coloff: usize,
    screencols: u16,
    highlight: Option<HighlightSpan>,
) {
    let mut x = 0u16;
    for (byte_idx, c) in text.char_indices() {
        let col = chars_to_display_column(text, byte_idx);
        if col < coloff {
            continue;
        }
        if (col - coloff) as u16 >= screencols {
            break;
        }
        let flags = if highlight.is_some_and(|h| h.covers(byte_idx)) {
            CellFlags::REVERSE
        } else {
            CellFlags::empty()
        };
        let target_x = (col - coloff) as u16;
        if target_x != x {
            // Tab landed past where a single-column advance would put us;
            // pad with blanks up to the stop (cells default to spaces).
            x = target_x;
        }
        push_char_cell(frame, &mut x, y, screencols, c, flags);
    }
}

/// Render `text` under word wrap starting at screen row `first_y`, using as
/// many consecutive rows as needed (bounded by `max_rows`). Returns the
/// number of screen rows consumed.
pub fn render_row_wrapped(
    frame: &mut Frame,
    first_y: u16,
    text: &str,
    screencols: u16,
    max_rows: u16,
    highlight: Option<HighlightSpan>,
) -> u16 {
    let mut rows_used = 0u16;
    let mut byte = 0usize;
    loop {
        if rows_used >= max_rows {
            break;
        }
        let y = first_y + rows_used;
        let (_col, next_byte, more) = word_wrap_break(text, screencols as usize, 0, byte);
        let mut x = 0u16;
        for (idx, c) in text[byte..next_byte].char_indices() {
            let abs = idx + byte;
            let flags = if highlight.is_some_and(|h| h.covers(abs)) {
                CellFlags::REVERSE
            } else {
                CellFlags::empty()
            };
            push_char_cell(frame, &mut x, y, screencols, c, flags);
        }
        rows_used += 1;
        if !more {
            break;
        }
        byte = next_byte;
    }
    rows_used
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_plain_text() {
        let mut frame = Frame::new(10, 1);
        render_row_no_wrap(&mut frame, 0, "hi", 0, 10, None);
        let clusters: Vec<&str> = frame.row_leaders(0).map(|(g, _, _, _)| g).collect();
        assert_eq!(clusters, vec!["h", "i"]);
    }

    #[test]
    fn control_char_renders_caret_escape() {
        let mut frame = Frame::new(10, 1);
        render_row_no_wrap(&mut frame, 0, "\u{1}", 0, 10, None);
        let clusters: Vec<&str> = frame.row_leaders(0).map(|(g, _, _, _)| g).collect();
        assert_eq!(clusters, vec!["^A"]);
    }

    #[test]
    fn highlight_span_sets_reverse_flag() {
        let mut frame = Frame::new(10, 1);
        render_row_no_wrap(&mut frame, 0, "abc", 0, 10, Some(HighlightSpan { start_byte: 1, end_byte: 2 }));
        let flags: Vec<CellFlags> = frame.row_leaders(0).map(|(_, _, f, _)| f).collect();
        assert_eq!(flags[0], CellFlags::empty());
        assert_eq!(flags[1], CellFlags::REVERSE);
        assert_eq!(flags[2], CellFlags::empty());
    }

    #[test]
    fn horizontal_scroll_skips_leading_columns() {
        let mut frame = Frame::new(10, 1);
        render_row_no_wrap(&mut frame, 0, "hello world", 6, 10, None);
        let clusters: Vec<&str> = frame.row_leaders(0).map(|(g, _, _, _)| g).collect();
        assert_eq!(clusters, vec!["w", "o", "r", "l", "d"]);
    }

    #[test]
    fn word_wrap_consumes_multiple_rows() {
        let mut frame = Frame::new(7, 3);
        let used = render_row_wrapped(&mut frame, 0, "hello world", 7, 3, None);
        assert_eq!(used, 2);
        let line0: Vec<&str> = frame.row_leaders(0).map(|(g, _, _, _)| g).collect();
        assert_eq!(line0.join(""), "hello ");
        let line1: Vec<&str> = frame.row_leaders(1).map(|(g, _, _, _)| g).collect();
        assert_eq!(line1.join(""), "world");
    }
}
