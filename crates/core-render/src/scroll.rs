//! Keeping the cursor inside the visible viewport: vertical auto-scroll
//! with a configurable margin, and horizontal scroll when word wrap is off.
//!
//! Word-wrap windows scroll by whole logical rows only — a wrapped row's
//! continuation lines always render in full from its first screen line,
//! rather than tracking a sub-row scroll offset.

use core_model::Window;
use core_state::Buffer;
use core_text::{chars_to_display_column, Position};

/// Recompute `window.rowoff`/`window.coloff` so `cursor` stays visible,
/// returning `true` if either offset changed (a scroll happened). `cursor`
/// is the window's own point — the live buffer cursor only while this
/// window is focused, its last-saved one otherwise (spec §3: split windows
/// sharing a buffer keep independent points).
pub fn adjust_scroll(window: &mut Window, buffer: &Buffer, cursor: Position, screencols: u16, text_rows: u16, margin: u16) -> bool {
    let prev_rowoff = window.rowoff;
    let prev_coloff = window.coloff;

    let margin = margin.min(text_rows.saturating_sub(1) / 2) as usize;
    let text_rows = text_rows as usize;

    if cursor.row < window.rowoff + margin {
        window.rowoff = cursor.row.saturating_sub(margin);
    }
    if text_rows > 0 && cursor.row + margin >= window.rowoff + text_rows {
        window.rowoff = cursor.row + margin + 1 - text_rows;
    }

    if !buffer.word_wrap() {
        let row_text = buffer.row(cursor.row).map(|r| r.as_str()).unwrap_or("");
        let col = chars_to_display_column(row_text, cursor.byte);
        let screencols = screencols as usize;
        if col < window.coloff {
            window.coloff = col;
        }
        if screencols > 0 && col >= window.coloff + screencols {
            window.coloff = col + 1 - screencols;
        }
    } else {
        window.coloff = 0;
    }

    window.rowoff != prev_rowoff || window.coloff != prev_coloff
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::{BufferArena, WindowManager};
    use core_state::Buffer;
    use core_text::Position;

    fn window_and_buffer() -> (Window, Buffer) {
        let mut buffers = BufferArena::new();
        let mut buf = Buffer::new("scratch");
        for i in 0..50 {
            buf.insert_at(Position::new(buf.line_count() - 1, 0), format!("line{i}\n").as_bytes())
                .unwrap();
        }
        let id = buffers.insert(Buffer::new("placeholder"));
        let wm = WindowManager::new(id, 10);
        (wm.focused().clone(), buf)
    }

    #[test]
    fn scrolls_down_to_keep_cursor_visible() {
        let (mut win, mut buf) = window_and_buffer();
        buf.set_cursor(Position::new(30, 0));
        let scrolled = adjust_scroll(&mut win, &buf, buf.cursor(), 80, 10, 2);
        assert!(scrolled);
        assert!(buf.cursor().row >= win.rowoff);
        assert!(buf.cursor().row < win.rowoff + 10);
    }

    #[test]
    fn no_scroll_when_cursor_already_visible() {
        let (mut win, mut buf) = window_and_buffer();
        buf.set_cursor(Position::new(3, 0));
        let scrolled = adjust_scroll(&mut win, &buf, buf.cursor(), 80, 10, 0);
        assert!(!scrolled);
        assert_eq!(win.rowoff, 0);
    }

    #[test]
    fn horizontal_scroll_tracks_cursor_column() {
        let (mut win, mut buf) = window_and_buffer();
        buf.set_word_wrap(false);
        buf.set_cursor(Position::new(0, 4));
        let long_line = "x".repeat(40);
        buf.insert_at(Position::new(0, 0), long_line.as_bytes()).unwrap();
        buf.set_cursor(Position::new(0, 40));
        adjust_scroll(&mut win, &buf, buf.cursor(), 10, 10, 0);
        assert!(win.coloff > 0);
    }

    #[test]
    fn scrolls_to_the_windows_own_cursor_not_the_buffers() {
        let (mut win, mut buf) = window_and_buffer();
        buf.set_cursor(Position::new(0, 0));
        let other_point = Position::new(30, 0);
        let scrolled = adjust_scroll(&mut win, &buf, other_point, 80, 10, 2);
        assert!(scrolled);
        assert!(other_point.row >= win.rowoff);
        assert!(other_point.row < win.rowoff + 10);
    }
}
