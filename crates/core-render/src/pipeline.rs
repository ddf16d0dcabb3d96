//! Assembles one full terminal [`Frame`]: every window's content and
//! status line, stacked top to bottom, with the minibuffer line last.

use core_model::EditorState;
use core_state::Buffer;
use core_text::Position;

use crate::layout::{render_row_no_wrap, render_row_wrapped, HighlightSpan};
use crate::scroll::adjust_scroll;
use crate::status::{build_status, MinibufferLine, StatusContext};
use crate::{CellFlags, Frame, RefreshHint};

#[derive(Default)]
pub struct DisplayPipeline;

impl DisplayPipeline {
    pub fn new() -> Self {
        Self
    }

    /// Render the whole screen. `scroll_margin` comes from config. Returns
    /// the frame plus the effective refresh hint (a scroll always escalates
    /// an incoming `CursorOnly` request to `Full`).
    pub fn render(
        &self,
        state: &mut EditorState,
        screencols: u16,
        total_rows: u16,
        minibuffer: &MinibufferLine,
        scroll_margin: u16,
        hint: RefreshHint,
    ) -> (Frame, RefreshHint) {
        let mut frame = Frame::new(screencols, total_rows + 1);
        let mut any_scrolled = false;
        let window_ids: Vec<_> = state.windows.windows_top_to_bottom().map(|(id, _)| id).collect();
        let focused_id = state.windows.focused_id();

        for id in window_ids {
            let buffer_id = state.windows.get(id).unwrap().buffer;
            let Some(buffer) = state.buffers.get(buffer_id) else { continue };
            let content_rows = state.windows.get(id).unwrap().height.saturating_sub(1);
            let screen_top = state.windows.get(id).unwrap().screen_top;

            // The focused window's point lives on the buffer; every other
            // window showing that buffer keeps its own, independently (spec
            // §3: split windows on one buffer do not share a cursor).
            let cursor = if id == focused_id { buffer.cursor() } else { state.windows.get(id).unwrap().cursor };

            let win = state.windows.get_mut(id).unwrap();
            let scrolled = adjust_scroll(win, buffer, cursor, screencols, content_rows, scroll_margin);
            any_scrolled |= scrolled;
            let (rowoff, coloff) = (win.rowoff, win.coloff);

            render_window_content(&mut frame, buffer, screen_top, content_rows, screencols, rowoff, coloff);

            let status_y = screen_top + content_rows;
            let cursor_disp =
                core_text::chars_to_display_column(buffer.row(cursor.row).map(|r| r.as_str()).unwrap_or(""), cursor.byte);
            let ctx = StatusContext {
                display_name: buffer.display_name(),
                dirty: buffer.is_dirty(),
                read_only: buffer.read_only(),
                line_1: cursor.row + 1,
                col_1: cursor_disp + 1,
                total_lines: buffer.line_count(),
                focused: id == focused_id,
            };
            let status_text = build_status(&ctx);
            let mut x = 0u16;
            for c in status_text.chars() {
                if x >= screencols {
                    break;
                }
                frame.set_glyph(x, status_y, &c.to_string(), 1, CellFlags::REVERSE);
                x += 1;
            }
            frame.apply_flags_span(x, status_y, screencols.saturating_sub(x), CellFlags::REVERSE);

            if id == focused_id {
                let cursor_y = screen_top + cursor_screen_row(buffer, cursor, rowoff, content_rows, screencols);
                let cursor_x = if buffer.word_wrap() {
                    cursor_wrapped_col(buffer, cursor, screencols)
                } else {
                    (cursor_disp.saturating_sub(coloff)) as u16
                };
                frame.cursor = (cursor_x, cursor_y);
            }
        }

        let minibuffer_y = total_rows;
        let flags = if minibuffer.is_error { CellFlags::REVERSE } else { CellFlags::empty() };
        let mut x = 0u16;
        for c in minibuffer.text.chars() {
            if x >= screencols {
                break;
            }
            frame.set_glyph(x, minibuffer_y, &c.to_string(), 1, flags);
            x += 1;
        }

        let effective = hint.escalate_on_scroll(any_scrolled);
        (frame, effective)
    }
}

fn render_window_content(
    frame: &mut Frame,
    buffer: &Buffer,
    screen_top: u16,
    content_rows: u16,
    screencols: u16,
    rowoff: usize,
    coloff: usize,
) {
    let mut y = 0u16;
    let mut row_idx = rowoff;
    while y < content_rows {
        let Some(row) = buffer.row(row_idx) else { break };
        let text = row.as_str();
        let highlight = region_highlight_for_row(buffer, row_idx);
        if buffer.word_wrap() {
            let used = render_row_wrapped(frame, screen_top + y, text, screencols, content_rows - y, highlight);
            y += used.max(1);
        } else {
            render_row_no_wrap(frame, screen_top + y, text, coloff, screencols, highlight);
            y += 1;
        }
        row_idx += 1;
    }
}

fn region_highlight_for_row(buffer: &Buffer, row: usize) -> Option<HighlightSpan> {
    let region = buffer.region()?;
    if row < region.start.row || row > region.end.row {
        return None;
    }
    let row_len = buffer.row(row).map(|r| r.len()).unwrap_or(0);
    let start = if row == region.start.row { region.start.byte } else { 0 };
    let end = if row == region.end.row { region.end.byte } else { row_len };
    Some(HighlightSpan { start_byte: start, end_byte: end })
}

fn cursor_screen_row(buffer: &Buffer, cursor: Position, rowoff: usize, content_rows: u16, screencols: u16) -> u16 {
    let cursor_row = cursor.row;
    if !buffer.word_wrap() {
        return (cursor_row.saturating_sub(rowoff)) as u16;
    }
    let mut y = 0u16;
    for r in rowoff..cursor_row {
        let text = buffer.row(r).map(|row| row.as_str()).unwrap_or("");
        y += core_text::count_screen_lines(text, screencols as usize) as u16;
        if y >= content_rows {
            return content_rows.saturating_sub(1);
        }
    }
    let cursor_text = buffer.row(cursor_row).map(|row| row.as_str()).unwrap_or("");
    let prefix_lines = core_text::count_screen_lines(&cursor_text[..cursor.byte.min(cursor_text.len())], screencols as usize);
    y + (prefix_lines.saturating_sub(1)) as u16
}

fn cursor_wrapped_col(buffer: &Buffer, cursor: Position, screencols: usize) -> u16 {
    let text = buffer.row(cursor.row).map(|r| r.as_str()).unwrap_or("");
    let mut byte = 0usize;
    loop {
        let (_col, next, more) = core_text::word_wrap_break(text, screencols, 0, byte);
        if cursor.byte <= next {
            let seg = &text[byte..cursor.byte.min(text.len())];
            return core_text::chars_to_display_column(seg, seg.len()) as u16;
        }
        if !more {
            break;
        }
        byte = next;
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::Config;
    use core_state::Buffer;

    fn state() -> EditorState {
        let mut buf = Buffer::new("scratch");
        buf.insert_at(Position::new(0, 0), b"hello world").unwrap();
        EditorState::new(buf, 9, Config::default())
    }

    #[test]
    fn renders_single_window_with_status_and_minibuffer() {
        let mut st = state();
        let pipeline = DisplayPipeline::new();
        let (frame, hint) = pipeline.render(&mut st, 80, 10, &MinibufferLine::empty(), 0, RefreshHint::Full);
        assert_eq!(frame.height, 11);
        assert_eq!(hint, RefreshHint::Full);
        let content: Vec<&str> = frame.row_leaders(0).map(|(g, _, _, _)| g).collect();
        assert_eq!(content.join(""), "hello world");
    }

    #[test]
    fn cursor_only_hint_escalates_when_scroll_happens() {
        let mut st = state();
        st.focused_buffer_mut().set_cursor(Position::new(0, 0));
        let pipeline = DisplayPipeline::new();
        let (_frame, hint) = pipeline.render(&mut st, 80, 10, &MinibufferLine::empty(), 0, RefreshHint::CursorOnly);
        assert_eq!(hint, RefreshHint::CursorOnly);
    }

    #[test]
    fn split_windows_on_same_buffer_keep_independent_cursors() {
        let mut st = state();
        st.focused_buffer_mut().insert_at(Position::new(0, 11), b"\nsecond line").unwrap();
        st.focused_buffer_mut().set_cursor(Position::new(0, 0));
        st.sync_cursor_out();
        st.windows.split(9);
        st.focused_buffer_mut().set_cursor(Position::new(1, 3));

        let pipeline = DisplayPipeline::new();
        let (_frame, _) = pipeline.render(&mut st, 80, 9, &MinibufferLine::empty(), 0, RefreshHint::Full);

        // The unfocused (top) window's cursor field must still read (0, 0),
        // unaffected by the focused window's cursor moving to row 1.
        let top_id = st.windows.windows_top_to_bottom().next().unwrap().0;
        assert_eq!(st.windows.get(top_id).unwrap().cursor, Position::new(0, 0));
    }

    #[test]
    fn minibuffer_line_renders_message() {
        let mut st = state();
        let pipeline = DisplayPipeline::new();
        let msg = MinibufferLine { text: "no match".into(), is_error: true };
        let (frame, _) = pipeline.render(&mut st, 80, 10, &msg, 0, RefreshHint::Full);
        let bottom: Vec<&str> = frame.row_leaders(10).map(|(g, _, _, _)| g).collect();
        assert_eq!(bottom.join(""), "no match");
    }
}
