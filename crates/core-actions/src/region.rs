//! Region-wide kill/copy commands, built on the buffer's mark/point region
//! the same way `editing::kill_line` builds on a computed end position.

use core_state::{Buffer, DeleteDirection, EditorError, KillRing, RegionShape};
use core_text::Position;

/// Cut the region to the kill ring and clear the mark. A no-op (not an
/// error) when no mark is set. Branches on the region's shape: an ordinary
/// stream region deletes one contiguous span, a rectangle deletes the same
/// column range from every row it spans.
pub fn kill_region(buffer: &mut Buffer, kill_ring: &mut KillRing) -> Result<(), EditorError> {
    let Some(region) = buffer.region() else { return Ok(()) };
    if region.is_empty() {
        buffer.clear_mark();
        return Ok(());
    }
    match region.shape {
        RegionShape::Stream => {
            let removed = buffer.delete_span(region.start, region.end, DeleteDirection::Forward)?;
            let text = String::from_utf8(removed).expect("deleted span is valid UTF-8");
            kill_ring.push(text);
        }
        RegionShape::Rectangle => {
            let spans = rectangle_spans(buffer, region.start, region.end);
            let mark = buffer.undo_mark();
            let mut rows = Vec::with_capacity(spans.len());
            for &(row, start_byte, end_byte) in &spans {
                if start_byte < end_byte {
                    let removed =
                        buffer.delete_span(Position::new(row, start_byte), Position::new(row, end_byte), DeleteDirection::Forward)?;
                    rows.push(String::from_utf8(removed).expect("deleted span is valid UTF-8"));
                } else {
                    rows.push(String::new());
                }
            }
            buffer.pair_undo_since(mark);
            kill_ring.push(rows.join("\n"));
        }
    }
    buffer.set_cursor(region.start);
    buffer.clear_mark();
    Ok(())
}

/// Copy the region to the kill ring without touching the buffer, clearing
/// the mark (Emacs' `kill-ring-save`).
pub fn copy_region(buffer: &mut Buffer, kill_ring: &mut KillRing) -> Option<String> {
    let region = buffer.region()?;
    if region.is_empty() {
        buffer.clear_mark();
        return None;
    }
    let text = match region.shape {
        RegionShape::Stream => rows_between(buffer, region.start, region.end),
        RegionShape::Rectangle => rectangle_between(buffer, region.start, region.end),
    };
    kill_ring.push(text.clone());
    buffer.clear_mark();
    Some(text)
}

/// Per-row `(row, start_byte, end_byte)` spans a rectangular region covers,
/// with each row's span clamped to that row's own length (a short row inside
/// the rectangle contributes a shorter, possibly empty, slice).
fn rectangle_spans(buffer: &Buffer, start: Position, end: Position) -> Vec<(usize, usize, usize)> {
    let (lo, hi) = if start.byte <= end.byte { (start.byte, end.byte) } else { (end.byte, start.byte) };
    (start.row..=end.row)
        .map(|row| {
            let len = buffer.row(row).map(|r| r.len()).unwrap_or(0);
            (row, lo.min(len), hi.min(len))
        })
        .collect()
}

fn rectangle_between(buffer: &Buffer, start: Position, end: Position) -> String {
    rectangle_spans(buffer, start, end)
        .into_iter()
        .map(|(row, s, e)| buffer.row(row).map(|r| r.as_str()[s..e].to_string()).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n")
}

fn rows_between(buffer: &Buffer, start: core_text::Position, end: core_text::Position) -> String {
    if start.row == end.row {
        return buffer
            .row(start.row)
            .map(|r| r.as_str()[start.byte..end.byte].to_string())
            .unwrap_or_default();
    }
    let mut out = String::new();
    for row in start.row..=end.row {
        let text = buffer.row(row).map(|r| r.as_str()).unwrap_or("");
        if row == start.row {
            out.push_str(&text[start.byte..]);
            out.push('\n');
        } else if row == end.row {
            out.push_str(&text[..end.byte]);
        } else {
            out.push_str(text);
            out.push('\n');
        }
    }
    out
}
