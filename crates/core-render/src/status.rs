//! Status line and minibuffer line composition.
//!
//! Mirrors the two-stage "segments, then string" shape: `compose_status`
//! builds an ordered, inspectable list; `format_status` renders it. Keeping
//! the two separate lets a future overlay (e.g. a register hint) slot in
//! without touching the string layout logic.

/// Everything the status line for one window needs to know.
pub struct StatusContext<'a> {
    pub display_name: &'a str,
    pub dirty: bool,
    pub read_only: bool,
    pub line_1: usize,
    pub col_1: usize,
    pub total_lines: usize,
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSegment<'a> {
    Name(&'a str),
    DirtyMarker,
    ReadOnlyMarker,
    Position { line_1: usize, col_1: usize, total: usize },
    FocusMarker,
}

pub fn compose_status<'a>(ctx: &StatusContext<'a>) -> Vec<StatusSegment<'a>> {
    let mut out = Vec::with_capacity(5);
    out.push(StatusSegment::Name(ctx.display_name));
    if ctx.dirty {
        out.push(StatusSegment::DirtyMarker);
    }
    if ctx.read_only {
        out.push(StatusSegment::ReadOnlyMarker);
    }
    out.push(StatusSegment::Position {
        line_1: ctx.line_1,
        col_1: ctx.col_1,
        total: ctx.total_lines,
    });
    if ctx.focused {
        out.push(StatusSegment::FocusMarker);
    }
    out
}

pub fn format_status(segments: &[StatusSegment<'_>]) -> String {
    use std::fmt::Write as _;
    let mut s = String::with_capacity(48);
    for seg in segments {
        match seg {
            StatusSegment::Name(name) => s.push_str(name),
            StatusSegment::DirtyMarker => s.push_str(" [+]"),
            StatusSegment::ReadOnlyMarker => s.push_str(" [RO]"),
            StatusSegment::Position { line_1, col_1, total } => {
                let _ = write!(s, "  L{line_1}/{total}  C{col_1}");
            }
            StatusSegment::FocusMarker => s.push_str("  *"),
        }
    }
    s
}

pub fn build_status(ctx: &StatusContext) -> String {
    format_status(&compose_status(ctx))
}

/// What the bottom minibuffer line shows: either a live prompt/message or
/// the transient status message left by the last command. `is_error` picks
/// the "no match" styling (red-on-default, per spec §4.6).
#[derive(Debug, Clone)]
pub struct MinibufferLine {
    pub text: String,
    pub is_error: bool,
}

impl MinibufferLine {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            is_error: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_focused_buffer_status() {
        let ctx = StatusContext {
            display_name: "main.rs",
            dirty: false,
            read_only: false,
            line_1: 3,
            col_1: 8,
            total_lines: 40,
            focused: true,
        };
        assert_eq!(build_status(&ctx), "main.rs  L3/40  C8  *");
    }

    #[test]
    fn dirty_read_only_unfocused() {
        let ctx = StatusContext {
            display_name: "README",
            dirty: true,
            read_only: true,
            line_1: 1,
            col_1: 1,
            total_lines: 1,
            focused: false,
        };
        assert_eq!(build_status(&ctx), "README [+] [RO]  L1/1  C1");
    }
}
