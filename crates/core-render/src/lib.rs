//! Display pipeline: turns buffer + window state into a grid of terminal
//! cells, one frame per refresh.
//!
//! `Cell` mirrors a printed glyph: most hold a single character, but a
//! control byte prints as a two-column `^X` escape, so a leader cell can
//! carry up to two characters with a blank continuation cell following it
//! to keep column accounting exact. Reverse-video (region highlight, the
//! software cursor) is a flag applied over a span of cells, not baked into
//! the glyph itself.

use bitflags::bitflags;

pub mod clipboard;
pub mod layout;
pub mod pipeline;
pub mod scroll;
pub mod status;

pub use pipeline::DisplayPipeline;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CellFlags: u8 {
        const REVERSE = 0b0000_0001;
        const CURSOR  = 0b0000_0010;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub glyph: String,
    pub width: u8,
    pub flags: CellFlags,
}

impl Cell {
    pub fn leader(glyph: impl Into<String>, width: u16, flags: CellFlags) -> Self {
        Self {
            glyph: glyph.into(),
            width: width.max(1) as u8,
            flags,
        }
    }

    pub fn continuation(flags: CellFlags) -> Self {
        Self {
            glyph: String::new(),
            width: 0,
            flags,
        }
    }

    pub fn is_leader(&self) -> bool {
        self.width > 0
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            glyph: " ".to_string(),
            width: 1,
            flags: CellFlags::empty(),
        }
    }
}

/// A full terminal-sized grid of cells, plus the reported cursor position
/// (screen row/col) for positioning the real terminal cursor after paint.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    pub cells: Vec<Cell>,
    pub cursor: (u16, u16),
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width as usize * height as usize],
            cursor: (0, 0),
        }
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    pub fn set_glyph(&mut self, x: u16, y: u16, glyph: &str, width: u16, flags: CellFlags) {
        if x >= self.width || y >= self.height {
            return;
        }
        let w = width.max(1).min(self.width - x);
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = Cell::leader(glyph, w, flags);
        }
        for dx in 1..w {
            if let Some(idx) = self.index(x + dx, y) {
                self.cells[idx] = Cell::continuation(flags);
            }
        }
    }

    pub fn apply_flags_span(&mut self, x: u16, y: u16, span_width: u16, flags: CellFlags) {
        let span = span_width.min(self.width.saturating_sub(x));
        for dx in 0..span {
            if let Some(idx) = self.index(x + dx, y) {
                self.cells[idx].flags |= flags;
            }
        }
    }

    pub fn row_leaders(&self, y: u16) -> impl Iterator<Item = (&str, u16, CellFlags, u16)> {
        let width = self.width;
        let start = y as usize * width as usize;
        let mut x = 0u16;
        std::iter::from_fn(move || {
            while x < width {
                let idx = start + x as usize;
                let cell = &self.cells[idx];
                if cell.is_leader() {
                    let w = cell.width as u16;
                    let out = (cell.glyph.as_str(), w, cell.flags, x);
                    x = x.saturating_add(w);
                    return Some(out);
                }
                x += 1;
            }
            None
        })
    }
}

/// How much of the screen a refresh needs to repaint (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshHint {
    /// Repaint everything: content, status lines, minibuffer.
    Full,
    /// Only the cursor position changed; content is already correct on
    /// screen. Still repaints the (possibly stale) minibuffer/status lines
    /// cheaply since those are tiny.
    CursorOnly,
}

impl RefreshHint {
    /// A scroll always escalates to `Full` since the whole viewport's
    /// content shifts.
    pub fn escalate_on_scroll(self, scrolled: bool) -> Self {
        if scrolled { RefreshHint::Full } else { self }
    }
}
