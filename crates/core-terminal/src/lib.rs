//! Terminal backend: raw-mode/alternate-screen lifecycle, frame painting,
//! and OSC 52 clipboard writes.

use std::io::{stdout, Write};

use anyhow::Result;
use core_render::clipboard::{osc52_sequence, ClipboardSink};
use core_render::{CellFlags, Frame};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{debug, warn};

pub mod capabilities;
pub use capabilities::TerminalCapabilities;

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
}

pub struct CrosstermBackend {
    entered: bool,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self { entered: false }
    }

    /// Enter and return a guard that restores cooked mode on drop, including
    /// on an unwinding panic.
    pub fn enter_guard(&mut self) -> Result<TerminalGuard<'_>> {
        self.enter()?;
        Ok(TerminalGuard { backend: self, active: true })
    }

    /// Paint a whole [`Frame`] and position the hardware cursor. `Full`
    /// refreshes repaint every cell; `CursorOnly` (the common case between
    /// keystrokes) only moves the cursor.
    pub fn paint(&self, frame: &Frame, hint: core_render::RefreshHint) -> Result<()> {
        let mut out = stdout();
        if hint == core_render::RefreshHint::Full {
            queue!(out, Clear(ClearType::All))?;
            for y in 0..frame.height {
                queue!(out, MoveTo(0, y))?;
                for (glyph, _width, flags, _x) in frame.row_leaders(y) {
                    if flags.contains(CellFlags::REVERSE) {
                        queue!(out, SetAttribute(Attribute::Reverse), Print(glyph), SetAttribute(Attribute::Reset))?;
                    } else {
                        queue!(out, Print(glyph))?;
                    }
                }
            }
        }
        queue!(out, MoveTo(frame.cursor.0, frame.cursor.1))?;
        out.flush()?;
        Ok(())
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, Hide)?;
            self.entered = true;
            debug!(target: "terminal", "entered_raw_mode");
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            execute!(stdout(), LeaveAlternateScreen, Show)?;
            disable_raw_mode()?;
            self.entered = false;
            debug!(target: "terminal", "left_raw_mode");
        }
        Ok(())
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

/// RAII guard pairing terminal-mode entry with restoration (spec's "any
/// terminal-mode change is paired with a guaranteed restore"). Restores on
/// a normal drop *and* on an unwinding panic.
pub struct TerminalGuard<'a> {
    backend: &'a mut CrosstermBackend,
    active: bool,
}

impl<'a> Drop for TerminalGuard<'a> {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = self.backend.leave() {
                warn!(target: "terminal", error = %e, "failed_to_restore_terminal");
            }
        }
    }
}

/// Writes an OSC 52 escape directly to stdout.
pub struct TerminalClipboard;

impl ClipboardSink for TerminalClipboard {
    fn copy(&mut self, text: &str) {
        let seq = osc52_sequence(text);
        let mut out = stdout();
        let _ = out.write_all(seq.as_bytes());
        let _ = out.flush();
    }
}
