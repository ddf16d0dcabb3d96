//! Terminal capability probing.
//!
//! A small, cheap-to-compute set of flags the caller can consult before
//! attempting optional features; nothing here blocks on a timed probe.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct TerminalCapabilities {
    pub supports_osc52: bool,
}

impl TerminalCapabilities {
    /// Assume OSC 52 support unless `TERM` says otherwise. A handful of
    /// terminals (notably plain `linux` console) never implement it.
    pub fn detect() -> Self {
        let term = std::env::var("TERM").unwrap_or_default();
        Self {
            supports_osc52: term != "linux",
        }
    }
}
