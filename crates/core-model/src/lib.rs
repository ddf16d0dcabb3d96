//! Editor-wide model: an arena of buffers, an arena of windows stacked
//! into the visible layout, and the `EditorState` that ties them together
//! with the kill ring, registers, and configuration.
//!
//! Buffers and windows are addressed by stable, generation-free indices
//! (`BufferId`/`WindowId`) into plain `Vec<Option<T>>` arenas rather than
//! an intrusive linked list, so a destroyed window or killed buffer leaves
//! every other id valid.

use core_config::Config;
use core_state::{Buffer, KillRing, Registers};
use core_text::Position;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(usize);

/// `Vec<Option<T>>`-backed arena with stable indices; a freed slot is
/// reused by the next `alloc`.
#[derive(Debug, Default)]
struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
}

impl<T> Arena<T> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    fn alloc(&mut self, value: T) -> usize {
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(value);
            idx
        } else {
            self.slots.push(Some(value));
            self.slots.len() - 1
        }
    }

    fn get(&self, idx: usize) -> Option<&T> {
        self.slots.get(idx).and_then(|s| s.as_ref())
    }

    fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.slots.get_mut(idx).and_then(|s| s.as_mut())
    }

    fn remove(&mut self, idx: usize) -> Option<T> {
        let val = self.slots.get_mut(idx).and_then(|s| s.take());
        if val.is_some() {
            self.free.push(idx);
        }
        val
    }

    fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (i, v)))
    }
}

/// The arena of open buffers.
#[derive(Debug, Default)]
pub struct BufferArena {
    arena: Arena<Buffer>,
}

impl BufferArena {
    pub fn new() -> Self {
        Self { arena: Arena::new() }
    }

    pub fn insert(&mut self, buffer: Buffer) -> BufferId {
        BufferId(self.arena.alloc(buffer))
    }

    pub fn get(&self, id: BufferId) -> Option<&Buffer> {
        self.arena.get(id.0)
    }

    pub fn get_mut(&mut self, id: BufferId) -> Option<&mut Buffer> {
        self.arena.get_mut(id.0)
    }

    pub fn remove(&mut self, id: BufferId) -> Option<Buffer> {
        self.arena.remove(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BufferId, &Buffer)> {
        self.arena.iter().map(|(i, b)| (BufferId(i), b))
    }

    pub fn find_by_display_name(&self, name: &str) -> Option<BufferId> {
        self.iter().find(|(_, b)| b.display_name() == name).map(|(id, _)| id)
    }
}

/// One visible pane: a buffer plus its own cursor-independent viewport
/// state. The buffer owns the "live" cursor while its window is focused;
/// an unfocused window keeps its own last-known cursor here, since two
/// windows can show the same buffer with independent points (spec §3).
#[derive(Debug, Clone)]
pub struct Window {
    pub buffer: BufferId,
    /// This window's own notion of point, authoritative while unfocused.
    /// `EditorState::sync_cursor_out`/`sync_cursor_in` keep it in step with
    /// the buffer's live cursor across focus changes.
    pub cursor: Position,
    /// Topmost visible row index within the buffer.
    pub rowoff: usize,
    /// Leftmost visible display column (horizontal scroll, no-wrap mode).
    pub coloff: usize,
    /// Screen row this window's first line is drawn at.
    pub screen_top: u16,
    /// Total screen rows occupied, including this window's own status line
    /// (always its last row). Content gets `height - 1` rows.
    pub height: u16,
}

impl Window {
    fn new(buffer: BufferId) -> Self {
        Self {
            buffer,
            cursor: Position::default(),
            rowoff: 0,
            coloff: 0,
            screen_top: 0,
            height: 0,
        }
    }
}

/// Manages the set of visible windows and their stacked layout. Windows are
/// always stacked top to bottom across the full terminal width; splitting
/// divides the focused window's rows in half.
#[derive(Debug)]
pub struct WindowManager {
    arena: Arena<Window>,
    /// Top-to-bottom stacking order.
    order: Vec<WindowId>,
    focused: WindowId,
}

impl WindowManager {
    /// Start with a single window showing `buffer`, occupying the whole
    /// `total_rows`-tall text area.
    pub fn new(buffer: BufferId, total_rows: u16) -> Self {
        let mut arena = Arena::new();
        let mut win = Window::new(buffer);
        win.height = total_rows;
        let id = WindowId(arena.alloc(win));
        Self {
            arena,
            order: vec![id],
            focused: id,
        }
    }

    pub fn focused_id(&self) -> WindowId {
        self.focused
    }

    pub fn focused(&self) -> &Window {
        self.arena.get(self.focused.0).expect("focused window always valid")
    }

    pub fn focused_mut(&mut self) -> &mut Window {
        self.arena.get_mut(self.focused.0).expect("focused window always valid")
    }

    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.arena.get(id.0)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.arena.get_mut(id.0)
    }

    pub fn windows_top_to_bottom(&self) -> impl Iterator<Item = (WindowId, &Window)> {
        self.order.iter().map(|id| (*id, self.arena.get(id.0).expect("listed window valid")))
    }

    pub fn count(&self) -> usize {
        self.order.len()
    }

    /// Move focus to the next window in stacking order, wrapping around.
    pub fn focus_next(&mut self) {
        let pos = self.order.iter().position(|&id| id == self.focused).unwrap_or(0);
        let next = (pos + 1) % self.order.len();
        self.focused = self.order[next];
        trace!(target: "model.window", window = self.focused.0, "focus_next");
    }

    /// Split the focused window in two, stacking the new one directly below
    /// it and showing the same buffer. Returns the new window's id, which
    /// becomes focused.
    pub fn split(&mut self, total_rows_hint: u16) -> WindowId {
        let focused_pos = self.order.iter().position(|&id| id == self.focused).unwrap();
        let buffer = self.focused().buffer;
        let cursor = self.focused().cursor;
        let old_height = self.focused().height;
        let top_half = (old_height / 2).max(1);
        let bottom_half = old_height.saturating_sub(top_half).max(1);

        self.focused_mut().height = top_half;

        let mut new_win = Window::new(buffer);
        new_win.cursor = cursor;
        new_win.height = bottom_half;
        let new_id = WindowId(self.arena.alloc(new_win));
        self.order.insert(focused_pos + 1, new_id);
        self.relayout(total_rows_hint);
        self.focused = new_id;
        trace!(target: "model.window", window = new_id.0, count = self.order.len(), "split");
        new_id
    }

    /// Destroy the focused window. No-op if it is the only one left (spec
    /// invariant: at least one window always exists).
    pub fn destroy_focused(&mut self, total_rows_hint: u16) {
        if self.order.len() <= 1 {
            return;
        }
        let pos = self.order.iter().position(|&id| id == self.focused).unwrap();
        let removed = self.order.remove(pos);
        self.arena.remove(removed.0);
        let new_pos = pos.min(self.order.len() - 1);
        self.focused = self.order[new_pos];
        self.relayout(total_rows_hint);
        trace!(target: "model.window", count = self.order.len(), "destroy_focused");
    }

    /// Collapse to just the focused window.
    pub fn destroy_others(&mut self, total_rows_hint: u16) {
        let keep = self.focused;
        for &id in &self.order {
            if id != keep {
                self.arena.remove(id.0);
            }
        }
        self.order = vec![keep];
        self.relayout(total_rows_hint);
        trace!(target: "model.window", "destroy_others");
    }

    /// Recompute every window's height for a new total row count (terminal
    /// resize, or resume from `SIGCONT` after suspend).
    pub fn resize(&mut self, total_rows: u16) {
        self.relayout(total_rows);
        trace!(target: "model.window", total_rows, "resize");
    }

    /// Find the window currently showing `buffer`, if any.
    pub fn find_buffer_window(&self, buffer: BufferId) -> Option<WindowId> {
        self.order
            .iter()
            .find(|&&id| self.arena.get(id.0).map(|w| w.buffer) == Some(buffer))
            .copied()
    }

    /// Recompute `screen_top`/`height` for an even vertical split across
    /// `total_rows`.
    fn relayout(&mut self, total_rows: u16) {
        let n = self.order.len() as u16;
        if n == 0 {
            return;
        }
        let base = total_rows / n;
        let extra = total_rows % n;
        let mut top = 0u16;
        for (i, &id) in self.order.clone().iter().enumerate() {
            let height = base + if (i as u16) < extra { 1 } else { 0 };
            let win = self.arena.get_mut(id.0).expect("listed window valid");
            win.screen_top = top;
            win.height = height;
            top += height;
        }
    }
}

/// Whole-editor state: every open buffer, the window layout, the
/// minibuffer, and the shared kill ring / registers.
pub struct EditorState {
    pub buffers: BufferArena,
    pub windows: WindowManager,
    pub minibuffer: Buffer,
    pub kill_ring: KillRing,
    pub registers: Registers,
    pub config: Config,
}

impl EditorState {
    pub fn new(initial_buffer: Buffer, total_rows: u16, config: Config) -> Self {
        let mut buffers = BufferArena::new();
        let id = buffers.insert(initial_buffer);
        let windows = WindowManager::new(id, total_rows);
        Self {
            buffers,
            windows,
            minibuffer: Buffer::single_line("*minibuffer*"),
            kill_ring: KillRing::new(),
            registers: Registers::new(),
            config,
        }
    }

    pub fn focused_buffer(&self) -> &Buffer {
        self.buffers.get(self.windows.focused().buffer).expect("focused window's buffer always present")
    }

    pub fn focused_buffer_mut(&mut self) -> &mut Buffer {
        let id = self.windows.focused().buffer;
        self.buffers.get_mut(id).expect("focused window's buffer always present")
    }

    /// Snapshot the live buffer cursor into the (about to be unfocused)
    /// window. Call before changing which window is focused.
    pub fn sync_cursor_out(&mut self) {
        let cursor = self.focused_buffer().cursor();
        self.windows.focused_mut().cursor = cursor;
    }

    /// Load the now-focused window's saved cursor back into its buffer's
    /// live cursor. Call after changing which window is focused.
    pub fn sync_cursor_in(&mut self) {
        let cursor = self.windows.focused().cursor;
        self.focused_buffer_mut().set_cursor(cursor);
    }

    /// Point the focused window at a different buffer, carrying over that
    /// buffer's own cursor rather than leaving the old one in place.
    pub fn set_focused_buffer(&mut self, id: BufferId) {
        let cursor = self.buffers.get(id).map(|b| b.cursor()).unwrap_or_default();
        let win = self.windows.focused_mut();
        win.buffer = id;
        win.cursor = cursor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::Buffer;

    fn state() -> EditorState {
        EditorState::new(Buffer::new("scratch"), 40, Config::default())
    }

    #[test]
    fn single_window_covers_total_rows() {
        let st = state();
        assert_eq!(st.windows.count(), 1);
        assert_eq!(st.windows.focused().height, 40);
    }

    #[test]
    fn split_creates_second_window_and_focuses_it() {
        let mut st = state();
        let original = st.windows.focused_id();
        let new_id = st.windows.split(40);
        assert_eq!(st.windows.count(), 2);
        assert_eq!(st.windows.focused_id(), new_id);
        assert_ne!(new_id, original);
        let total_height: u16 = st.windows.windows_top_to_bottom().map(|(_, w)| w.height).sum();
        assert_eq!(total_height, 40);
    }

    #[test]
    fn destroy_focused_refuses_to_close_last_window() {
        let mut st = state();
        st.windows.destroy_focused(40);
        assert_eq!(st.windows.count(), 1);
    }

    #[test]
    fn destroy_focused_returns_to_single_window() {
        let mut st = state();
        st.windows.split(40);
        st.windows.destroy_focused(40);
        assert_eq!(st.windows.count(), 1);
    }

    #[test]
    fn destroy_others_collapses_to_one() {
        let mut st = state();
        st.windows.split(40);
        st.windows.split(40);
        assert_eq!(st.windows.count(), 3);
        st.windows.destroy_others(40);
        assert_eq!(st.windows.count(), 1);
    }

    #[test]
    fn focus_next_wraps_around() {
        let mut st = state();
        let first = st.windows.focused_id();
        st.windows.split(40);
        let second = st.windows.focused_id();
        st.windows.focus_next();
        assert_eq!(st.windows.focused_id(), first);
        st.windows.focus_next();
        assert_eq!(st.windows.focused_id(), second);
    }

    #[test]
    fn resize_redistributes_rows_across_windows() {
        let mut st = state();
        st.windows.split(40);
        st.windows.resize(20);
        let total_height: u16 = st.windows.windows_top_to_bottom().map(|(_, w)| w.height).sum();
        assert_eq!(total_height, 20);
    }

    #[test]
    fn find_buffer_window_locates_showing_window() {
        let mut st = state();
        let buf_id = st.windows.focused().buffer;
        assert_eq!(st.windows.find_buffer_window(buf_id), Some(st.windows.focused_id()));
    }

    #[test]
    fn split_copies_focused_cursor_into_new_window() {
        let mut st = state();
        st.focused_buffer_mut().set_cursor(core_text::Position::new(3, 2));
        st.sync_cursor_out();
        let new_id = st.windows.split(40);
        assert_eq!(st.windows.get(new_id).unwrap().cursor, core_text::Position::new(3, 2));
    }

    #[test]
    fn sync_cursor_round_trips_across_focus_change() {
        let mut st = state();
        let first = st.windows.focused_id();
        st.windows.split(40);
        let second = st.windows.focused_id();
        assert_ne!(first, second);

        st.focused_buffer_mut().set_cursor(core_text::Position::new(5, 0));
        st.sync_cursor_out();
        st.windows.focus_next();
        st.sync_cursor_in();
        st.focused_buffer_mut().set_cursor(core_text::Position::new(1, 1));
        st.sync_cursor_out();
        st.windows.focus_next();
        st.sync_cursor_in();
        assert_eq!(st.focused_buffer().cursor(), core_text::Position::new(5, 0));
    }

    #[test]
    fn set_focused_buffer_carries_over_that_buffers_cursor() {
        let mut st = state();
        let mut other = Buffer::new("other");
        other.set_cursor(core_text::Position::new(2, 4));
        let other_id = st.buffers.insert(other);
        st.set_focused_buffer(other_id);
        assert_eq!(st.windows.focused().buffer, other_id);
        assert_eq!(st.focused_buffer().cursor(), core_text::Position::new(2, 4));
    }
}
