//! Kill ring: a bounded history of killed text with a rotating "last yank"
//! cursor for `yank` / `yank-pop` (spec §4.6 "Kill ring").

use std::collections::VecDeque;

/// Killed entries older than this are discarded, oldest first.
pub const KILL_RING_LIMIT: usize = 60;

#[derive(Debug, Default)]
pub struct KillRing {
    entries: VecDeque<String>,
    /// Index into `entries` (0 = most recent) that the last `yank`/`yank-pop`
    /// pulled from. `None` until something has been yanked.
    cursor: Option<usize>,
}

impl KillRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Push a freshly killed piece of text to the front of the ring.
    pub fn push(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        self.entries.push_front(text);
        while self.entries.len() > KILL_RING_LIMIT {
            self.entries.pop_back();
        }
        self.cursor = Some(0);
    }

    /// Append to the most recent entry instead of starting a new one
    /// (consecutive `kill-line` commands accumulate into one kill).
    pub fn append_to_last(&mut self, text: &str) {
        if let Some(front) = self.entries.front_mut() {
            front.push_str(text);
        } else {
            self.push(text.to_string());
        }
        self.cursor = Some(0);
    }

    /// Prepend to the most recent entry (killing backward joins before it).
    pub fn prepend_to_last(&mut self, text: &str) {
        if let Some(front) = self.entries.front_mut() {
            let mut merged = text.to_string();
            merged.push_str(front);
            *front = merged;
        } else {
            self.push(text.to_string());
        }
        self.cursor = Some(0);
    }

    /// Text `yank` should insert: the entry at the current cursor.
    pub fn current(&self) -> Option<&str> {
        self.cursor.and_then(|i| self.entries.get(i)).map(String::as_str)
    }

    /// Rotate the cursor to the next-older entry for `yank-pop`, returning
    /// the newly selected text. No-op (returns `None`) if the ring is empty
    /// or nothing has been yanked yet.
    pub fn rotate(&mut self) -> Option<&str> {
        let i = self.cursor?;
        if self.entries.is_empty() {
            return None;
        }
        let next = (i + 1) % self.entries.len();
        self.cursor = Some(next);
        self.entries.get(next).map(String::as_str)
    }
}
