//! Reversible, coalescing undo/redo log (spec §4.4).
//!
//! Records are kept in two plain stacks (`undo`, `redo`) in file order,
//! newest last — an arena-free rendering of the spec's intrusive linked
//! list (spec §9: "represent as an arena-owned vector with stable indices").
//! Paired-group chaining, which the original expresses via a `paired` flag
//! walked through `prev` pointers, falls out naturally from stack order: a
//! paired record's predecessor is simply the next pop.

use core_text::Position;
use tracing::trace;

/// Undo history cap (spec §3 `UNDO_LIMIT`).
pub const UNDO_LIMIT: usize = 1000;

/// One reversible edit. For inserts, `data` is what was inserted and `[start,
/// end)` is the span undo must delete. For deletes, `data` is what was
/// deleted and undo must re-insert it at `start`.
#[derive(Debug, Clone)]
pub struct UndoRecord {
    pub start: Position,
    pub end: Position,
    pub is_delete: bool,
    pub data: Vec<u8>,
    /// The next mutation of matching kind may coalesce into this record.
    pub append: bool,
    /// Chains this record with its predecessor as one atomic undo step.
    pub paired: bool,
}

#[derive(Debug, Default)]
pub struct UndoLog {
    undo: Vec<UndoRecord>,
    redo: Vec<UndoRecord>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Seal the current head so the next mutation (of any kind) starts a
    /// fresh record instead of coalescing into it.
    pub fn seal(&mut self) {
        if let Some(last) = self.undo.last_mut() {
            last.append = false;
        }
    }

    fn prune(&mut self) {
        if self.undo.len() <= UNDO_LIMIT {
            return;
        }
        let excess = self.undo.len() - UNDO_LIMIT;
        // Drop the oldest `excess` records. If the cut lands mid paired
        // group, drop the rest of that group too (spec §9 open question:
        // we prune whole groups rather than leaving a dangling paired
        // record with no predecessor).
        let mut cut = excess;
        while cut < self.undo.len() && self.undo[cut].paired {
            cut += 1;
        }
        self.undo.drain(0..cut.min(self.undo.len()));
        trace!(target: "state.undo", dropped = cut, "undo_pruned");
    }

    /// Record an insertion of `data` producing span `[start, end)`,
    /// coalescing into the current head when it is an appendable insert
    /// ending exactly at `start`.
    pub fn record_insert(&mut self, start: Position, end: Position, data: &[u8]) {
        if let Some(last) = self.undo.last_mut() {
            if !last.is_delete && last.append && last.end == start {
                last.data.extend_from_slice(data);
                last.end = end;
                self.redo.clear();
                trace!(target: "state.undo", undo_depth = self.undo.len(), "insert_coalesced");
                return;
            }
        }
        self.undo.push(UndoRecord {
            start,
            end,
            is_delete: false,
            data: data.to_vec(),
            append: true,
            paired: false,
        });
        self.redo.clear();
        self.prune();
        trace!(target: "state.undo", undo_depth = self.undo.len(), "insert_pushed");
    }

    /// Record a backspace-style deletion (cursor moves left): `start` is the
    /// new, smaller position; `data` is the bytes removed, in file order.
    pub fn record_delete_backward(&mut self, start: Position, old_start: Position, data: &[u8]) {
        if let Some(last) = self.undo.last_mut() {
            if last.is_delete && last.append && last.start == old_start {
                let mut merged = data.to_vec();
                merged.extend_from_slice(&last.data);
                last.data = merged;
                last.start = start;
                self.redo.clear();
                trace!(target: "state.undo", undo_depth = self.undo.len(), "backspace_coalesced");
                return;
            }
        }
        self.undo.push(UndoRecord {
            start,
            end: old_start,
            is_delete: true,
            data: data.to_vec(),
            append: true,
            paired: false,
        });
        self.redo.clear();
        self.prune();
        trace!(target: "state.undo", undo_depth = self.undo.len(), "backspace_pushed");
    }

    /// Record a forward-delete: `start` is the (unchanged) cursor position,
    /// `end` the new span extent, `data` the bytes removed.
    pub fn record_delete_forward(&mut self, start: Position, end: Position, data: &[u8]) {
        if let Some(last) = self.undo.last_mut() {
            if last.is_delete && last.append && last.start == start {
                last.data.extend_from_slice(data);
                last.end = end;
                self.redo.clear();
                trace!(target: "state.undo", undo_depth = self.undo.len(), "forward_delete_coalesced");
                return;
            }
        }
        self.undo.push(UndoRecord {
            start,
            end,
            is_delete: true,
            data: data.to_vec(),
            append: true,
            paired: false,
        });
        self.redo.clear();
        self.prune();
        trace!(target: "state.undo", undo_depth = self.undo.len(), "forward_delete_pushed");
    }

    /// Push a bulk (paired) transaction: every record but the last gets
    /// `paired = true` so one user-level undo replays the whole group.
    pub fn record_paired_group(&mut self, records: Vec<UndoRecord>) {
        let n = records.len();
        for (i, mut rec) in records.into_iter().enumerate() {
            rec.paired = i + 1 < n;
            rec.append = false;
            self.undo.push(rec);
        }
        self.redo.clear();
        self.prune();
        trace!(target: "state.undo", undo_depth = self.undo.len(), "paired_group_pushed");
    }

    /// Chain every record pushed since `mark` (an earlier `undo_count()`)
    /// into one atomic paired group, the same shape `record_paired_group`
    /// builds, but applied retroactively to records already recorded
    /// individually by `record_insert`/`record_delete_*` (used by callers
    /// that go through `Buffer::insert_at`/`delete_span` for each step of a
    /// compound edit rather than assembling `UndoRecord`s by hand).
    pub fn pair_since(&mut self, mark: usize) {
        if mark >= self.undo.len() {
            return;
        }
        let last = self.undo.len() - 1;
        for rec in &mut self.undo[mark..last] {
            rec.paired = true;
        }
    }

    fn pop_undo(&mut self) -> Option<UndoRecord> {
        self.undo.pop()
    }

    fn pop_redo(&mut self) -> Option<UndoRecord> {
        self.redo.pop()
    }

    fn push_redo(&mut self, rec: UndoRecord) {
        self.redo.push(rec);
    }

    fn push_undo_from_redo(&mut self, rec: UndoRecord) {
        self.undo.push(rec);
    }

    /// Pop the next undo step (possibly recursing through a paired group),
    /// invoking `apply` for each popped record and moving it to the redo
    /// stack. Returns `false` if there was nothing to undo.
    pub fn undo_step(&mut self, mut apply: impl FnMut(&UndoRecord)) -> bool {
        let Some(rec) = self.pop_undo() else {
            return false;
        };
        apply(&rec);
        let paired = rec.paired;
        self.push_redo(rec);
        trace!(target: "state.undo", undo_depth = self.undo.len(), redo_depth = self.redo.len(), "undo_applied");
        if paired {
            self.undo_step(apply);
        }
        true
    }

    /// Symmetric redo, moving records back onto the undo stack.
    pub fn redo_step(&mut self, mut apply: impl FnMut(&UndoRecord)) -> bool {
        let Some(rec) = self.pop_redo() else {
            return false;
        };
        apply(&rec);
        let paired = rec.paired;
        self.push_undo_from_redo(rec);
        trace!(target: "state.undo", undo_depth = self.undo.len(), redo_depth = self.redo.len(), "redo_applied");
        if paired {
            // A paired *redo* continues while the record immediately above
            // (the one about to be popped next) is itself marked paired, or
            // while the one we just replayed chains forward. We look at the
            // next candidate purely via recursion on remaining redo depth.
            if self.redo.last().is_some() {
                self.redo_step(apply);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: usize, byte: usize) -> Position {
        Position::new(row, byte)
    }

    #[test]
    fn coalesces_consecutive_inserts() {
        let mut log = UndoLog::new();
        log.record_insert(pos(0, 0), pos(0, 1), b"a");
        log.record_insert(pos(0, 1), pos(0, 2), b"b");
        log.record_insert(pos(0, 2), pos(0, 3), b"c");
        assert_eq!(log.undo_count(), 1);
    }

    #[test]
    fn seal_prevents_further_coalescing() {
        let mut log = UndoLog::new();
        log.record_insert(pos(0, 0), pos(0, 1), b"a");
        log.seal();
        log.record_insert(pos(0, 1), pos(0, 2), b"b");
        assert_eq!(log.undo_count(), 2);
    }

    #[test]
    fn backspace_coalesces_leftward() {
        let mut log = UndoLog::new();
        // Typed "ab", backspacing removes 'b' then 'a'.
        log.record_delete_backward(pos(0, 1), pos(0, 2), b"b");
        log.record_delete_backward(pos(0, 0), pos(0, 1), b"a");
        assert_eq!(log.undo_count(), 1);
        assert_eq!(log.undo.last().unwrap().data, b"ab");
        assert_eq!(log.undo.last().unwrap().start, pos(0, 0));
    }

    #[test]
    fn forward_delete_coalesces() {
        let mut log = UndoLog::new();
        log.record_delete_forward(pos(0, 0), pos(0, 1), b"a");
        log.record_delete_forward(pos(0, 0), pos(0, 1), b"b");
        assert_eq!(log.undo_count(), 1);
        assert_eq!(log.undo.last().unwrap().data, b"ab");
    }

    #[test]
    fn prune_respects_limit() {
        let mut log = UndoLog::new();
        for i in 0..(UNDO_LIMIT + 5) {
            log.seal();
            log.record_insert(pos(0, i), pos(0, i + 1), b"x");
        }
        assert_eq!(log.undo_count(), UNDO_LIMIT);
    }

    #[test]
    fn paired_group_undoes_as_one_step() {
        let mut log = UndoLog::new();
        log.record_paired_group(vec![
            UndoRecord {
                start: pos(0, 0),
                end: pos(0, 1),
                is_delete: true,
                data: b"a".to_vec(),
                append: false,
                paired: false,
            },
            UndoRecord {
                start: pos(0, 0),
                end: pos(0, 1),
                is_delete: true,
                data: b"b".to_vec(),
                append: false,
                paired: false,
            },
        ]);
        assert_eq!(log.undo_count(), 2);
        let mut applied = 0;
        log.undo_step(|_| applied += 1);
        assert_eq!(applied, 2);
        assert_eq!(log.undo_count(), 0);
        assert_eq!(log.redo_count(), 2);
    }

    #[test]
    fn pair_since_chains_records_into_one_undo_step() {
        let mut log = UndoLog::new();
        log.seal();
        let mark = log.undo_count();
        log.record_delete_forward(pos(0, 0), pos(0, 1), b"a");
        log.seal();
        log.record_insert(pos(0, 0), pos(0, 1), b"b");
        log.pair_since(mark);
        assert_eq!(log.undo_count(), 2);
        let mut applied = 0;
        log.undo_step(|_| applied += 1);
        assert_eq!(applied, 2);
        assert_eq!(log.undo_count(), 0);
    }
}
