//! Named registers: 127 ASCII-indexed slots a register command can stash
//! text or a position into (spec §4.6 "Registers").
//!
//! Unlike the kill ring, registers are never rotated or pruned — each slot
//! holds exactly what the last `copy-to-register`/`point-to-register` put
//! there until overwritten.

/// What a register can hold. `null` (spec §4.8) is represented at the slot
/// level by `Option::None` rather than as a variant here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterSlot {
    /// Plain killed/copied text.
    Text(String),
    /// A rectangular block, one entry per row.
    Rectangle(Vec<String>),
    /// A saved cursor location (`point-to-register` / `jump-to-register`).
    Point { row: usize, byte: usize },
    /// A number (`number-to-register`'s target, incremented in place by
    /// `increment-register`).
    Number(i64),
    /// A recorded keyboard macro (`start-kbd-macro`/`end-kbd-macro`
    /// `C-x (` ... `C-x )`), stored as the command names it played back.
    Macro(Vec<String>),
}

/// 127 ASCII-addressable register slots (indices `0..=126`, matching the
/// printable-range register names a user can type: digits, letters,
/// punctuation).
pub struct Registers {
    slots: [Option<RegisterSlot>; 127],
}

impl std::fmt::Debug for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let occupied = self.slots.iter().filter(|s| s.is_some()).count();
        f.debug_struct("Registers").field("occupied", &occupied).finish()
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(name: char) -> Option<usize> {
        let v = name as u32;
        if v < 127 {
            Some(v as usize)
        } else {
            None
        }
    }

    pub fn set(&mut self, name: char, slot: RegisterSlot) {
        if let Some(i) = Self::index(name) {
            self.slots[i] = Some(slot);
        }
    }

    pub fn get(&self, name: char) -> Option<&RegisterSlot> {
        Self::index(name).and_then(|i| self.slots[i].as_ref())
    }

    pub fn clear(&mut self, name: char) {
        if let Some(i) = Self::index(name) {
            self.slots[i] = None;
        }
    }
}
