//! Errors raised while building a puzzle from its inputs.
//!
//! Solver outcomes are not errors: an unsolvable puzzle is reported through
//! [`FillFailure`](crate::FillFailure), and a wiped-out domain during propagation through
//! [`EmptyDomain`](crate::arc_consistency::EmptyDomain).

use std::io;

use crate::grid_config::GridCoord;

#[derive(Debug, thiserror::Error)]
pub enum CrosswordError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Structure contains no rows")]
    EmptyStructure,

    #[error("Slot {slot_id} has length zero")]
    EmptySlot { slot_id: usize },

    #[error("Slot {slot_id} extends past the {height}x{width} grid")]
    SlotOutOfBounds {
        slot_id: usize,
        height: usize,
        width: usize,
    },

    #[error("Slots {slot_id} and {other_slot_id} run in the same direction through cell {cell:?}")]
    ConflictingSlots {
        slot_id: usize,
        other_slot_id: usize,
        cell: GridCoord,
    },
}

impl CrosswordError {
    /// Short hint for CLI users, where one applies.
    #[must_use]
    pub fn help(&self) -> Option<&'static str> {
        match self {
            CrosswordError::EmptyStructure => {
                Some("Use one line per row, with '_' for open cells and any other character for blocks")
            }
            CrosswordError::ConflictingSlots { .. } => {
                Some("Each cell can belong to at most one across slot and one down slot")
            }
            _ => None,
        }
    }
}
