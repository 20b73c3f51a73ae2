//! Crossword filling as a constraint satisfaction problem.
//!
//! A [`GridConfig`] describes the slots of a grid and how they cross, a [`WordList`] supplies the
//! candidate words, and [`find_fill`] searches for one word per slot such that every slot gets a
//! word of the right length, no word is used twice, and crossing slots agree on their shared
//! letters. The search combines node consistency, AC-3 and backtracking with MRV/degree slot
//! ordering, least-constraining-value word ordering and forward checking.

pub mod arc_consistency;
pub mod backtracking_search;
pub mod domains;
pub mod errors;
pub mod grid_config;
pub mod log;
pub mod render;
pub mod word_list;

pub use backtracking_search::{
    find_fill, Assignment, Choice, FillFailure, FillOptions, FillSuccess, Filler, Statistics,
};
pub use errors::CrosswordError;
pub use grid_config::{Direction, GridConfig, GridEntry, SlotConfig, SlotId};
pub use render::render_grid;
pub use word_list::{WordId, WordList};

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;
