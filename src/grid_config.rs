//! The static description of a puzzle: which cells are open, which runs of cells form slots, and
//! where slots cross. Nothing here changes once a `GridConfig` has been built.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use smallvec::SmallVec;

use crate::errors::CrosswordError;
use crate::MAX_SLOT_LENGTH;

/// An identifier for a given slot, based on its index in the GridConfig's `slot_configs` field.
pub type SlotId = usize;

/// Zero-indexed row and column for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Across,
    Down,
}

/// A crossing between one slot and another: the cell index within this slot, the other slot's id,
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub cell_idx: usize,
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct representing the aspects of a slot in the grid that are static during filling.
#[derive(Debug, Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,

    /// Crossings in order of `cell_idx`. Cells that no other slot passes through are absent.
    pub crossings: SmallVec<[Crossing; MAX_SLOT_LENGTH]>,
}

impl SlotConfig {
    /// Generate the coords for each cell of this slot.
    pub fn cell_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        cell_coords(self.start_cell, self.length, self.direction)
    }
}

/// An across or down entry in the input to `GridConfig::from_entries`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridEntry {
    pub loc: GridCoord,
    pub len: usize,
    pub dir: Direction,
}

impl GridEntry {
    /// Generate the coords for each cell of this entry.
    fn cell_coords(&self) -> impl Iterator<Item = GridCoord> {
        cell_coords(self.loc, self.len, self.dir)
    }
}

fn cell_coords(start: GridCoord, length: usize, direction: Direction) -> impl Iterator<Item = GridCoord> {
    (0..length).map(move |cell_idx| match direction {
        Direction::Across => (start.0, start.1 + cell_idx),
        Direction::Down => (start.0 + cell_idx, start.1),
    })
}

/// A struct representing the aspects of a grid that are static during filling.
#[derive(Clone)]
pub struct GridConfig {
    pub height: usize,
    pub width: usize,

    /// `structure[row][col]` is true for open cells and false for blocks.
    pub structure: Vec<Vec<bool>>,

    pub slot_configs: Vec<SlotConfig>,
}

impl Debug for GridConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridConfig")
            .field("height", &self.height)
            .field("width", &self.width)
            .field("slot_configs", &self.slot_configs)
            .finish()
    }
}

impl GridConfig {
    /// Build a grid containing exactly the given entries. Every cell covered by an entry is open,
    /// every other cell is a block.
    pub fn from_entries(
        height: usize,
        width: usize,
        entries: &[GridEntry],
    ) -> Result<GridConfig, CrosswordError> {
        let mut structure = vec![vec![false; width]; height];

        for (entry_idx, entry) in entries.iter().enumerate() {
            if entry.len == 0 {
                return Err(CrosswordError::EmptySlot { slot_id: entry_idx });
            }
            for (row, col) in entry.cell_coords() {
                if row >= height || col >= width {
                    return Err(CrosswordError::SlotOutOfBounds { slot_id: entry_idx, height, width });
                }
                structure[row][col] = true;
            }
        }

        Self::build(structure, entries)
    }

    /// Parse a structure template with one line per row, where `_` is an open cell and any other
    /// character is a block. Rows shorter than the widest row are padded with blocks. Every run of
    /// two or more open cells becomes a slot: across slots first, then down slots, each in
    /// row-major order of their starting cell.
    pub fn from_structure(template: &str) -> Result<GridConfig, CrosswordError> {
        let mut structure: Vec<Vec<bool>> =
            template.lines().map(|line| line.chars().map(|c| c == '_').collect()).collect();

        let width = structure.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return Err(CrosswordError::EmptyStructure);
        }
        for row in &mut structure {
            row.resize(width, false);
        }

        fn build_runs(structure: &[Vec<bool>], dir: Direction) -> Vec<GridEntry> {
            let (height, width) = (structure.len(), structure[0].len());
            let is_open = |row: usize, col: usize| row < height && col < width && structure[row][col];
            let mut result = vec![];

            for row in 0..height {
                for col in 0..width {
                    let starts_run = match dir {
                        Direction::Across => col == 0 || !structure[row][col - 1],
                        Direction::Down => row == 0 || !structure[row - 1][col],
                    };
                    if !structure[row][col] || !starts_run {
                        continue;
                    }

                    let len = (0..)
                        .take_while(|&cell_idx| match dir {
                            Direction::Across => is_open(row, col + cell_idx),
                            Direction::Down => is_open(row + cell_idx, col),
                        })
                        .count();

                    if len > 1 {
                        result.push(GridEntry { loc: (row, col), len, dir });
                    }
                }
            }

            result
        }

        let mut entries = build_runs(&structure, Direction::Across);
        entries.extend(build_runs(&structure, Direction::Down));

        Self::build(structure, &entries)
    }

    /// Number the entries as slots and work out which slots cross in which cells.
    fn build(structure: Vec<Vec<bool>>, entries: &[GridEntry]) -> Result<GridConfig, CrosswordError> {
        // For each cell: the (entry index, cell index within entry) of its across and down entries.
        #[derive(Debug, Default)]
        struct GridCell {
            across: Option<(usize, usize)>,
            down: Option<(usize, usize)>,
        }
        let mut cell_by_loc: HashMap<GridCoord, GridCell> = HashMap::new();

        for (entry_idx, entry) in entries.iter().enumerate() {
            for (cell_idx, loc) in entry.cell_coords().enumerate() {
                let grid_cell = cell_by_loc.entry(loc).or_default();
                let occupant = match entry.dir {
                    Direction::Across => &mut grid_cell.across,
                    Direction::Down => &mut grid_cell.down,
                };
                if let Some((other_entry_idx, _)) = *occupant {
                    return Err(CrosswordError::ConflictingSlots {
                        slot_id: other_entry_idx,
                        other_slot_id: entry_idx,
                        cell: loc,
                    });
                }
                *occupant = Some((entry_idx, cell_idx));
            }
        }

        let slot_configs = entries
            .iter()
            .enumerate()
            .map(|(entry_idx, entry)| {
                let crossings = entry
                    .cell_coords()
                    .enumerate()
                    .filter_map(|(cell_idx, loc)| {
                        let grid_cell = &cell_by_loc[&loc];
                        let other = match entry.dir {
                            Direction::Across => grid_cell.down,
                            Direction::Down => grid_cell.across,
                        };
                        other.map(|(other_slot_id, other_slot_cell)| Crossing {
                            cell_idx,
                            other_slot_id,
                            other_slot_cell,
                        })
                    })
                    .collect();

                SlotConfig {
                    id: entry_idx,
                    start_cell: entry.loc,
                    direction: entry.dir,
                    length: entry.len,
                    crossings,
                }
            })
            .collect();

        Ok(GridConfig {
            height: structure.len(),
            width: structure.first().map_or(0, Vec::len),
            structure,
            slot_configs,
        })
    }

    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    /// The pair of cell indices `(in slot_id, in other_slot_id)` where the two slots cross, or
    /// `None` if they don't.
    pub fn overlap(&self, slot_id: SlotId, other_slot_id: SlotId) -> Option<(usize, usize)> {
        self.slot_configs[slot_id]
            .crossings
            .iter()
            .find(|crossing| crossing.other_slot_id == other_slot_id)
            .map(|crossing| (crossing.cell_idx, crossing.other_slot_cell))
    }

    /// The slots crossing the given one, in order of the crossing cell.
    pub fn neighbors(&self, slot_id: SlotId) -> impl Iterator<Item = SlotId> + '_ {
        self.slot_configs[slot_id].crossings.iter().map(|crossing| crossing.other_slot_id)
    }

    pub fn neighbor_count(&self, slot_id: SlotId) -> usize {
        self.slot_configs[slot_id].crossings.len()
    }
}
