//! This module implements grid filling as a backtracking search. Before searching we make every
//! slot node-consistent (right length) and then arc-consistent (AC-3). During the search we pick
//! the slot with the fewest remaining options (ties go to the slot with more crossings), try its
//! words starting with the one that rules out the fewest options in the unfilled crossing slots,
//! and after each tentative choice run a scoped AC-3 pass outward from that slot.
//!
//! Every change a branch makes to the domains is recorded on the `DomainStore` trail and rolled
//! back before the next sibling is tried, so no narrowing leaks between branches.

use std::cmp::Reverse;
use std::collections::HashMap;

use bit_set::BitSet;
use instant::{Duration, Instant};
use log::{debug, info, trace};
use smallvec::SmallVec;

use crate::arc_consistency::{self, ArcConsistencyResult, DirectedArc};
use crate::domains::{self, DomainStore};
use crate::grid_config::{Crossing, GridConfig, SlotId};
use crate::word_list::{WordId, WordList};
use crate::MAX_SLOT_LENGTH;

/// A struct recording a slot assignment made during the filling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// A partial or complete mapping from slots to words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    word_ids_by_slot: Vec<Option<WordId>>,
    assigned_count: usize,
}

impl Assignment {
    /// An empty assignment for a grid with `slot_count` slots.
    pub fn new(slot_count: usize) -> Assignment {
        Assignment {
            word_ids_by_slot: vec![None; slot_count],
            assigned_count: 0,
        }
    }

    /// Record a choice.
    ///
    /// # Panics
    ///
    /// Panics if the slot already has a word; the search never reassigns a filled slot.
    pub fn assign(&mut self, choice: Choice) {
        let slot = &mut self.word_ids_by_slot[choice.slot_id];
        if let Some(existing_word_id) = slot {
            panic!(
                "Assigning word {} to slot {}, which already holds word {}",
                choice.word_id, choice.slot_id, existing_word_id
            );
        }
        *slot = Some(choice.word_id);
        self.assigned_count += 1;
    }

    /// A copy of this assignment extended with one more choice.
    pub fn with_choice(&self, choice: Choice) -> Assignment {
        let mut extended = self.clone();
        extended.assign(choice);
        extended
    }

    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.word_ids_by_slot[slot_id]
    }

    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.word_ids_by_slot[slot_id].is_some()
    }

    /// Number of slots that have a word.
    pub fn len(&self) -> usize {
        self.assigned_count
    }

    pub fn is_empty(&self) -> bool {
        self.assigned_count == 0
    }

    /// The assigned choices in slot order.
    pub fn choices(&self) -> impl Iterator<Item = Choice> + '_ {
        self.word_ids_by_slot
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| word_id.map(|word_id| Choice { slot_id, word_id }))
    }

    pub fn unassigned_slot_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.word_ids_by_slot
            .iter()
            .enumerate()
            .filter(|(_, word_id)| word_id.is_none())
            .map(|(slot_id, _)| slot_id)
    }

    /// The word assigned to a slot, as a string.
    pub fn word<'a>(&self, word_list: &'a WordList, slot_id: SlotId) -> Option<&'a str> {
        self.get(slot_id).map(|word_id| word_list.word(word_id).string.as_str())
    }
}

/// Knobs for a fill attempt.
#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    /// Give up with `FillFailure::ExhaustedStepLimit` after visiting this many search states.
    pub step_limit: Option<u64>,
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: u64,
    pub backtracks: u64,
    pub revisions: u64,
    pub duration: Duration,
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FillFailure {
    /// No assignment satisfies every constraint. This is an ordinary outcome, not a fault.
    #[error("No solution")]
    Unsolvable,

    #[error("Search stopped after reaching its step limit")]
    ExhaustedStepLimit,
}

/// The live state of one fill attempt: the static puzzle, the slot domains, and counters.
pub struct Filler<'a> {
    config: &'a GridConfig,
    word_list: &'a WordList,
    domains: DomainStore,
    options: FillOptions,
    statistics: Statistics,
}

impl<'a> Filler<'a> {
    /// Set up a fill attempt with every word available to every slot.
    pub fn new(config: &'a GridConfig, word_list: &'a WordList, options: FillOptions) -> Filler<'a> {
        Filler {
            config,
            word_list,
            domains: DomainStore::new(config.slot_count(), word_list.len()),
            options,
            statistics: Statistics::default(),
        }
    }

    pub fn domains(&self) -> &DomainStore {
        &self.domains
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn enforce_node_consistency(&mut self) {
        domains::enforce_node_consistency(self.config, self.word_list, &mut self.domains);
    }

    /// See `arc_consistency::revise`.
    pub fn revise(&mut self, slot_id: SlotId, other_slot_id: SlotId) -> bool {
        let revised =
            arc_consistency::revise(self.config, self.word_list, &mut self.domains, slot_id, other_slot_id);
        if revised {
            self.statistics.revisions += 1;
        }
        revised
    }

    /// See `arc_consistency::ac3`.
    pub fn ac3(&mut self, initial_arcs: Option<Vec<DirectedArc>>) -> ArcConsistencyResult {
        let (result, revisions) =
            arc_consistency::ac3(self.config, self.word_list, &mut self.domains, initial_arcs);
        self.statistics.revisions += revisions;
        result
    }

    /// Does every slot have a word?
    pub fn assignment_complete(&self, assignment: &Assignment) -> bool {
        assignment.len() == self.config.slot_count()
    }

    /// Are the assigned words distinct, of the right lengths, and in agreement wherever two
    /// assigned slots cross?
    pub fn consistent(&self, assignment: &Assignment) -> bool {
        let mut seen_word_ids = BitSet::with_capacity(self.word_list.len());
        for Choice { word_id, .. } in assignment.choices() {
            if !seen_word_ids.insert(word_id) {
                return false;
            }
        }

        for Choice { slot_id, word_id } in assignment.choices() {
            if self.word_list.word(word_id).len() != self.config.slot_configs[slot_id].length {
                return false;
            }
        }

        assignment.choices().all(|Choice { slot_id, word_id }| {
            let glyphs = &self.word_list.word(word_id).glyphs;

            self.config.slot_configs[slot_id].crossings.iter().all(|crossing| {
                match assignment.get(crossing.other_slot_id) {
                    Some(other_word_id) => {
                        glyphs[crossing.cell_idx]
                            == self.word_list.word(other_word_id).glyphs[crossing.other_slot_cell]
                    }
                    None => true,
                }
            })
        })
    }

    /// Pick the unassigned slot with the fewest remaining options, preferring slots with more
    /// crossings on a tie and the lowest slot id after that.
    pub fn select_unassigned_slot(&self, assignment: &Assignment) -> Option<SlotId> {
        assignment.unassigned_slot_ids().min_by_key(|&slot_id| {
            (self.domains.domain_size(slot_id), Reverse(self.config.neighbor_count(slot_id)))
        })
    }

    /// The slot's remaining words, ordered by how many options each would rule out in the
    /// unassigned crossing slots (fewest first). Ties keep word-list order.
    pub fn order_domain_values(&self, slot_id: SlotId, assignment: &Assignment) -> Vec<WordId> {
        // For each unassigned crossing: the crossing, the other slot's option count, and how many
        // of those options have each letter in the shared cell. A word with letter `g` in this
        // cell rules out `option_count - count[g]` of them.
        let crossing_counts: SmallVec<[(&Crossing, usize, HashMap<char, usize>); MAX_SLOT_LENGTH]> =
            self.config.slot_configs[slot_id]
                .crossings
                .iter()
                .filter(|crossing| !assignment.is_assigned(crossing.other_slot_id))
                .map(|crossing| {
                    let mut glyph_counts: HashMap<char, usize> = HashMap::new();
                    for other_word_id in self.domains.word_ids(crossing.other_slot_id) {
                        let glyph = self.word_list.word(other_word_id).glyphs[crossing.other_slot_cell];
                        *glyph_counts.entry(glyph).or_insert(0) += 1;
                    }
                    (crossing, self.domains.domain_size(crossing.other_slot_id), glyph_counts)
                })
                .collect();

        let mut ruled_out_by_word: Vec<(WordId, usize)> = self
            .domains
            .word_ids(slot_id)
            .map(|word_id| {
                let glyphs = &self.word_list.word(word_id).glyphs;
                let ruled_out = crossing_counts
                    .iter()
                    .map(|(crossing, option_count, glyph_counts)| {
                        option_count - glyph_counts.get(&glyphs[crossing.cell_idx]).copied().unwrap_or(0)
                    })
                    .sum();
                (word_id, ruled_out)
            })
            .collect();

        ruled_out_by_word.sort_by_key(|&(_, ruled_out)| ruled_out);

        ruled_out_by_word.into_iter().map(|(word_id, _)| word_id).collect()
    }

    /// Propagate a new choice for `slot_id` into its unassigned crossing slots (and onward, as
    /// AC-3 requires). If that wipes out any domain, every change made here is undone before
    /// returning the failure.
    pub fn inference(&mut self, slot_id: SlotId, assignment: &Assignment) -> ArcConsistencyResult {
        let checkpoint = self.domains.checkpoint();

        let arcs: Vec<DirectedArc> = self
            .config
            .neighbors(slot_id)
            .filter(|&neighbor_id| !assignment.is_assigned(neighbor_id))
            .map(|neighbor_id| DirectedArc::new(neighbor_id, slot_id))
            .collect();

        let result = self.ac3(Some(arcs));
        if result.is_err() {
            self.domains.rollback(checkpoint);
        }
        result
    }

    /// Extend `assignment` to a complete one. `Ok(None)` means no completion exists under it.
    pub fn backtrack(&mut self, assignment: Assignment) -> Result<Option<Assignment>, FillFailure> {
        if self.assignment_complete(&assignment) {
            return Ok(Some(assignment));
        }

        self.statistics.states += 1;
        if self.options.step_limit.map(|limit| self.statistics.states > limit).unwrap_or(false) {
            return Err(FillFailure::ExhaustedStepLimit);
        }

        let Some(slot_id) = self.select_unassigned_slot(&assignment) else {
            return Ok(None);
        };

        trace!(
            "State {}: filling slot {} ({} options, {} of {} slots assigned)",
            self.statistics.states,
            slot_id,
            self.domains.domain_size(slot_id),
            assignment.len(),
            self.config.slot_count()
        );

        for word_id in self.order_domain_values(slot_id, &assignment) {
            let candidate = assignment.with_choice(Choice { slot_id, word_id });
            if !self.consistent(&candidate) {
                continue;
            }

            // Commit the slot to this word for the duration of the branch, so that inference
            // propagates the choice itself rather than the slot's whole domain.
            let checkpoint = self.domains.checkpoint();
            self.domains.restrict_to(slot_id, word_id);

            if self.inference(slot_id, &candidate).is_ok() {
                if let Some(result) = self.backtrack(candidate)? {
                    return Ok(Some(result));
                }
            }

            self.domains.rollback(checkpoint);
            self.statistics.backtracks += 1;
        }

        Ok(None)
    }

    /// Enforce node and arc consistency, then search.
    pub fn solve(&mut self) -> Result<Assignment, FillFailure> {
        self.enforce_node_consistency();
        let wiped_out_slot_id =
            (0..self.config.slot_count()).find(|&slot_id| self.domains.is_wiped_out(slot_id));
        if let Some(slot_id) = wiped_out_slot_id {
            debug!("Slot {} has no words of the right length", slot_id);
            return Err(FillFailure::Unsolvable);
        }

        if let Err(empty) = self.ac3(None) {
            debug!("Initial arc consistency wiped out slot {}", empty.slot_id);
            return Err(FillFailure::Unsolvable);
        }

        self.backtrack(Assignment::new(self.config.slot_count()))?
            .ok_or(FillFailure::Unsolvable)
    }
}

/// Search for a valid fill for the given grid and word list.
pub fn find_fill(
    config: &GridConfig,
    word_list: &WordList,
    options: FillOptions,
) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();

    debug!("Filling {} slots from {} words", config.slot_count(), word_list.len());

    let mut filler = Filler::new(config, word_list, options);
    let result = filler.solve();

    let mut statistics = filler.statistics().clone();
    statistics.duration = start.elapsed();

    match result {
        Ok(assignment) => {
            info!("Found a fill: {:?}", statistics);
            Ok(FillSuccess { statistics, assignment })
        }
        Err(failure) => {
            info!("Fill failed ({}): {:?}", failure, statistics);
            Err(failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_config::GridEntry;
    use crate::grid_config::Direction::{Across, Down};

    /// Two 3-letter slots sharing their first letter.
    fn corner_grid() -> GridConfig {
        GridConfig::from_entries(3, 3, &[
            GridEntry { loc: (0, 0), len: 3, dir: Across },
            GridEntry { loc: (0, 0), len: 3, dir: Down },
        ])
        .unwrap()
    }

    fn words(word_list: &WordList, assignment: &Assignment) -> Vec<String> {
        assignment.choices().map(|choice| word_list.word(choice.word_id).string.clone()).collect()
    }

    #[test]
    fn test_crossing_slots_agree_on_shared_letter() {
        let config = corner_grid();
        let word_list = WordList::new(["cat", "dog", "car"]);

        let result = find_fill(&config, &word_list, FillOptions::default()).expect("Failed to find a fill");

        assert_eq!(words(&word_list, &result.assignment), vec!["cat", "car"]);
    }

    #[test]
    fn test_unsolvable_when_no_shared_letter() {
        let config = corner_grid();
        let word_list = WordList::new(["cat", "dog"]);

        let failure = find_fill(&config, &word_list, FillOptions::default()).expect_err("Found an impossible fill??");

        assert_eq!(failure, FillFailure::Unsolvable);
    }

    #[test]
    fn test_isolated_slot_takes_any_word() {
        let config = GridConfig::from_structure("____").unwrap();
        let word_list = WordList::new(["aaaa", "bbbb"]);

        let result = find_fill(&config, &word_list, FillOptions::default()).expect("Failed to find a fill");

        assert_eq!(words(&word_list, &result.assignment), vec!["aaaa"]);
    }

    #[test]
    fn test_no_words_of_right_length_is_unsolvable() {
        let config = corner_grid();
        let word_list = WordList::new(["cats", "dogs"]);

        let mut filler = Filler::new(&config, &word_list, FillOptions::default());

        assert_eq!(filler.solve(), Err(FillFailure::Unsolvable));
        assert_eq!(filler.statistics().states, 0);
    }

    #[test]
    fn test_consistent_checks_all_constraint_families() {
        let config = corner_grid();
        let word_list = WordList::new(["cat", "car", "dog", "cart"]);
        let filler = Filler::new(&config, &word_list, FillOptions::default());
        let empty = Assignment::new(2);

        assert!(filler.consistent(&empty));
        assert!(filler.consistent(&empty.with_choice(Choice { slot_id: 0, word_id: 0 })));

        let crossing_ok = empty
            .with_choice(Choice { slot_id: 0, word_id: 0 })
            .with_choice(Choice { slot_id: 1, word_id: 1 });
        assert!(filler.consistent(&crossing_ok));

        let duplicate = empty
            .with_choice(Choice { slot_id: 0, word_id: 0 })
            .with_choice(Choice { slot_id: 1, word_id: 0 });
        assert!(!filler.consistent(&duplicate));

        let mismatched_letter = empty
            .with_choice(Choice { slot_id: 0, word_id: 0 })
            .with_choice(Choice { slot_id: 1, word_id: 2 });
        assert!(!filler.consistent(&mismatched_letter));

        let wrong_length = empty.with_choice(Choice { slot_id: 0, word_id: 3 });
        assert!(!filler.consistent(&wrong_length));
    }

    #[test]
    #[should_panic(expected = "already holds word")]
    fn test_reassigning_a_slot_panics() {
        let assignment = Assignment::new(1).with_choice(Choice { slot_id: 0, word_id: 0 });
        assignment.with_choice(Choice { slot_id: 0, word_id: 1 });
    }

    #[test]
    fn test_select_prefers_small_domains_then_high_degree() {
        // 0: across top (3), 1: across bottom (3), 2: down left (3), 3: down right (3).
        // Slots 2 and 3 each cross both across slots; 0 and 1 each cross both down slots.
        let config = GridConfig::from_structure("___\n_#_\n___").unwrap();
        let word_list = WordList::new(["abc", "cde", "efg", "ace", "xyz"]);
        let mut filler = Filler::new(&config, &word_list, FillOptions::default());
        filler.enforce_node_consistency();
        let assignment = Assignment::new(config.slot_count());

        // Everything ties: lowest slot id wins.
        assert_eq!(filler.select_unassigned_slot(&assignment), Some(0));

        filler.domains.remove_all(3, &[4]);
        assert_eq!(filler.select_unassigned_slot(&assignment), Some(3));

        let assignment = assignment.with_choice(Choice { slot_id: 3, word_id: 0 });
        assert_eq!(filler.select_unassigned_slot(&assignment), Some(0));
    }

    #[test]
    fn test_degree_breaks_domain_size_ties() {
        // .__
        // ..|
        // ___
        // Slot 2 (down the right edge) crosses both across slots; each across slot crosses only it.
        let config = GridConfig::from_entries(3, 3, &[
            GridEntry { loc: (0, 1), len: 2, dir: Across },
            GridEntry { loc: (2, 0), len: 3, dir: Across },
            GridEntry { loc: (0, 2), len: 3, dir: Down },
        ])
        .unwrap();
        let word_list = WordList::new(["ab", "cd", "abc", "bcd"]);
        let mut filler = Filler::new(&config, &word_list, FillOptions::default());
        filler.enforce_node_consistency();

        for slot_id in 0..3 {
            assert_eq!(filler.domains().domain_size(slot_id), 2);
        }
        assert_eq!(config.neighbor_count(0), 1);
        assert_eq!(config.neighbor_count(2), 2);

        assert_eq!(filler.select_unassigned_slot(&Assignment::new(config.slot_count())), Some(2));
    }

    #[test]
    fn test_order_domain_values_least_constraining_first() {
        let config = corner_grid();
        let word_list = WordList::new(["dog", "cat", "car", "cab"]);
        let mut filler = Filler::new(&config, &word_list, FillOptions::default());
        filler.enforce_node_consistency();

        // "dog" rules out the three c-words in slot 1; each c-word rules out only "dog".
        let order = filler.order_domain_values(0, &Assignment::new(2));
        assert_eq!(order, vec![1, 2, 3, 0]);

        // Once slot 1 is assigned, nothing is ruled out and word-list order is kept.
        let assignment = Assignment::new(2).with_choice(Choice { slot_id: 1, word_id: 1 });
        assert_eq!(filler.order_domain_values(0, &assignment), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_failed_inference_rolls_back() {
        // 0 across the top, 1 across the bottom, 2 down the left joining them.
        let config = GridConfig::from_structure("___\n_\n___").unwrap();
        let word_list = WordList::new(["abc", "axe", "eel", "bee"]);
        let mut filler = Filler::new(&config, &word_list, FillOptions::default());
        filler.enforce_node_consistency();
        filler.domains.remove_all(1, &[2]);

        let before = filler.domains().domains().to_vec();

        // "bee" in slot 0 forces slot 2 to start with "b", and then slot 1 would need to start
        // with "e", which it no longer can.
        filler.domains.restrict_to(0, 3);
        let after_commit = filler.domains().domains().to_vec();
        let assignment = Assignment::new(3).with_choice(Choice { slot_id: 0, word_id: 3 });

        assert!(filler.inference(0, &assignment).is_err());
        assert_eq!(filler.domains().domains(), &after_commit[..]);
        assert_ne!(filler.domains().domains(), &before[..]);
    }

    #[test]
    fn test_successful_inference_keeps_narrowing() {
        let config = corner_grid();
        let word_list = WordList::new(["cat", "dog", "car"]);
        let mut filler = Filler::new(&config, &word_list, FillOptions::default());
        filler.enforce_node_consistency();
        filler.domains.restrict_to(0, 0);

        let assignment = Assignment::new(2).with_choice(Choice { slot_id: 0, word_id: 0 });

        assert!(filler.inference(0, &assignment).is_ok());
        assert_eq!(filler.domains().word_ids(1).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_backtracking_restores_domains_between_siblings() {
        let config = corner_grid();
        let word_list = WordList::new(["cat", "dog"]);
        let mut filler = Filler::new(&config, &word_list, FillOptions::default());
        filler.enforce_node_consistency();
        assert!(filler.ac3(None).is_ok());
        let before = filler.domains().domains().to_vec();

        assert_eq!(filler.backtrack(Assignment::new(2)), Ok(None));
        assert_eq!(filler.domains().domains(), &before[..]);
        assert!(filler.statistics().backtracks > 0);
    }

    #[test]
    fn test_revise_counts_revisions() {
        let config = corner_grid();
        let word_list = WordList::new(["cat", "dog", "car"]);
        let mut filler = Filler::new(&config, &word_list, FillOptions::default());
        filler.enforce_node_consistency();
        filler.domains.restrict_to(1, 1);

        assert!(filler.revise(0, 1));
        assert!(!filler.revise(0, 1));
        assert_eq!(filler.domains().word_ids(0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(filler.statistics().revisions, 1);
    }

    #[test]
    fn test_step_limit() {
        let config = corner_grid();
        let word_list = WordList::new(["cat", "dog", "car"]);
        let options = FillOptions { step_limit: Some(1) };

        assert_eq!(
            find_fill(&config, &word_list, options).map(|success| success.assignment),
            Err(FillFailure::ExhaustedStepLimit)
        );
    }

    #[test]
    fn test_empty_grid_is_trivially_filled() {
        let config = GridConfig::from_structure("_#_").unwrap();
        let word_list = WordList::new(["cat"]);

        let result = find_fill(&config, &word_list, FillOptions::default()).expect("Failed to find a fill");

        assert!(result.assignment.is_empty());
    }
}
