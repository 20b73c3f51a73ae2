//! Per-slot candidate sets, and the undo trail that lets the search put them back.
//!
//! Each domain is a `BitSet` of `WordId`s, so iteration is always in ascending word id order
//! (which is word-list order). Every narrowing first pushes the slot's previous domain onto the
//! trail; `rollback` pops entries back to a `Checkpoint`, restoring each touched domain exactly.

use bit_set::BitSet;
use log::debug;

use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::{WordId, WordList};

/// A position in the undo trail, as returned by `DomainStore::checkpoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Checkpoint(usize);

#[derive(Debug, Clone)]
pub struct DomainStore {
    domains: Vec<BitSet>,

    /// Previous domains, most recent last, recorded before each narrowing.
    trail: Vec<(SlotId, BitSet)>,
}

impl DomainStore {
    /// Seed every slot's domain with every word in the list.
    pub fn new(slot_count: usize, word_count: usize) -> DomainStore {
        DomainStore {
            domains: (0..slot_count).map(|_| (0..word_count).collect()).collect(),
            trail: vec![],
        }
    }

    pub fn domain(&self, slot_id: SlotId) -> &BitSet {
        &self.domains[slot_id]
    }

    /// All domains, indexed by slot id.
    pub fn domains(&self) -> &[BitSet] {
        &self.domains
    }

    pub fn domain_size(&self, slot_id: SlotId) -> usize {
        self.domains[slot_id].len()
    }

    pub fn is_wiped_out(&self, slot_id: SlotId) -> bool {
        self.domains[slot_id].is_empty()
    }

    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.domains[slot_id].contains(word_id)
    }

    /// The remaining word ids for a slot, in ascending order.
    pub fn word_ids(&self, slot_id: SlotId) -> impl Iterator<Item = WordId> + '_ {
        self.domains[slot_id].iter()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.trail.len())
    }

    /// Undo every narrowing made since `checkpoint` was taken.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        while self.trail.len() > checkpoint.0 {
            if let Some((slot_id, previous)) = self.trail.pop() {
                self.domains[slot_id] = previous;
            }
        }
    }

    /// Remove the given words from a slot's domain. Returns whether anything was removed.
    pub fn remove_all(&mut self, slot_id: SlotId, word_ids: &[WordId]) -> bool {
        let removals: Vec<WordId> = word_ids
            .iter()
            .copied()
            .filter(|&word_id| self.domains[slot_id].contains(word_id))
            .collect();

        if removals.is_empty() {
            return false;
        }

        self.trail.push((slot_id, self.domains[slot_id].clone()));
        for word_id in removals {
            self.domains[slot_id].remove(word_id);
        }
        true
    }

    /// Keep only the words for which `keep` returns true. Returns whether anything was removed.
    pub fn retain<F>(&mut self, slot_id: SlotId, mut keep: F) -> bool
    where
        F: FnMut(WordId) -> bool,
    {
        let removals: Vec<WordId> =
            self.domains[slot_id].iter().filter(|&word_id| !keep(word_id)).collect();

        self.remove_all(slot_id, &removals)
    }

    /// Narrow a slot's domain to a single word, as when the search commits to it.
    pub fn restrict_to(&mut self, slot_id: SlotId, word_id: WordId) {
        self.retain(slot_id, |other_word_id| other_word_id == word_id);
    }
}

/// Remove every word whose length differs from its slot's length.
pub fn enforce_node_consistency(config: &GridConfig, word_list: &WordList, domains: &mut DomainStore) {
    for slot_config in &config.slot_configs {
        domains.retain(slot_config.id, |word_id| word_list.word(word_id).len() == slot_config.length);

        debug!(
            "Slot {} ({:?}, length {}) has {} candidates after node consistency",
            slot_config.id,
            slot_config.direction,
            slot_config.length,
            domains.domain_size(slot_config.id)
        );
    }
}
