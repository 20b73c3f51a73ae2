//! This module contains a crossword-specific implementation of the AC-3 algorithm. For our
//! purposes, a pair of crossing slots is arc-consistent when every word left in one slot's domain
//! has at least one word in the other slot's domain with the same letter in the shared cell. We
//! keep revising arcs until nothing else can be removed or some slot runs out of words.

use std::collections::{HashSet, VecDeque};

use log::trace;

use crate::domains::DomainStore;
use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::WordList;

/// An ordered pair of slots meaning "constrain `slot_id` against `other_slot_id`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectedArc {
    pub slot_id: SlotId,
    pub other_slot_id: SlotId,
}

impl DirectedArc {
    pub fn new(slot_id: SlotId, other_slot_id: SlotId) -> DirectedArc {
        DirectedArc { slot_id, other_slot_id }
    }
}

/// Propagation wiped out the domain of `slot_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyDomain {
    pub slot_id: SlotId,
}

pub type ArcConsistencyResult = Result<(), EmptyDomain>;

/// Every arc in the grid: one per direction for each pair of crossing slots, in slot order.
pub fn all_arcs(config: &GridConfig) -> Vec<DirectedArc> {
    config
        .slot_configs
        .iter()
        .flat_map(|slot_config| {
            slot_config
                .crossings
                .iter()
                .map(move |crossing| DirectedArc::new(slot_config.id, crossing.other_slot_id))
        })
        .collect()
}

/// Make `slot_id` arc-consistent with `other_slot_id` by removing every word that has no partner
/// in the other slot's domain at their shared cell. Slots that don't cross impose no constraint,
/// so nothing is removed. Returns whether the domain of `slot_id` changed.
pub fn revise(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut DomainStore,
    slot_id: SlotId,
    other_slot_id: SlotId,
) -> bool {
    let Some((cell_idx, other_cell_idx)) = config.overlap(slot_id, other_slot_id) else {
        return false;
    };

    // Letters that some remaining word in the other slot puts in the shared cell.
    let supported_glyphs: HashSet<char> = domains
        .word_ids(other_slot_id)
        .map(|word_id| word_list.word(word_id).glyphs[other_cell_idx])
        .collect();

    domains.retain(slot_id, |word_id| {
        supported_glyphs.contains(&word_list.word(word_id).glyphs[cell_idx])
    })
}

/// FIFO worklist of arcs. An arc that is already waiting isn't queued a second time.
#[derive(Debug, Default)]
struct ArcQueue {
    queue: VecDeque<DirectedArc>,
    queued: HashSet<DirectedArc>,
}

impl ArcQueue {
    fn enqueue(&mut self, arc: DirectedArc) {
        if self.queued.insert(arc) {
            self.queue.push_back(arc);
        }
    }

    fn pop_front(&mut self) -> Option<DirectedArc> {
        let arc = self.queue.pop_front()?;
        self.queued.remove(&arc);
        Some(arc)
    }
}

/// Run AC-3 starting from `initial_arcs`, or from every arc in the grid if `None`. Whenever
/// revising `(x, y)` shrinks the domain of `x`, every other neighbor `z` of `x` gets `(z, x)`
/// queued again. Stops at the first wiped-out domain.
///
/// Returns the number of revisions that removed something alongside the result, so callers can
/// keep statistics.
pub fn ac3(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut DomainStore,
    initial_arcs: Option<Vec<DirectedArc>>,
) -> (ArcConsistencyResult, u64) {
    let mut queue = ArcQueue::default();
    for arc in initial_arcs.unwrap_or_else(|| all_arcs(config)) {
        queue.enqueue(arc);
    }

    let mut revisions = 0;

    while let Some(DirectedArc { slot_id, other_slot_id }) = queue.pop_front() {
        if !revise(config, word_list, domains, slot_id, other_slot_id) {
            continue;
        }
        revisions += 1;

        if domains.is_wiped_out(slot_id) {
            trace!("AC-3 wiped out slot {} while revising against {}", slot_id, other_slot_id);
            return (Err(EmptyDomain { slot_id }), revisions);
        }

        for neighbor_id in config.neighbors(slot_id) {
            if neighbor_id != other_slot_id {
                queue.enqueue(DirectedArc::new(neighbor_id, slot_id));
            }
        }
    }

    (Ok(()), revisions)
}
