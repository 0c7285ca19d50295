//! Double-heap alternating open list (`Double_Custom_Priority_Queue`).
//!
//! Two bounded random-replacement heaps over the same nodes: a primary heap
//! at depth `D` (capacity `2^(D+1) - 1`) ordered by the primary comparator,
//! and a secondary heap at depth `D - 2` (capacity `2^(D-1) - 1`) ordered by
//! a second comparator -- typically [`Comparator::LiftedFeatureNovelty`].
//! Every insertion is attempted against both heaps unconditionally: the
//! commented-out threshold gate in the original source never ran in
//! practice and is not reproduced here.
//!
//! `pop` alternates between the two heaps every call. The alternation
//! counter increments on every pop and is tested against `alt_interval`
//! (default 2): when `counter % alt_interval == 0` the primary heap is
//! tried first, otherwise the secondary heap is tried first; either way
//! the other heap is used as a fallback if the preferred one is empty.

use super::bounded_random::RandomReplacementHeap;
use super::comparator::Comparator;
use super::OpenList;
use crate::node::{NodeArena, NodeId};

#[derive(Debug)]
pub struct DoubleHeapOpenList {
    primary: RandomReplacementHeap,
    secondary: RandomReplacementHeap,
    alt_interval: u32,
    alt_counter: u32,
}

impl DoubleHeapOpenList {
    /// `depth` is the primary heap's depth `D`; the secondary heap uses
    /// `D - 2`, so callers must pass `depth >= 2`.
    #[must_use]
    pub fn new(
        primary_comparator: Comparator,
        secondary_comparator: Comparator,
        depth: u32,
        alt_interval: u32,
    ) -> Self {
        Self {
            primary: RandomReplacementHeap::new(primary_comparator, depth),
            secondary: RandomReplacementHeap::new(secondary_comparator, depth.saturating_sub(2)),
            alt_interval: alt_interval.max(1),
            alt_counter: 0,
        }
    }

    #[must_use]
    pub fn primary_capacity(&self) -> usize {
        self.primary.capacity()
    }

    #[must_use]
    pub fn secondary_capacity(&self) -> usize {
        self.secondary.capacity()
    }
}

impl OpenList for DoubleHeapOpenList {
    fn push(&mut self, arena: &mut NodeArena, id: NodeId) {
        let (accepted_primary, evicted_primary) = self.primary.insert(arena, id);
        let (accepted_secondary, evicted_secondary) = self.secondary.insert(arena, id);

        if accepted_primary || accepted_secondary {
            arena.get_mut(id).heap_refs += 1;
        }
        for evicted in [evicted_primary, evicted_secondary].into_iter().flatten() {
            let node = arena.get_mut(evicted);
            node.open_delete += 1;
            node.heap_refs = node.heap_refs.saturating_sub(1);
        }
        if !accepted_primary && !accepted_secondary {
            arena.get_mut(id).open_delete += 1;
        }
    }

    fn pop(&mut self, arena: &mut NodeArena) -> Option<NodeId> {
        let primary_first = self.alt_counter % self.alt_interval == 0;
        self.alt_counter = self.alt_counter.wrapping_add(1);

        let popped = if primary_first {
            self.primary.pop(arena).or_else(|| self.secondary.pop(arena))
        } else {
            self.secondary.pop(arena).or_else(|| self.primary.pop(arena))
        };

        if let Some(id) = popped {
            // A node is live in at most one open list overall; once it is
            // dequeued through either heap it must disappear from the
            // other one too, or it could be yielded a second time later.
            self.primary.remove(arena, id);
            self.secondary.remove(arena, id);
            let node = arena.get_mut(id);
            node.pop_count += 1;
            node.heap_refs = node.heap_refs.saturating_sub(1);
        }
        popped
    }

    fn len(&self) -> usize {
        self.primary.len().max(self.secondary.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SearchNode;
    use widthplan_kernel::model::state::State;

    fn node_with(h1: i64, alt_h1: f64) -> SearchNode {
        let mut n = SearchNode::root(State::from_fluents(1, vec![]));
        n.h1 = h1;
        n.alt_h1 = alt_h1;
        n
    }

    #[test]
    fn alternates_starting_with_primary() {
        let mut arena = NodeArena::new();
        let mut list = DoubleHeapOpenList::new(
            Comparator::TripleH,
            Comparator::LiftedFeatureNovelty,
            4,
            2,
        );

        // Primary (TripleH on h1) prefers A then B; secondary (lifted
        // novelty on alt_h1, ascending) prefers C then D.
        let a = arena.insert(node_with(1, 10.0));
        let b = arena.insert(node_with(2, 9.0));
        let c = arena.insert(node_with(9, -5.0));
        let d = arena.insert(node_with(8, -4.0));

        for id in [a, b, c, d] {
            list.push(&mut arena, id);
        }

        let order: Vec<NodeId> = std::iter::from_fn(|| list.pop(&mut arena)).collect();
        assert_eq!(order, vec![a, c, b, d]);
    }

    #[test]
    fn falls_back_to_other_heap_when_preferred_is_empty() {
        let mut arena = NodeArena::new();
        let mut list = DoubleHeapOpenList::new(
            Comparator::TripleH,
            Comparator::LiftedFeatureNovelty,
            4,
            2,
        );
        let only = arena.insert(node_with(1, 1.0));
        list.push(&mut arena, only);
        assert_eq!(list.pop(&mut arena), Some(only));
        assert_eq!(list.pop(&mut arena), None);
    }
}
