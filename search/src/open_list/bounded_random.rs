//! Bounded random-replacement heap (`Custom_Priority_Queue` in the source).
//!
//! Fixed capacity `2^(D+1) - 1` for a configured depth `D`. Below capacity,
//! insertion behaves like a normal heap push. At capacity, a uniformly
//! random index in the last-layer range is drawn; the incumbent there is
//! evicted and replaced only if the new node compares better under the
//! comparator, otherwise the new node is rejected. The RNG is seeded with
//! the fixed value 42, matching the original's `std::mt19937 m_gen(42)`,
//! so bounded-heap behavior is reproducible across runs.

use std::cmp::Ordering;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::comparator::Comparator;
use super::heap_util::{pop_heap, push_heap, sift_down, sift_up};
use super::OpenList;
use crate::node::{NodeArena, NodeId};

/// The fixed seed for the bounded open list's RNG stream, for reproducible runs.
pub const RNG_SEED: u64 = 42;

/// Core random-replacement bounded heap, reused by both
/// [`BoundedRandomOpenList`] and the double-heap variant.
pub(crate) struct RandomReplacementHeap {
    comparator: Comparator,
    capacity: usize,
    last_layer_first: usize,
    heap: Vec<NodeId>,
    rng: SmallRng,
}

impl RandomReplacementHeap {
    pub(crate) fn new(comparator: Comparator, depth: u32) -> Self {
        let capacity = (1usize << (depth + 1)) - 1;
        let last_layer_first = 1usize << depth;
        Self {
            comparator,
            capacity,
            last_layer_first,
            heap: Vec::with_capacity(capacity),
            rng: SmallRng::seed_from_u64(RNG_SEED),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    /// Insert `id`. Returns the evicted node id, if any eviction occurred
    /// (the caller is responsible for refcount bookkeeping), and whether
    /// `id` itself was accepted.
    pub(crate) fn insert(&mut self, arena: &NodeArena, id: NodeId) -> (bool, Option<NodeId>) {
        let comparator = self.comparator;
        let less = |a: NodeId, b: NodeId| comparator.compare(arena.get(a), arena.get(b)) == Ordering::Less;

        if self.heap.len() < self.capacity {
            push_heap(&mut self.heap, id, &less);
            return (true, None);
        }

        if self.last_layer_first >= self.capacity {
            // Degenerate depth (0 or 1): no last-layer slot to contest.
            return (false, None);
        }
        let idx = self
            .rng
            .random_range(self.last_layer_first..self.capacity);
        let incumbent = self.heap[idx];
        if comparator.compare(arena.get(incumbent), arena.get(id)) == Ordering::Greater {
            self.heap[idx] = id;
            sift_up(&mut self.heap, idx, &less);
            (true, Some(incumbent))
        } else {
            (false, None)
        }
    }

    pub(crate) fn pop(&mut self, arena: &NodeArena) -> Option<NodeId> {
        let comparator = self.comparator;
        let less = |a: NodeId, b: NodeId| comparator.compare(arena.get(a), arena.get(b)) == Ordering::Less;
        pop_heap(&mut self.heap, &less)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Remove `id` from this heap if present, wherever it sits. Used by the
    /// double-heap variant to keep both heaps in sync when a node is
    /// dequeued through one of them.
    pub(crate) fn remove(&mut self, arena: &NodeArena, id: NodeId) -> bool {
        let Some(idx) = self.heap.iter().position(|&x| x == id) else {
            return false;
        };
        let comparator = self.comparator;
        let less = |a: NodeId, b: NodeId| comparator.compare(arena.get(a), arena.get(b)) == Ordering::Less;
        let last = self.heap.len() - 1;
        self.heap.swap(idx, last);
        self.heap.pop();
        if idx < self.heap.len() {
            sift_down(&mut self.heap, idx, &less);
            sift_up(&mut self.heap, idx, &less);
        }
        true
    }
}

#[derive(Debug)]
pub struct BoundedRandomOpenList {
    inner: RandomReplacementHeap,
}

impl BoundedRandomOpenList {
    #[must_use]
    pub fn new(comparator: Comparator, depth: u32) -> Self {
        Self {
            inner: RandomReplacementHeap::new(comparator, depth),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

impl std::fmt::Debug for RandomReplacementHeap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomReplacementHeap")
            .field("capacity", &self.capacity)
            .field("len", &self.heap.len())
            .finish()
    }
}

impl OpenList for BoundedRandomOpenList {
    fn push(&mut self, arena: &mut NodeArena, id: NodeId) {
        let (accepted, evicted) = self.inner.insert(arena, id);
        if accepted {
            arena.get_mut(id).heap_refs += 1;
            if let Some(evicted_id) = evicted {
                let node = arena.get_mut(evicted_id);
                node.open_delete += 1;
                node.heap_refs = node.heap_refs.saturating_sub(1);
            }
        } else {
            arena.get_mut(id).open_delete += 1;
        }
    }

    fn pop(&mut self, arena: &mut NodeArena) -> Option<NodeId> {
        let popped = self.inner.pop(arena);
        if let Some(id) = popped {
            let node = arena.get_mut(id);
            node.pop_count += 1;
            node.heap_refs = node.heap_refs.saturating_sub(1);
        }
        popped
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
