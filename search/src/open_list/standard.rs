//! Standard priority queue: a plain unbounded binary heap.

use super::comparator::Comparator;
use super::heap_util::{pop_heap, push_heap};
use super::OpenList;
use crate::node::{NodeArena, NodeId};

#[derive(Debug)]
pub struct StandardOpenList {
    comparator: Comparator,
    heap: Vec<NodeId>,
}

impl StandardOpenList {
    #[must_use]
    pub fn new(comparator: Comparator) -> Self {
        Self {
            comparator,
            heap: Vec::new(),
        }
    }
}

impl OpenList for StandardOpenList {
    fn push(&mut self, arena: &mut NodeArena, id: NodeId) {
        let comparator = self.comparator;
        let less =
            |a: NodeId, b: NodeId| comparator.compare(arena.get(a), arena.get(b)) == std::cmp::Ordering::Less;
        push_heap(&mut self.heap, id, &less);
        arena.get_mut(id).heap_refs += 1;
    }

    fn pop(&mut self, arena: &mut NodeArena) -> Option<NodeId> {
        let comparator = self.comparator;
        let less =
            |a: NodeId, b: NodeId| comparator.compare(arena.get(a), arena.get(b)) == std::cmp::Ordering::Less;
        let popped = pop_heap(&mut self.heap, &less);
        if let Some(id) = popped {
            arena.get_mut(id).pop_count += 1;
        }
        popped
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}
