//! Closed list: hash-indexed set of expanded states with
//! reopen-on-better-g.

use std::collections::HashMap;

use widthplan_kernel::model::problem::StripsProblem;
use widthplan_kernel::proof::hash::ContentHash;

use crate::node::{NodeArena, NodeId};

/// Outcome of checking a node against the closed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedCheck {
    /// The state has not been closed before; the caller should proceed.
    NotClosed,
    /// The state was already closed on a path with `g` no worse than this
    /// node's; the caller must discard this node.
    AlreadyClosed,
    /// The state was closed before but this node reaches it on a strictly
    /// cheaper path; the stale entry has been evicted and the caller
    /// should proceed (and eventually re-insert).
    Reopened { evicted: NodeId },
}

#[derive(Debug, Default)]
pub struct ClosedList {
    by_hash: HashMap<ContentHash, NodeId>,
}

impl ClosedList {
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_hash: HashMap::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    /// Look up `id`'s state against the closed list. Does not mutate the
    /// catalogued entry; callers insert the surviving node explicitly via
    /// [`ClosedList::insert`].
    pub fn check(
        &mut self,
        arena: &mut NodeArena,
        problem: &dyn StripsProblem,
        id: NodeId,
    ) -> ClosedCheck {
        arena.ensure_state(id, problem);
        let hash = arena.get(id).state().expect("state materialized above").hash();
        let Some(&existing) = self.by_hash.get(&hash) else {
            return ClosedCheck::NotClosed;
        };

        // Same content hash and, to guard against the astronomically
        // unlikely hash collision, the same fluent set.
        let existing_fluents = arena
            .get(existing)
            .state()
            .expect("closed nodes always carry a materialized state")
            .fluents()
            .to_vec();
        let new_fluents = arena.get(id).state().expect("materialized above").fluents();
        if existing_fluents != new_fluents {
            return ClosedCheck::NotClosed;
        }

        let existing_g = arena.get(existing).g;
        let new_g = arena.get(id).g;
        if existing_g <= new_g {
            ClosedCheck::AlreadyClosed
        } else {
            self.by_hash.remove(&hash);
            ClosedCheck::Reopened { evicted: existing }
        }
    }

    pub fn insert(&mut self, arena: &NodeArena, id: NodeId) {
        let hash = arena
            .get(id)
            .state()
            .expect("closed nodes always carry a materialized state")
            .hash();
        self.by_hash.insert(hash, id);
    }
}
