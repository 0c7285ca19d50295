//! Search nodes, arena-owned.
//!
//! Nodes never move and are never individually freed: the arena (a `Vec`
//! behind [`NodeArena`]) owns every node for the lifetime of one search.
//! Parent links are arena indices rather than pointers, so there is no
//! lifetime to thread through the open-list variants and no cycle or
//! double-free risk when the same node is referenced from two heaps plus
//! the closed list at once.

use std::collections::HashSet;

use widthplan_kernel::model::action::{ActionId, NO_OP};
use widthplan_kernel::model::fluent::FluentId;
use widthplan_kernel::model::problem::StripsProblem;
use widthplan_kernel::model::state::State;

/// Index of a node within a [`NodeArena`].
pub type NodeId = u32;

/// Sentinel meaning "no partition assigned" (novelty evaluation skipped).
pub const NO_PARTITION: u64 = u64::MAX;

/// Canonical lifted-feature vector table key (see `crate::features`).
pub type FeatureKey = u32;

/// A single search node.
#[derive(Debug, Clone)]
pub struct SearchNode {
    pub parent: Option<NodeId>,
    pub action: ActionId,
    state: Option<State>,
    pub g: f32,
    pub g_unit: u32,

    pub h1: i64,
    pub alt_h1: f64,
    pub h2: i64,
    pub h3: i64,
    pub r: u32,
    pub partition: u64,
    /// Minimum tuple-occurrence count observed during this node's partition
    /// novelty evaluation (the "M" slot of the composite evaluator).
    pub m: i64,
    /// Goal-count heuristic value.
    pub gc: u32,

    pub land_consumed: Vec<FluentId>,
    pub land_unconsumed: Vec<FluentId>,

    pub rp_set: Option<HashSet<FluentId>>,
    pub rp_vec: Vec<FluentId>,

    pub feat_ptr: Option<FeatureKey>,

    pub relaxed_deadend: bool,
    pub closed: bool,

    /// Number of open-list heaps currently holding this node. Used only to
    /// check the liveness invariant (`pop_count + open_delete <=
    /// heap_references + 1_if_closed`); the arena itself never frees a slot.
    pub heap_refs: u8,
    pub open_delete: u8,
    pub pop_count: u8,
}

impl SearchNode {
    #[must_use]
    pub fn root(state: State) -> Self {
        Self {
            parent: None,
            action: NO_OP,
            state: Some(state),
            g: 0.0,
            g_unit: 0,
            h1: 0,
            alt_h1: 0.0,
            h2: 0,
            h3: 0,
            r: 0,
            partition: NO_PARTITION,
            m: 0,
            gc: 0,
            land_consumed: Vec::new(),
            land_unconsumed: Vec::new(),
            rp_set: None,
            rp_vec: Vec::new(),
            feat_ptr: None,
            relaxed_deadend: false,
            closed: false,
            heap_refs: 0,
            open_delete: 0,
            pop_count: 0,
        }
    }

    #[must_use]
    pub fn successor(parent_g: f32, parent_g_unit: u32, action: ActionId, cost: f32) -> Self {
        Self {
            parent: None,
            action,
            state: None,
            g: parent_g + cost,
            g_unit: parent_g_unit + 1,
            h1: 0,
            alt_h1: 0.0,
            h2: 0,
            h3: 0,
            r: 0,
            partition: NO_PARTITION,
            m: 0,
            gc: 0,
            land_consumed: Vec::new(),
            land_unconsumed: Vec::new(),
            rp_set: None,
            rp_vec: Vec::new(),
            feat_ptr: None,
            relaxed_deadend: false,
            closed: false,
            heap_refs: 0,
            open_delete: 0,
            pop_count: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> Option<&State> {
        self.state.as_ref()
    }

    pub fn set_state(&mut self, state: State) {
        self.state = Some(state);
    }

    #[must_use]
    pub fn f_cost(&self) -> i64 {
        self.h1.saturating_add(self.h2).saturating_add(self.h3)
    }

    /// Invariant: a node's total release count never exceeds the
    /// references it actually holds.
    #[must_use]
    pub fn satisfies_refcount_invariant(&self) -> bool {
        let closed_ref = u32::from(self.closed);
        u32::from(self.pop_count) + u32::from(self.open_delete) <= u32::from(self.heap_refs) + closed_ref
    }
}

/// Arena owning every node created during one search. Nodes are never
/// individually removed; the whole arena drops at the end of the search.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<SearchNode>,
}

impl NodeArena {
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn insert(&mut self, node: SearchNode) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id as usize]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Materialize `id`'s state by progressing the parent's state if it is
    /// not already materialized. No-op if already materialized.
    pub fn ensure_state(&mut self, id: NodeId, problem: &dyn StripsProblem) {
        if self.nodes[id as usize].state().is_some() {
            return;
        }
        let parent = self.nodes[id as usize]
            .parent
            .expect("non-root node without materialized state must have a parent");
        let action = self.nodes[id as usize].action;
        let parent_state = self.nodes[parent as usize]
            .state
            .clone()
            .expect("ancestors are materialized before descendants are evaluated");
        let next = problem.next(&parent_state, action);
        self.nodes[id as usize].set_state(next);
    }

    /// Root-to-`id` path of node ids, root first.
    #[must_use]
    pub fn ancestry(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut cur = self.nodes[id as usize].parent;
        while let Some(p) = cur {
            path.push(p);
            cur = self.nodes[p as usize].parent;
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_no_action_and_zero_g() {
        let root = SearchNode::root(State::from_fluents(1, vec![0]));
        assert_eq!(root.action, NO_OP);
        assert_eq!(root.g, 0.0);
        assert_eq!(root.g_unit, 0);
    }

    #[test]
    fn successor_g_is_parent_g_plus_cost() {
        let s = SearchNode::successor(3.0, 2, 7, 1.5);
        assert!((s.g - 4.5).abs() < f32::EPSILON);
        assert_eq!(s.g_unit, 3);
    }

    #[test]
    fn arena_ancestry_is_root_first() {
        let mut arena = NodeArena::new();
        let root = arena.insert(SearchNode::root(State::from_fluents(1, vec![])));
        let mut child = SearchNode::successor(0.0, 0, 0, 1.0);
        child.parent = Some(root);
        let child_id = arena.insert(child);
        let mut grandchild = SearchNode::successor(1.0, 1, 1, 1.0);
        grandchild.parent = Some(child_id);
        let grandchild_id = arena.insert(grandchild);

        assert_eq!(
            arena.ancestry(grandchild_id),
            vec![root, child_id, grandchild_id]
        );
    }

    #[test]
    fn refcount_invariant_holds_for_fresh_node() {
        let root = SearchNode::root(State::from_fluents(1, vec![]));
        assert!(root.satisfies_refcount_invariant());
    }

    #[test]
    fn f_cost_is_saturating_sum() {
        let mut n = SearchNode::root(State::from_fluents(1, vec![]));
        n.h1 = i64::MAX;
        n.h2 = 10;
        assert_eq!(n.f_cost(), i64::MAX);
    }
}
