//! Landmark-graph manager contract.
//!
//! Constructing a real landmark graph from a grounded problem is out of
//! scope for this crate; this module specifies the contract the composite
//! evaluator consumes and provides a minimal goal-count manager that treats
//! every goal fluent as its own landmark with no ordering structure.

use widthplan_kernel::model::action::ActionId;
use widthplan_kernel::model::fluent::FluentId;
use widthplan_kernel::model::problem::StripsProblem;
use widthplan_kernel::model::state::State;

/// Manages a single mutable landmark graph navigated along the current
/// search path. Implementations are not reentrant: the driver guarantees
/// exactly one evaluation is in flight at a time.
pub trait LandmarkGraphManager {
    /// Apply the effect of being in `fluents` directly (used to seed the
    /// graph from a materialized state, bypassing an action delta).
    /// Appends newly-consumed and newly-unconsumed landmark ids to the
    /// output buffers.
    fn apply_state(
        &mut self,
        fluents: &[FluentId],
        out_consumed: &mut Vec<FluentId>,
        out_unconsumed: &mut Vec<FluentId>,
    );

    /// Apply the incremental effect of action `a` taken from `state`.
    fn apply_action(
        &mut self,
        state: &State,
        a: ActionId,
        out_consumed: &mut Vec<FluentId>,
        out_unconsumed: &mut Vec<FluentId>,
    );

    /// Reset to the graph's initial (all-unachieved) configuration.
    fn reset_graph(&mut self);

    /// Re-apply a previously recorded consumed/unconsumed delta (path replay).
    fn update_graph(&mut self, consumed: &[FluentId], unconsumed: &[FluentId]);

    /// Reverse a previously applied delta.
    fn undo_graph(&mut self, consumed: &[FluentId], unconsumed: &[FluentId]);

    /// Count of landmarks/goals not yet achieved in the current graph state.
    fn count_unachieved(&self) -> u32;
}

/// A landmark manager with one landmark per goal fluent and no ordering
/// structure: "unachieved" simply means "not currently entailed". This is
/// the floor implementation the engine ships with; richer landmark
/// extraction is a pluggable concern.
#[derive(Debug, Clone)]
pub struct GoalCountLandmarks {
    goal_fluents: Vec<FluentId>,
    achieved: Vec<bool>,
}

impl GoalCountLandmarks {
    #[must_use]
    pub fn from_problem(problem: &dyn StripsProblem) -> Self {
        let goal_fluents: Vec<FluentId> = (0..problem.num_fluents() as u32)
            .filter(|&f| problem.is_in_goal(f))
            .collect();
        let achieved = vec![false; goal_fluents.len()];
        Self {
            goal_fluents,
            achieved,
        }
    }

    fn index_of(&self, f: FluentId) -> Option<usize> {
        self.goal_fluents.iter().position(|&g| g == f)
    }
}

impl LandmarkGraphManager for GoalCountLandmarks {
    fn apply_state(
        &mut self,
        fluents: &[FluentId],
        out_consumed: &mut Vec<FluentId>,
        out_unconsumed: &mut Vec<FluentId>,
    ) {
        for &f in fluents {
            if let Some(i) = self.index_of(f) {
                if !self.achieved[i] {
                    self.achieved[i] = true;
                    out_consumed.push(f);
                }
            }
        }
        let _ = out_unconsumed;
    }

    fn apply_action(
        &mut self,
        state: &State,
        a: ActionId,
        out_consumed: &mut Vec<FluentId>,
        out_unconsumed: &mut Vec<FluentId>,
    ) {
        let _ = (state, a);
        // The goal-count floor implementation has no action-indexed delta;
        // callers re-derive the consumed set from the resulting state via
        // `apply_state` once the successor is materialized.
        let _ = out_consumed;
        let _ = out_unconsumed;
    }

    fn reset_graph(&mut self) {
        self.achieved.iter_mut().for_each(|a| *a = false);
    }

    fn update_graph(&mut self, consumed: &[FluentId], unconsumed: &[FluentId]) {
        for &f in consumed {
            if let Some(i) = self.index_of(f) {
                self.achieved[i] = true;
            }
        }
        for &f in unconsumed {
            if let Some(i) = self.index_of(f) {
                self.achieved[i] = false;
            }
        }
    }

    fn undo_graph(&mut self, consumed: &[FluentId], unconsumed: &[FluentId]) {
        // Inverse of `update_graph`: what was consumed becomes unconsumed
        // again and vice versa.
        self.update_graph(unconsumed, consumed);
    }

    fn count_unachieved(&self) -> u32 {
        self.achieved.iter().filter(|a| !**a).count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Toy;

    impl StripsProblem for Toy {
        fn num_fluents(&self) -> usize {
            3
        }
        fn num_actions(&self) -> usize {
            0
        }
        fn fluent_signature(&self, _f: FluentId) -> &str {
            "p"
        }
        fn action(&self, _a: ActionId) -> &widthplan_kernel::model::action::Action {
            unimplemented!()
        }
        fn init(&self) -> State {
            State::from_fluents(3, vec![])
        }
        fn is_in_goal(&self, f: FluentId) -> bool {
            f == 1 || f == 2
        }
    }

    #[test]
    fn starts_fully_unachieved() {
        let mgr = GoalCountLandmarks::from_problem(&Toy);
        assert_eq!(mgr.count_unachieved(), 2);
    }

    #[test]
    fn apply_state_consumes_matching_goal_fluents() {
        let mut mgr = GoalCountLandmarks::from_problem(&Toy);
        let mut consumed = Vec::new();
        let mut unconsumed = Vec::new();
        mgr.apply_state(&[1], &mut consumed, &mut unconsumed);
        assert_eq!(consumed, vec![1]);
        assert_eq!(mgr.count_unachieved(), 1);
    }

    #[test]
    fn update_then_undo_restores_count() {
        let mut mgr = GoalCountLandmarks::from_problem(&Toy);
        mgr.update_graph(&[1, 2], &[]);
        assert_eq!(mgr.count_unachieved(), 0);
        mgr.undo_graph(&[1, 2], &[]);
        assert_eq!(mgr.count_unachieved(), 2);
    }

    #[test]
    fn reset_clears_all_progress() {
        let mut mgr = GoalCountLandmarks::from_problem(&Toy);
        mgr.update_graph(&[1, 2], &[]);
        mgr.reset_graph();
        assert_eq!(mgr.count_unachieved(), 2);
    }
}
