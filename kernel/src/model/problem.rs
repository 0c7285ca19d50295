//! The grounded STRIPS model the search engine consumes.
//!
//! Building a [`StripsProblem`] from a PDDL domain/problem pair is out of
//! scope for this workspace's core crates (see `widthplan-fixtures` for
//! hand-built instances used by tests and benchmarks).

use crate::model::action::{Action, ActionId};
use crate::model::fluent::FluentId;
use crate::model::state::State;

/// The STRIPS model contract consumed by the search engine.
///
/// Implementors must enumerate applicable actions in a deterministic order
/// for a given state; the engine's tie-breaking behavior (but not its
/// correctness) depends on that order being stable across calls.
pub trait StripsProblem {
    fn num_fluents(&self) -> usize;
    fn num_actions(&self) -> usize;

    /// The lifted signature of fluent `f`, used only to derive a
    /// lifted-predicate string (see `widthplan_search::features`).
    fn fluent_signature(&self, f: FluentId) -> &str;

    fn action(&self, a: ActionId) -> &Action;

    /// Append the actions applicable in `state`, in deterministic order, to
    /// `out` (which is not cleared first, so callers can reuse a scratch
    /// buffer across expansions).
    fn applicable_set_v2(&self, state: &State, out: &mut Vec<ActionId>) {
        for a in 0..self.num_actions() {
            let a = a as ActionId;
            if self.action(a).is_applicable(state) {
                out.push(a);
            }
        }
    }

    fn next(&self, state: &State, a: ActionId) -> State {
        let action = self.action(a);
        let added = action.effective_add(state);
        let deleted = action.effective_del(state);
        let mut next = state.clone();
        next.progress_lazy(&added, &deleted);
        next
    }

    fn cost(&self, state: &State, a: ActionId) -> f32 {
        let _ = state;
        self.action(a).cost()
    }

    fn goal(&self, state: &State) -> bool {
        (0..self.num_fluents() as u32).all(|f| !self.is_in_goal(f) || state.entails(f))
    }

    fn init(&self) -> State;

    fn is_in_goal(&self, f: FluentId) -> bool;
}
