//! Relaxed-plan oracle contract.
//!
//! The state-of-the-art relaxed-plan *extraction* algorithm is out of scope
//! here; this module specifies the contract the composite evaluator
//! consumes and ships a default delete-relaxation fixpoint oracle (ignore
//! deletes, compute the reachable fluent set, extract a plan by backward
//! chaining from the goal through first-achiever actions).

use std::collections::{HashMap, HashSet};

use widthplan_kernel::model::action::ActionId;
use widthplan_kernel::model::fluent::FluentId;
use widthplan_kernel::model::problem::StripsProblem;
use widthplan_kernel::model::state::State;

/// For a state, estimates distance-to-goal in the delete relaxation and
/// returns the set of fluents some relaxed plan adds along the way.
pub trait RelaxedPlanOracle {
    /// Evaluate `state`. Returns `None` (and sets `*out_h = f64::INFINITY`,
    /// clearing the output buffers) when no relaxed plan reaches the goal.
    /// Otherwise returns the relaxed-plan fluent set and fills `out_h` with
    /// the plan length, `out_preferred_ops` with the relaxed-plan actions
    /// immediately applicable in `state`, and `out_relaxed_plan_actions`
    /// with the full backward-extracted action set.
    fn eval(
        &self,
        problem: &dyn StripsProblem,
        state: &State,
        out_h: &mut f64,
        out_preferred_ops: &mut Vec<ActionId>,
        out_relaxed_plan_actions: &mut Vec<ActionId>,
    ) -> Option<HashSet<FluentId>>;
}

/// Delete-relaxation fixpoint oracle: ignores delete effects, grows the
/// reachable fluent set to a fixpoint, then extracts a relaxed plan by
/// backward chaining from unmet goal fluents through first-achiever
/// actions.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeleteRelaxationOracle;

impl DeleteRelaxationOracle {
    fn reachable(
        problem: &dyn StripsProblem,
        state: &State,
    ) -> (HashSet<FluentId>, HashMap<FluentId, ActionId>) {
        let mut achieved: HashSet<FluentId> = state.fluents().iter().copied().collect();
        let mut achiever: HashMap<FluentId, ActionId> = HashMap::new();
        let mut applied: HashSet<ActionId> = HashSet::new();

        loop {
            let snapshot = State::from_fluents(
                problem.num_fluents(),
                achieved.iter().copied().collect(),
            );
            let mut changed = false;
            for a in 0..problem.num_actions() as ActionId {
                if applied.contains(&a) {
                    continue;
                }
                let action = problem.action(a);
                if !action.precondition().iter().all(|f| achieved.contains(f)) {
                    continue;
                }
                applied.insert(a);
                for f in action.effective_add(&snapshot) {
                    if achieved.insert(f) {
                        achiever.entry(f).or_insert(a);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        (achieved, achiever)
    }

    fn extract(
        problem: &dyn StripsProblem,
        init: &HashSet<FluentId>,
        achiever: &HashMap<FluentId, ActionId>,
        goal_fluents: &[FluentId],
    ) -> (HashSet<FluentId>, Vec<ActionId>) {
        let mut stack: Vec<FluentId> = goal_fluents
            .iter()
            .copied()
            .filter(|f| !init.contains(f))
            .collect();
        let mut visited_fluents: HashSet<FluentId> = HashSet::new();
        let mut plan_set: HashSet<ActionId> = HashSet::new();
        let mut plan_actions: Vec<ActionId> = Vec::new();

        while let Some(f) = stack.pop() {
            if !visited_fluents.insert(f) {
                continue;
            }
            if init.contains(&f) {
                continue;
            }
            if let Some(&a) = achiever.get(&f) {
                if plan_set.insert(a) {
                    plan_actions.push(a);
                    for &pre in problem.action(a).precondition() {
                        stack.push(pre);
                    }
                }
            }
        }
        (visited_fluents, plan_actions)
    }
}

impl RelaxedPlanOracle for DeleteRelaxationOracle {
    fn eval(
        &self,
        problem: &dyn StripsProblem,
        state: &State,
        out_h: &mut f64,
        out_preferred_ops: &mut Vec<ActionId>,
        out_relaxed_plan_actions: &mut Vec<ActionId>,
    ) -> Option<HashSet<FluentId>> {
        out_preferred_ops.clear();
        out_relaxed_plan_actions.clear();

        let (achieved, achiever) = Self::reachable(problem, state);
        let goal_fluents: Vec<FluentId> = (0..problem.num_fluents() as u32)
            .filter(|&f| problem.is_in_goal(f))
            .collect();
        let feasible = goal_fluents.iter().all(|f| achieved.contains(f));
        if !feasible {
            *out_h = f64::INFINITY;
            return None;
        }

        let init: HashSet<FluentId> = state.fluents().iter().copied().collect();
        let (rp_set, plan_actions) = Self::extract(problem, &init, &achiever, &goal_fluents);

        *out_h = plan_actions.len() as f64;
        out_relaxed_plan_actions.extend(plan_actions.iter().copied());
        for &a in &plan_actions {
            if problem.action(a).is_applicable(state) {
                out_preferred_ops.push(a);
            }
        }
        Some(rp_set)
    }
}
