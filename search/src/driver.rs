//! Search driver: the expansion loop, budget enforcement, and plan
//! extraction.

use std::time::Instant;

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use widthplan_kernel::model::action::ActionId;
use widthplan_kernel::model::problem::StripsProblem;

use crate::closed::{ClosedCheck, ClosedList};
use crate::error::SearchError;
use crate::evaluator::CompositeEvaluator;
use crate::node::{NodeArena, NodeId, SearchNode};
use crate::open_list::bounded_random::BoundedRandomOpenList;
use crate::open_list::comparator::Comparator;
use crate::open_list::double_heap::DoubleHeapOpenList;
use crate::open_list::pruned::PrunedOpenList;
use crate::open_list::standard::StandardOpenList;
use crate::open_list::OpenList;
use crate::policy::{OpenListKind, SearchPolicy};

/// An extracted plan: the grounded action sequence and its accumulated cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub actions: Vec<ActionId>,
    pub cost: f32,
}

/// Run statistics, populated regardless of how the search terminated.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchStats {
    pub expansions: u64,
    pub generated: u64,
    pub dead_ends: u64,
    pub reopened: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Solved { plan: Plan, stats: SearchStats },
    Infeasible { stats: SearchStats },
    TimedOut { stats: SearchStats },
    OutOfMemory { stats: SearchStats },
}

fn build_open_list(policy: &SearchPolicy) -> Box<dyn OpenList> {
    match policy.open_list_kind {
        OpenListKind::Standard => Box::new(StandardOpenList::new(policy.comparator)),
        OpenListKind::BoundedRandom => Box::new(BoundedRandomOpenList::new(
            policy.comparator,
            policy.bounded_depth,
        )),
        OpenListKind::DoubleHeap => Box::new(DoubleHeapOpenList::new(
            policy.comparator,
            Comparator::LiftedFeatureNovelty,
            policy.bounded_depth,
            policy.double_heap_alt_interval,
        )),
        OpenListKind::Pruned => Box::new(PrunedOpenList::new(
            policy.comparator,
            policy.pruned_soft_limit,
        )),
    }
}

/// Orchestrates one search invocation: open list, closed list, node arena,
/// and budget polling. Construct a fresh driver per search; all process-wide
/// state (novelty table, feature table, landmark manager) lives on the
/// [`CompositeEvaluator`] passed to [`SearchDriver::run`], not here.
pub struct SearchDriver {
    policy: SearchPolicy,
    open: Box<dyn OpenList>,
    closed: ClosedList,
    arena: NodeArena,
    stats: SearchStats,
    start: Instant,
    system: System,
    pid: Pid,
}

impl SearchDriver {
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidPolicy`] if `policy` fails validation.
    pub fn new(policy: SearchPolicy) -> Result<Self, SearchError> {
        policy.validate()?;
        let open = build_open_list(&policy);
        Ok(Self {
            policy,
            open,
            closed: ClosedList::new(),
            arena: NodeArena::new(),
            stats: SearchStats::default(),
            start: Instant::now(),
            system: System::new(),
            pid: sysinfo::get_current_pid().unwrap_or(Pid::from_u32(0)),
        })
    }

    /// Run the expansion loop to completion and return the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvariantViolation`] if an internal liveness
    /// invariant is broken -- e.g. the open list reports itself non-empty
    /// but yields `None` on pop. This should never happen from a correctly
    /// implemented [`OpenList`]; it is treated as fatal.
    pub fn run(
        &mut self,
        problem: &dyn StripsProblem,
        evaluator: &mut CompositeEvaluator,
    ) -> Result<SearchOutcome, SearchError> {
        self.start = Instant::now();

        let root = self.arena.insert(SearchNode::root(problem.init()));
        evaluator.evaluate_root(&mut self.arena, root);

        if problem.goal(self.arena.get(root).state().expect("root is materialized")) {
            return Ok(self.solved(root));
        }
        self.open.push(&mut self.arena, root);

        loop {
            // Step 1: pop, or exhausted.
            let Some(current) = self.pop_checked()? else {
                return Ok(SearchOutcome::Infeasible { stats: self.stats });
            };

            // Step 2: a node may surface from a second heap after already
            // being expanded; skip the repeat.
            if self.arena.get(current).closed {
                continue;
            }

            // Step 3: depth bound.
            if self.arena.get(current).g >= self.policy.depth_bound {
                self.close_node(current);
                continue;
            }

            // Step 4: materialize state.
            self.arena.ensure_state(current, problem);

            // Step 5: goal check.
            let state = self
                .arena
                .get(current)
                .state()
                .expect("materialized above")
                .clone();
            if problem.goal(&state) {
                return Ok(self.solved(current));
            }

            // Step 6: time budget.
            if let Some(budget) = self.policy.time_budget {
                if self.start.elapsed() >= budget {
                    return Ok(SearchOutcome::TimedOut { stats: self.stats });
                }
            }

            // Step 7: resident-memory budget, sampled every N expansions.
            if let Some(budget_mb) = self.policy.memory_budget_mb {
                if self.stats.expansions % self.policy.memory_sample_interval == 0 {
                    if let Some(resident_mb) = self.resident_memory_mb() {
                        if resident_mb > budget_mb {
                            return Ok(SearchOutcome::OutOfMemory { stats: self.stats });
                        }
                    }
                }
            }

            // Step 8: closed-list check.
            match self.closed.check(&mut self.arena, problem, current) {
                ClosedCheck::AlreadyClosed => continue,
                ClosedCheck::Reopened { .. } => self.stats.reopened += 1,
                ClosedCheck::NotClosed => {}
            }

            // Step 9: expand.
            self.process(problem, evaluator, current);

            // Step 10: close.
            self.close_node(current);
        }
    }

    fn pop_checked(&mut self) -> Result<Option<NodeId>, SearchError> {
        if self.open.is_empty() {
            return Ok(None);
        }
        self.open.pop(&mut self.arena).map(Some).ok_or_else(|| {
            SearchError::InvariantViolation {
                detail: "open list reported non-empty but pop returned None".into(),
            }
        })
    }

    fn close_node(&mut self, id: NodeId) {
        self.arena.get_mut(id).closed = true;
        self.closed.insert(&self.arena, id);
    }

    fn process(
        &mut self,
        problem: &dyn StripsProblem,
        evaluator: &mut CompositeEvaluator,
        current: NodeId,
    ) {
        let mut applicable = Vec::new();
        let current_state = self
            .arena
            .get(current)
            .state()
            .expect("materialized before process")
            .clone();
        problem.applicable_set_v2(&current_state, &mut applicable);

        let parent_g = self.arena.get(current).g;
        let parent_g_unit = self.arena.get(current).g_unit;

        for action in applicable {
            let cost = problem.cost(&current_state, action);
            let mut successor = SearchNode::successor(parent_g, parent_g_unit, action, cost);
            successor.parent = Some(current);
            let successor_id = self.arena.insert(successor);
            self.stats.generated += 1;

            if !evaluator.evaluate(&mut self.arena, problem, successor_id) {
                self.stats.dead_ends += 1;
                continue;
            }
            self.open.push(&mut self.arena, successor_id);
        }
        self.stats.expansions += 1;
    }

    fn solved(&mut self, goal: NodeId) -> SearchOutcome {
        let ancestry = self.arena.ancestry(goal);
        let actions = ancestry
            .iter()
            .skip(1)
            .map(|&id| self.arena.get(id).action)
            .collect();
        let cost = self.arena.get(goal).g;
        SearchOutcome::Solved {
            plan: Plan { actions, cost },
            stats: self.stats,
        }
    }

    fn resident_memory_mb(&mut self) -> Option<u64> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        self.system
            .process(self.pid)
            .map(|p| p.memory() / (1024 * 1024))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::underscore_prefix_splitter;
    use crate::landmarks::GoalCountLandmarks;
    use crate::relaxed_plan::DeleteRelaxationOracle;
    use crate::novelty::NoveltyTable;
    use widthplan_kernel::model::action::Action;
    use widthplan_kernel::model::fluent::FluentId;
    use widthplan_kernel::model::state::State;

    struct Trivial;

    impl StripsProblem for Trivial {
        fn num_fluents(&self) -> usize {
            2
        }
        fn num_actions(&self) -> usize {
            1
        }
        fn fluent_signature(&self, f: FluentId) -> &str {
            if f == 0 {
                "a"
            } else {
                "b"
            }
        }
        fn action(&self, _a: ActionId) -> &Action {
            static OP: std::sync::OnceLock<Action> = std::sync::OnceLock::new();
            OP.get_or_init(|| Action::new("op", vec![0], vec![1], vec![], vec![], 1.0))
        }
        fn init(&self) -> State {
            State::from_fluents(2, vec![0])
        }
        fn is_in_goal(&self, f: FluentId) -> bool {
            f == 1
        }
    }

    fn evaluator_for(problem: &dyn StripsProblem) -> CompositeEvaluator {
        CompositeEvaluator::new(
            problem,
            Box::new(GoalCountLandmarks::from_problem(problem)),
            Box::new(DeleteRelaxationOracle),
            NoveltyTable::new(problem.num_fluents(), 1, 1024.0),
            &underscore_prefix_splitter,
            true,
        )
    }

    #[test]
    fn trivial_single_action_problem_solves_in_one_expansion() {
        let problem = Trivial;
        let mut driver = SearchDriver::new(SearchPolicy::default()).unwrap();
        let mut evaluator = evaluator_for(&problem);
        let outcome = driver.run(&problem, &mut evaluator).unwrap();
        match outcome {
            SearchOutcome::Solved { plan, stats } => {
                assert_eq!(plan.actions, vec![0]);
                assert!((plan.cost - 1.0).abs() < f32::EPSILON);
                assert_eq!(stats.expansions, 1);
                assert_eq!(stats.generated, 1);
            }
            other => panic!("expected Solved, got {other:?}"),
        }
    }

    struct DeadEnd;

    impl StripsProblem for DeadEnd {
        fn num_fluents(&self) -> usize {
            3
        }
        fn num_actions(&self) -> usize {
            1
        }
        fn fluent_signature(&self, _f: FluentId) -> &str {
            "p"
        }
        fn action(&self, _a: ActionId) -> &Action {
            static OP: std::sync::OnceLock<Action> = std::sync::OnceLock::new();
            // Adds fluent 2, a second (reachable) goal landmark: this forces
            // a strict GC decrease at the successor, so the relaxed-plan
            // gate fires there. Fluent 1, the other goal landmark, is never
            // added by any action -- the relaxed-plan oracle reports the
            // successor infeasible and it is discarded as a dead end.
            OP.get_or_init(|| Action::new("stray", vec![0], vec![2], vec![], vec![], 1.0))
        }
        fn init(&self) -> State {
            State::from_fluents(3, vec![0])
        }
        fn is_in_goal(&self, f: FluentId) -> bool {
            f == 1 || f == 2
        }
    }

    #[test]
    fn unreachable_goal_is_reported_infeasible() {
        let problem = DeadEnd;
        let mut driver = SearchDriver::new(SearchPolicy::default()).unwrap();
        let mut evaluator = evaluator_for(&problem);
        let outcome = driver.run(&problem, &mut evaluator).unwrap();
        match outcome {
            SearchOutcome::Infeasible { stats } => assert_eq!(stats.dead_ends, 1),
            other => panic!("expected Infeasible, got {other:?}"),
        }
    }
}
