//! End-to-end scenarios seeded from the concrete test list: a plateau where
//! two equally-good-by-goal-count successors must be told apart by novelty,
//! and a memory-budget trip.

use widthplan_fixtures::corridor::Corridor;
use widthplan_kernel::model::action::{Action, ActionId, ConditionalEffect};
use widthplan_kernel::model::fluent::FluentId;
use widthplan_kernel::model::problem::StripsProblem;
use widthplan_kernel::model::state::State;

use widthplan_search::driver::{SearchDriver, SearchOutcome};
use widthplan_search::evaluator::CompositeEvaluator;
use widthplan_search::features::underscore_prefix_splitter;
use widthplan_search::landmarks::GoalCountLandmarks;
use widthplan_search::node::{NodeArena, SearchNode};
use widthplan_search::novelty::NoveltyTable;
use widthplan_search::open_list::comparator::Comparator;
use widthplan_search::open_list::standard::StandardOpenList;
use widthplan_search::open_list::OpenList;
use widthplan_search::policy::SearchPolicy;
use widthplan_search::relaxed_plan::DeleteRelaxationOracle;

/// A root with two sibling actions, neither of which touches the (distant,
/// unreachable-in-one-step) goal fluent, so both successors share the
/// parent's goal-count: a genuine plateau.
struct Plateau;

impl StripsProblem for Plateau {
    fn num_fluents(&self) -> usize {
        4
    }
    fn num_actions(&self) -> usize {
        2
    }
    fn fluent_signature(&self, f: FluentId) -> &str {
        match f {
            0 => "p_start",
            1 => "x_one",
            2 => "y_one",
            _ => "goal_flag",
        }
    }
    fn action(&self, a: ActionId) -> &Action {
        static TO_X: std::sync::OnceLock<Action> = std::sync::OnceLock::new();
        static TO_Y: std::sync::OnceLock<Action> = std::sync::OnceLock::new();
        match a {
            0 => TO_X.get_or_init(|| {
                Action::new("to_x", vec![0], vec![1], vec![], Vec::<ConditionalEffect>::new(), 1.0)
            }),
            1 => TO_Y.get_or_init(|| {
                Action::new("to_y", vec![0], vec![2], vec![], Vec::<ConditionalEffect>::new(), 1.0)
            }),
            _ => unreachable!(),
        }
    }
    fn init(&self) -> State {
        State::from_fluents(4, vec![0])
    }
    fn is_in_goal(&self, f: FluentId) -> bool {
        f == 3
    }
}

fn evaluator_for(problem: &dyn StripsProblem) -> CompositeEvaluator {
    CompositeEvaluator::new(
        problem,
        Box::new(GoalCountLandmarks::from_problem(problem)),
        Box::new(DeleteRelaxationOracle),
        NoveltyTable::new(problem.num_fluents(), 1, 512.0),
        &underscore_prefix_splitter,
        true,
    )
}

#[test]
fn plateau_prefers_the_successor_with_the_unseen_feature_vector() {
    let problem = Plateau;
    let mut evaluator = evaluator_for(&problem);
    let mut arena = NodeArena::new();

    let root = arena.insert(SearchNode::root(problem.init()));
    evaluator.evaluate_root(&mut arena, root);
    assert_eq!(arena.get(root).gc, 1);

    // Seed the canonical feature table with `to_y`'s resulting vector by
    // evaluating a throwaway node first, so that the real `to_y` successor
    // below is a *repeat* sighting while `to_x`'s is the first sighting.
    let mut decoy = SearchNode::successor(0.0, 0, 1, 1.0);
    decoy.parent = Some(root);
    let decoy_id = arena.insert(decoy);
    assert!(evaluator.evaluate(&mut arena, &problem, decoy_id));

    let mut via_x = SearchNode::successor(0.0, 0, 0, 1.0);
    via_x.parent = Some(root);
    let via_x_id = arena.insert(via_x);
    assert!(evaluator.evaluate(&mut arena, &problem, via_x_id));

    let mut via_y = SearchNode::successor(0.0, 0, 1, 1.0);
    via_y.parent = Some(root);
    let via_y_id = arena.insert(via_y);
    assert!(evaluator.evaluate(&mut arena, &problem, via_y_id));

    // Both successors kept GC unchanged: a genuine plateau.
    assert_eq!(arena.get(via_x_id).gc, arena.get(root).gc);
    assert_eq!(arena.get(via_y_id).gc, arena.get(root).gc);

    // `via_x`'s vector is unseen (occurrence 0, alt_h1 = -1); `via_y`'s
    // repeats the decoy's vector (occurrence 1, alt_h1 = -1/2).
    assert!(arena.get(via_x_id).alt_h1 < arena.get(via_y_id).alt_h1);

    let mut open = StandardOpenList::new(Comparator::LiftedFeatureNovelty);
    open.push(&mut arena, via_y_id);
    open.push(&mut arena, via_x_id);

    let first = open.pop(&mut arena).expect("open list is non-empty");
    assert_eq!(first, via_x_id, "the novel successor must be preferred");
}

#[test]
fn tiny_memory_budget_aborts_as_out_of_memory() {
    let problem = Corridor::new(50);
    let policy = SearchPolicy {
        memory_budget_mb: Some(1),
        memory_sample_interval: 1,
        ..SearchPolicy::default()
    };
    let mut driver = SearchDriver::new(policy).expect("valid policy");
    let mut evaluator = evaluator_for(&problem);

    let outcome = driver.run(&problem, &mut evaluator).expect("driver runs");
    assert!(
        matches!(outcome, SearchOutcome::OutOfMemory { .. }),
        "a 1MB budget must trip well before 50 corridor rooms are explored: {outcome:?}"
    );
}

#[test]
fn corridor_plan_is_sound() {
    let problem = Corridor::new(6);
    let policy = SearchPolicy::default();
    let mut driver = SearchDriver::new(policy).expect("valid policy");
    let mut evaluator = evaluator_for(&problem);

    let outcome = driver.run(&problem, &mut evaluator).expect("driver runs");
    let SearchOutcome::Solved { plan, .. } = outcome else {
        panic!("corridor should be solvable: {outcome:?}");
    };

    let mut state = problem.init();
    let mut accumulated_cost = 0.0_f32;
    for &action in &plan.actions {
        accumulated_cost += problem.cost(&state, action);
        state = problem.next(&state, action);
    }
    assert!(problem.goal(&state));
    assert!((accumulated_cost - plan.cost).abs() < f32::EPSILON);
}

#[test]
fn blocksworld_plan_is_sound() {
    use widthplan_fixtures::blocksworld::Sussman;

    let problem = Sussman::new();
    let policy = SearchPolicy::default();
    let mut driver = SearchDriver::new(policy).expect("valid policy");
    let mut evaluator = evaluator_for(&problem);

    let outcome = driver.run(&problem, &mut evaluator).expect("driver runs");
    let SearchOutcome::Solved { plan, .. } = outcome else {
        panic!("the Sussman anomaly should be solvable: {outcome:?}");
    };

    let mut state = problem.init();
    let mut accumulated_cost = 0.0_f32;
    for &action in &plan.actions {
        accumulated_cost += problem.cost(&state, action);
        state = problem.next(&state, action);
    }
    assert!(problem.goal(&state));
    assert!((accumulated_cost - plan.cost).abs() < f32::EPSILON);
}
