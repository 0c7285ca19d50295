//! A three-block "Sussman anomaly" blocksworld, the classical example of a
//! goal-ordering trap for non-interleaved planners.
//!
//! Blocks `a`, `b`, `c` start as `on(c, a)`, `ontable(a)`, `ontable(b)`,
//! `clear(b)`, `clear(c)`, arm empty. The goal is `on(a, b)` and `on(b, c)`:
//! achieving either literal first and defending it undoes progress toward
//! the other, which is exactly the kind of interaction width-based search
//! (rather than a single subgoal-serialization heuristic) is meant to
//! handle gracefully.

use std::collections::HashMap;

use widthplan_kernel::model::action::{Action, ActionId, ConditionalEffect};
use widthplan_kernel::model::fluent::FluentId;
use widthplan_kernel::model::problem::StripsProblem;
use widthplan_kernel::model::state::State;

const BLOCKS: [&str; 3] = ["a", "b", "c"];

pub struct Sussman {
    signatures: Vec<String>,
    actions: Vec<Action>,
    init: Vec<FluentId>,
    goal: Vec<FluentId>,
}

impl Sussman {
    #[must_use]
    pub fn new() -> Self {
        let mut signatures = Vec::new();
        let mut index = HashMap::new();

        let mut intern = |name: String, signatures: &mut Vec<String>| -> FluentId {
            let id = signatures.len() as FluentId;
            signatures.push(name);
            id
        };

        for &x in &BLOCKS {
            for &y in &BLOCKS {
                if x != y {
                    let id = intern(format!("on_{x}_{y}"), &mut signatures);
                    index.insert(format!("on_{x}_{y}"), id);
                }
            }
        }
        for &x in &BLOCKS {
            let id = intern(format!("ontable_{x}"), &mut signatures);
            index.insert(format!("ontable_{x}"), id);
        }
        for &x in &BLOCKS {
            let id = intern(format!("clear_{x}"), &mut signatures);
            index.insert(format!("clear_{x}"), id);
        }
        for &x in &BLOCKS {
            let id = intern(format!("holding_{x}"), &mut signatures);
            index.insert(format!("holding_{x}"), id);
        }
        let armempty = intern("armempty".to_string(), &mut signatures);
        index.insert("armempty".to_string(), armempty);

        let f = |key: &str| index[key];

        let mut actions = Vec::new();
        for &x in &BLOCKS {
            actions.push(Action::new(
                format!("pickup_{x}"),
                vec![f(&format!("ontable_{x}")), f(&format!("clear_{x}")), armempty],
                vec![f(&format!("holding_{x}"))],
                vec![f(&format!("ontable_{x}")), f(&format!("clear_{x}")), armempty],
                Vec::<ConditionalEffect>::new(),
                1.0,
            ));
            actions.push(Action::new(
                format!("putdown_{x}"),
                vec![f(&format!("holding_{x}"))],
                vec![f(&format!("ontable_{x}")), f(&format!("clear_{x}")), armempty],
                vec![f(&format!("holding_{x}"))],
                Vec::<ConditionalEffect>::new(),
                1.0,
            ));
        }
        for &x in &BLOCKS {
            for &y in &BLOCKS {
                if x == y {
                    continue;
                }
                actions.push(Action::new(
                    format!("stack_{x}_{y}"),
                    vec![f(&format!("holding_{x}")), f(&format!("clear_{y}"))],
                    vec![f(&format!("on_{x}_{y}")), f(&format!("clear_{x}")), armempty],
                    vec![f(&format!("holding_{x}")), f(&format!("clear_{y}"))],
                    Vec::<ConditionalEffect>::new(),
                    1.0,
                ));
                actions.push(Action::new(
                    format!("unstack_{x}_{y}"),
                    vec![f(&format!("on_{x}_{y}")), f(&format!("clear_{x}")), armempty],
                    vec![f(&format!("holding_{x}")), f(&format!("clear_{y}"))],
                    vec![f(&format!("on_{x}_{y}")), f(&format!("clear_{x}")), armempty],
                    Vec::<ConditionalEffect>::new(),
                    1.0,
                ));
            }
        }

        let init = vec![
            f("ontable_a"),
            f("ontable_b"),
            f("on_c_a"),
            f("clear_b"),
            f("clear_c"),
            armempty,
        ];
        let goal = vec![f("on_a_b"), f("on_b_c")];

        Self {
            signatures,
            actions,
            init,
            goal,
        }
    }
}

impl Default for Sussman {
    fn default() -> Self {
        Self::new()
    }
}

impl StripsProblem for Sussman {
    fn num_fluents(&self) -> usize {
        self.signatures.len()
    }

    fn num_actions(&self) -> usize {
        self.actions.len()
    }

    fn fluent_signature(&self, f: FluentId) -> &str {
        &self.signatures[f as usize]
    }

    fn action(&self, a: ActionId) -> &Action {
        &self.actions[a as usize]
    }

    fn init(&self) -> State {
        State::from_fluents(self.num_fluents(), self.init.clone())
    }

    fn is_in_goal(&self, f: FluentId) -> bool {
        self.goal.contains(&f)
    }
}
