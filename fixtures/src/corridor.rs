//! A linear corridor: a robot moves between `N` adjacent rooms.
//!
//! Fluent `i` means "the robot is in room `i`". Actions move one step
//! forward or backward, plus a no-op `wait` in every room, included so that
//! a search can revisit a room without changing state -- useful for
//! exercising the closed list's reopen-on-better-g path and the evaluator's
//! plateau handling.

use widthplan_kernel::model::action::{Action, ActionId, ConditionalEffect};
use widthplan_kernel::model::fluent::FluentId;
use widthplan_kernel::model::problem::StripsProblem;
use widthplan_kernel::model::state::State;

/// A corridor of `rooms` rooms, numbered `0..rooms`. The robot starts in
/// room 0; the goal is the last room.
pub struct Corridor {
    rooms: usize,
    signatures: Vec<String>,
    actions: Vec<Action>,
}

impl Corridor {
    /// # Panics
    ///
    /// Panics if `rooms < 2` (a corridor needs somewhere to go).
    #[must_use]
    pub fn new(rooms: usize) -> Self {
        assert!(rooms >= 2, "a corridor needs at least two rooms");
        let signatures = (0..rooms).map(|i| format!("at_room_{i}")).collect();

        let mut actions = Vec::new();
        for i in 0..rooms - 1 {
            actions.push(Action::new(
                format!("move_{i}_forward"),
                vec![i as FluentId],
                vec![(i + 1) as FluentId],
                vec![i as FluentId],
                Vec::<ConditionalEffect>::new(),
                1.0,
            ));
            actions.push(Action::new(
                format!("move_{}_backward", i + 1),
                vec![(i + 1) as FluentId],
                vec![i as FluentId],
                vec![(i + 1) as FluentId],
                Vec::<ConditionalEffect>::new(),
                1.0,
            ));
        }
        for i in 0..rooms {
            actions.push(Action::new(
                format!("wait_{i}"),
                vec![i as FluentId],
                vec![],
                vec![],
                Vec::<ConditionalEffect>::new(),
                1.0,
            ));
        }

        Self {
            rooms,
            signatures,
            actions,
        }
    }
}

impl StripsProblem for Corridor {
    fn num_fluents(&self) -> usize {
        self.rooms
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
        State::from_fluents(self.rooms, vec![0])
    }

    fn is_in_goal(&self, f: FluentId) -> bool {
        f as usize == self.rooms - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_room_zero_and_goal_is_last_room() {
        let corridor = Corridor::new(5);
        let init = corridor.init();
        assert!(init.entails(0));
        assert!(!corridor.goal(&init));
        assert!(corridor.is_in_goal(4));
    }

    #[test]
    fn forward_march_reaches_the_goal() {
        let corridor = Corridor::new(4);
        let mut state = corridor.init();
        for i in 0..3 {
            let mut applicable = Vec::new();
            corridor.applicable_set_v2(&state, &mut applicable);
            let forward = applicable
                .into_iter()
                .find(|&a| corridor.action(a).signature() == format!("move_{i}_forward"))
                .expect("forward move is applicable");
            state = corridor.next(&state, forward);
        }
        assert!(corridor.goal(&state));
    }

    #[test]
    fn wait_action_does_not_change_state() {
        let corridor = Corridor::new(3);
        let state = corridor.init();
        let mut applicable = Vec::new();
        corridor.applicable_set_v2(&state, &mut applicable);
        let wait = applicable
            .into_iter()
            .find(|&a| corridor.action(a).signature() == "wait_0")
            .expect("wait is applicable in room 0");
        assert_eq!(corridor.next(&state, wait), state);
    }
}
