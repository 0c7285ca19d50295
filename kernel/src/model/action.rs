//! Grounded actions: precondition/add/delete sets, conditional effects, cost.

use crate::model::fluent::FluentId;
use crate::model::state::State;

/// A grounded action's dense index into `[0, num_actions())`.
pub type ActionId = u32;

/// Sentinel action index meaning "no action produced this node" (the root).
pub const NO_OP: ActionId = ActionId::MAX;

/// A conditional effect: an add/delete pair that only fires when its own
/// precondition holds in the state the unconditional effects were applied to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConditionalEffect {
    precondition: Vec<FluentId>,
    add: Vec<FluentId>,
    del: Vec<FluentId>,
}

impl ConditionalEffect {
    #[must_use]
    pub fn new(precondition: Vec<FluentId>, add: Vec<FluentId>, del: Vec<FluentId>) -> Self {
        Self {
            precondition,
            add,
            del,
        }
    }

    /// Whether this conditional effect's own precondition holds in `state`.
    #[must_use]
    pub fn can_be_applied_on(&self, state: &State) -> bool {
        self.precondition.iter().all(|&f| state.entails(f))
    }

    #[must_use]
    pub fn add_vec(&self) -> &[FluentId] {
        &self.add
    }

    #[must_use]
    pub fn del_vec(&self) -> &[FluentId] {
        &self.del
    }
}

/// A grounded STRIPS action.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Action {
    signature: String,
    precondition: Vec<FluentId>,
    add: Vec<FluentId>,
    del: Vec<FluentId>,
    conditional_effects: Vec<ConditionalEffect>,
    cost: f32,
}

impl Action {
    #[must_use]
    pub fn new(
        signature: impl Into<String>,
        precondition: Vec<FluentId>,
        add: Vec<FluentId>,
        del: Vec<FluentId>,
        conditional_effects: Vec<ConditionalEffect>,
        cost: f32,
    ) -> Self {
        Self {
            signature: signature.into(),
            precondition,
            add,
            del,
            conditional_effects,
            cost,
        }
    }

    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    #[must_use]
    pub fn precondition(&self) -> &[FluentId] {
        &self.precondition
    }

    #[must_use]
    pub fn add_vec(&self) -> &[FluentId] {
        &self.add
    }

    #[must_use]
    pub fn del_vec(&self) -> &[FluentId] {
        &self.del
    }

    #[must_use]
    pub fn ceff_vec(&self) -> &[ConditionalEffect] {
        &self.conditional_effects
    }

    #[must_use]
    pub fn has_ceff(&self) -> bool {
        !self.conditional_effects.is_empty()
    }

    #[must_use]
    pub fn cost(&self) -> f32 {
        self.cost
    }

    #[must_use]
    pub fn is_applicable(&self, state: &State) -> bool {
        self.precondition.iter().all(|&f| state.entails(f))
    }

    /// Total add set actually firing on `state`: the unconditional add set
    /// plus each conditional effect whose own precondition holds.
    #[must_use]
    pub fn effective_add(&self, state: &State) -> Vec<FluentId> {
        let mut out = self.add.clone();
        for ceff in &self.conditional_effects {
            if ceff.can_be_applied_on(state) {
                out.extend_from_slice(ceff.add_vec());
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Total delete set actually firing on `state`, same rule as [`Self::effective_add`].
    #[must_use]
    pub fn effective_del(&self, state: &State) -> Vec<FluentId> {
        let mut out = self.del.clone();
        for ceff in &self.conditional_effects {
            if ceff.can_be_applied_on(state) {
                out.extend_from_slice(ceff.del_vec());
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}
