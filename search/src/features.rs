//! Lifted-feature counter.
//!
//! Maps every fluent to a lifted-predicate index and counts occurrences of
//! full feature vectors across the search, so that the composite evaluator
//! can reward nodes whose structural signature has not been seen before.

use std::collections::HashMap;

use widthplan_kernel::model::fluent::FluentId;
use widthplan_kernel::model::problem::StripsProblem;
use widthplan_kernel::model::state::State;

use crate::node::FeatureKey;

/// Derives a lifted-predicate string from a fluent's ground signature.
///
/// Deliberately pluggable: the obvious "split on `_`, take the prefix"
/// convention misclassifies any domain whose object names themselves
/// contain underscores. Callers must choose a splitter that matches their
/// fluent naming convention rather than rely on a guessed default.
pub type Splitter = dyn Fn(&str) -> String;

/// The naive default splitter: first `_`-delimited token. Adequate for toy
/// fixtures; real domains should supply their own.
#[must_use]
pub fn underscore_prefix_splitter(signature: &str) -> String {
    signature.split('_').next().unwrap_or(signature).to_string()
}

/// Fluent → lifted-predicate index table, built once per problem.
#[derive(Debug, Clone)]
pub struct LiftedPredicateIndex {
    fluent_to_lifted: Vec<u32>,
    num_lifted: usize,
}

impl LiftedPredicateIndex {
    pub fn build(problem: &dyn StripsProblem, splitter: &Splitter) -> Self {
        let mut names: Vec<String> = Vec::new();
        let mut index_of: HashMap<String, u32> = HashMap::new();
        let mut fluent_to_lifted = vec![0u32; problem.num_fluents()];
        for f in 0..problem.num_fluents() as u32 {
            let lifted = splitter(problem.fluent_signature(f));
            let idx = *index_of.entry(lifted.clone()).or_insert_with(|| {
                names.push(lifted.clone());
                (names.len() - 1) as u32
            });
            fluent_to_lifted[f as usize] = idx;
        }
        Self {
            fluent_to_lifted,
            num_lifted: names.len(),
        }
    }

    #[must_use]
    pub fn num_lifted(&self) -> usize {
        self.num_lifted
    }

    fn vector_from_fluents(&self, fluents: &[FluentId]) -> Vec<u32> {
        let mut v = vec![0u32; self.num_lifted];
        for &f in fluents {
            v[self.fluent_to_lifted[f as usize] as usize] += 1;
        }
        v
    }

    #[must_use]
    pub fn root_vector(&self, state: &State) -> Vec<u32> {
        self.vector_from_fluents(state.fluents())
    }

    /// Build a node's feature vector from its parent's canonical vector,
    /// considering only fluents truly new (not already entailed by
    /// `parent_state`) or truly removed (entailed by `parent_state`, not
    /// re-added). Duplicates within `added`/`deleted` are collapsed first.
    #[must_use]
    pub fn incremental_vector(
        &self,
        parent_vector: &[u32],
        parent_state: &State,
        added: &[FluentId],
        deleted: &[FluentId],
    ) -> Vec<u32> {
        let mut added_dedup: Vec<FluentId> = added
            .iter()
            .copied()
            .filter(|f| !parent_state.entails(*f))
            .collect();
        added_dedup.sort_unstable();
        added_dedup.dedup();

        let mut deleted_dedup: Vec<FluentId> = deleted
            .iter()
            .copied()
            .filter(|f| parent_state.entails(*f))
            .collect();
        deleted_dedup.sort_unstable();
        deleted_dedup.dedup();

        let mut v = parent_vector.to_vec();
        for &f in &deleted_dedup {
            let idx = self.fluent_to_lifted[f as usize] as usize;
            v[idx] = v[idx].saturating_sub(1);
        }
        for &f in &added_dedup {
            let idx = self.fluent_to_lifted[f as usize] as usize;
            v[idx] = v[idx].saturating_add(1);
        }
        v
    }
}

/// Canonical table of feature vectors: owns one copy of every distinct
/// vector seen and counts occurrences.
#[derive(Debug, Default)]
pub struct FeatureTable {
    vectors: Vec<Vec<u32>>,
    occurrence: HashMap<Vec<u32>, (FeatureKey, u8)>,
}

impl FeatureTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            vectors: Vec::new(),
            occurrence: HashMap::new(),
        }
    }

    #[must_use]
    pub fn vector(&self, key: FeatureKey) -> &[u32] {
        &self.vectors[key as usize]
    }

    /// Canonicalize `vector`: if seen before, return its key and the prior
    /// occurrence count (then bump, saturating at 255); if new, insert with
    /// count 1 and return occurrence 0.
    pub fn canonicalize(&mut self, vector: Vec<u32>) -> (FeatureKey, u8) {
        if let Some(&(key, count)) = self.occurrence.get(&vector) {
            let next = count.saturating_add(1).min(255);
            self.occurrence.insert(vector, (key, next));
            (key, count)
        } else {
            let key = self.vectors.len() as FeatureKey;
            self.vectors.push(vector.clone());
            self.occurrence.insert(vector, (key, 1));
            (key, 0)
        }
    }
}

/// `-1/(1+occurrence)`, always in `(-1, 0]`; lower = more novel.
#[must_use]
pub fn alt_h1(occurrence: u8) -> f64 {
    -1.0 / (1.0 + f64::from(occurrence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use widthplan_kernel::model::action::{Action, ActionId};

    struct Toy;

    impl StripsProblem for Toy {
        fn num_fluents(&self) -> usize {
            4
        }
        fn num_actions(&self) -> usize {
            0
        }
        fn fluent_signature(&self, f: FluentId) -> &str {
            match f {
                0 => "at_room1",
                1 => "at_room2",
                2 => "holding_ball1",
                _ => "holding_ball2",
            }
        }
        fn action(&self, _a: ActionId) -> &Action {
            unimplemented!()
        }
        fn init(&self) -> State {
            State::from_fluents(4, vec![0])
        }
        fn is_in_goal(&self, _f: FluentId) -> bool {
            false
        }
    }

    #[test]
    fn underscore_prefix_splitter_groups_same_predicate() {
        assert_eq!(underscore_prefix_splitter("at_room1"), "at");
        assert_eq!(underscore_prefix_splitter("at_room2"), "at");
        assert_eq!(underscore_prefix_splitter("holding_ball1"), "holding");
    }

    #[test]
    fn lifted_index_groups_at_fluents_together() {
        let idx = LiftedPredicateIndex::build(&Toy, &underscore_prefix_splitter);
        assert_eq!(idx.num_lifted(), 2); // "at", "holding"
        let v = idx.root_vector(&State::from_fluents(4, vec![0, 1]));
        assert_eq!(v.iter().sum::<u32>(), 2);
    }

    #[test]
    fn incremental_vector_matches_rebuild_from_scratch() {
        let idx = LiftedPredicateIndex::build(&Toy, &underscore_prefix_splitter);
        let parent_state = State::from_fluents(4, vec![0]);
        let parent_vector = idx.root_vector(&parent_state);

        let child_state = State::from_fluents(4, vec![1, 2]);
        let incremental = idx.incremental_vector(&parent_vector, &parent_state, &[1, 2], &[0]);
        let rebuilt = idx.root_vector(&child_state);
        assert_eq!(incremental, rebuilt);
    }

    #[test]
    fn incremental_vector_ignores_already_true_adds() {
        let idx = LiftedPredicateIndex::build(&Toy, &underscore_prefix_splitter);
        let parent_state = State::from_fluents(4, vec![0]);
        let parent_vector = idx.root_vector(&parent_state);
        // "adding" fluent 0 again (already true) must not double-count.
        let v = idx.incremental_vector(&parent_vector, &parent_state, &[0], &[]);
        assert_eq!(v, parent_vector);
    }

    #[test]
    fn canonicalize_first_sighting_is_occurrence_zero() {
        let mut table = FeatureTable::new();
        let (key, occ) = table.canonicalize(vec![1, 0]);
        assert_eq!(occ, 0);
        assert_eq!(table.vector(key), &[1, 0]);
    }

    #[test]
    fn canonicalize_repeat_sighting_returns_prior_count() {
        let mut table = FeatureTable::new();
        let (k1, o1) = table.canonicalize(vec![1, 0]);
        let (k2, o2) = table.canonicalize(vec![1, 0]);
        assert_eq!(k1, k2);
        assert_eq!(o1, 0);
        assert_eq!(o2, 1);
    }

    #[test]
    fn alt_h1_is_always_in_minus_one_to_zero() {
        assert!((alt_h1(0) - -1.0).abs() < f64::EPSILON);
        assert!(alt_h1(255) > -1.0 && alt_h1(255) <= 0.0);
    }
}
