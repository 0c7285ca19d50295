//! Composite evaluator: orders goal-count, relaxed-plan, partition
//! novelty, and lifted-feature novelty evaluation on each newly created
//! node.

use std::collections::{HashMap, HashSet};

use widthplan_kernel::model::fluent::FluentId;
use widthplan_kernel::model::problem::StripsProblem;

use crate::features::{self, FeatureTable, LiftedPredicateIndex, Splitter};
use crate::landmarks::LandmarkGraphManager;
use crate::node::{NodeArena, NodeId};
use crate::novelty::{partition_key, NoveltyTable};
use crate::policy::FeatureScope;
use crate::relaxed_plan::RelaxedPlanOracle;

/// Key under which the "global" feature table lives in `feature_tables` when
/// [`FeatureScope::Global`] is selected: every node shares this one slot.
const GLOBAL_FEATURE_TABLE_KEY: u64 = 0;

/// Owns the process-wide evaluation state for one search: the landmark
/// manager, the relaxed-plan oracle, the novelty table, and the canonical
/// feature table(s). Scoped to one engine invocation and reset on `start()`
/// (construct a fresh [`CompositeEvaluator`] per search).
pub struct CompositeEvaluator {
    landmarks: Box<dyn LandmarkGraphManager>,
    relaxed_plan: Box<dyn RelaxedPlanOracle>,
    novelty: NoveltyTable,
    lifted_index: LiftedPredicateIndex,
    feature_scope: FeatureScope,
    feature_tables: HashMap<u64, FeatureTable>,
    best_gc_so_far: u32,
    track_relaxed_plan: bool,
}

impl CompositeEvaluator {
    pub fn new(
        problem: &dyn StripsProblem,
        landmarks: Box<dyn LandmarkGraphManager>,
        relaxed_plan: Box<dyn RelaxedPlanOracle>,
        novelty: NoveltyTable,
        splitter: &Splitter,
        track_relaxed_plan: bool,
    ) -> Self {
        Self::with_feature_scope(
            problem,
            landmarks,
            relaxed_plan,
            novelty,
            splitter,
            track_relaxed_plan,
            FeatureScope::Global,
        )
    }

    /// As [`Self::new`], but with explicit control over whether the
    /// canonical feature table is shared globally or kept one-per-partition.
    pub fn with_feature_scope(
        problem: &dyn StripsProblem,
        landmarks: Box<dyn LandmarkGraphManager>,
        relaxed_plan: Box<dyn RelaxedPlanOracle>,
        novelty: NoveltyTable,
        splitter: &Splitter,
        track_relaxed_plan: bool,
        feature_scope: FeatureScope,
    ) -> Self {
        Self {
            landmarks,
            relaxed_plan,
            novelty,
            lifted_index: LiftedPredicateIndex::build(problem, splitter),
            feature_scope,
            feature_tables: HashMap::new(),
            best_gc_so_far: u32::MAX,
            track_relaxed_plan,
        }
    }

    /// Which table slot a node with partition key `partition` canonicalizes
    /// its feature vector into.
    fn feature_table_key(&self, partition: u64) -> u64 {
        match self.feature_scope {
            FeatureScope::Global => GLOBAL_FEATURE_TABLE_KEY,
            FeatureScope::Partitioned => partition,
        }
    }

    /// Evaluate the root: goal-count and feature vector only (no relaxed
    /// plan gating, no partition novelty needed — a root's `r` is always 0).
    pub fn evaluate_root(&mut self, arena: &mut NodeArena, root: NodeId) {
        let fluents = arena.get(root).state().expect("root is materialized").fluents().to_vec();
        let mut consumed = Vec::new();
        let mut unconsumed = Vec::new();
        // Path replay: the manager holds one shared mutable graph
        // across every live branch, so it must be reset to the
        // all-unachieved configuration before being driven from this node's
        // own state rather than accumulating across siblings.
        self.landmarks.reset_graph();
        self.landmarks.apply_state(&fluents, &mut consumed, &mut unconsumed);
        let gc = self.landmarks.count_unachieved();
        self.best_gc_so_far = self.best_gc_so_far.min(gc);
        let partition = partition_key(gc, 0);

        let vector = self.lifted_index.root_vector(arena.get(root).state().unwrap());
        let table_key = self.feature_table_key(partition);
        let (feat_key, occurrence) = self
            .feature_tables
            .entry(table_key)
            .or_insert_with(FeatureTable::new)
            .canonicalize(vector);

        let node = arena.get_mut(root);
        node.land_consumed = consumed;
        node.gc = gc;
        node.partition = partition;
        node.feat_ptr = Some(feat_key);
        node.alt_h1 = features::alt_h1(occurrence);
    }

    /// Run the full evaluation pipeline on `node_id`, a freshly created successor
    /// whose parent is already evaluated and materialized. Returns `false`
    /// if the node is a relaxed-deadend and must be discarded without
    /// insertion into the open list.
    pub fn evaluate(
        &mut self,
        arena: &mut NodeArena,
        problem: &dyn StripsProblem,
        node_id: NodeId,
    ) -> bool {
        arena.ensure_state(node_id, problem);

        // Step 1: landmark delta + GC. The manager is shared across every
        // live branch of a best-first search, not just one DFS path, so it
        // is reset and re-derived from this node's own state rather than
        // accumulated across unrelated siblings.
        let fluents = arena.get(node_id).state().unwrap().fluents().to_vec();
        let mut consumed = Vec::new();
        let mut unconsumed = Vec::new();
        self.landmarks.reset_graph();
        self.landmarks.apply_state(&fluents, &mut consumed, &mut unconsumed);
        let gc = self.landmarks.count_unachieved();
        if gc < self.best_gc_so_far {
            self.best_gc_so_far = gc;
            tracing::debug!(gc, "new best goal-count so far");
        }

        let parent_id = arena.get(node_id).parent;
        let parent_gc = parent_id.map_or(gc, |p| arena.get(p).gc);

        {
            let node = arena.get_mut(node_id);
            node.land_consumed = consumed;
            node.land_unconsumed = unconsumed;
            node.gc = gc;
        }

        // Step 2: relaxed plan, only if GC strictly decreased from parent.
        if self.track_relaxed_plan && gc < parent_gc {
            let state = arena.get(node_id).state().unwrap().clone();
            let mut h = 0.0_f64;
            let mut preferred = Vec::new();
            let mut plan_actions = Vec::new();
            let rp = self
                .relaxed_plan
                .eval(problem, &state, &mut h, &mut preferred, &mut plan_actions);
            match rp {
                None => {
                    arena.get_mut(node_id).relaxed_deadend = true;
                    return false;
                }
                Some(set) => {
                    let node = arena.get_mut(node_id);
                    node.rp_vec = set.iter().copied().collect();
                    node.rp_set = Some(set);
                }
            }
        }

        // Step 3: r = relevant fluents achieved along the sub-path since
        // the nearest ancestor carrying an rp-set.
        let r = rp_fluents_achieved_along_path(arena, problem, node_id);
        arena.get_mut(node_id).r = r;

        // Step 4: partition + partition novelty -> h1.
        let partition = partition_key(gc, r);
        let min_count = self.novelty.evaluate(partition, &fluents);
        {
            let node = arena.get_mut(node_id);
            node.partition = partition;
            node.m = min_count;
            node.h1 = min_count;
        }

        // Step 5: lifted-feature count -> alt_h1. Under partitioned scope the
        // parent's canonical vector lives in the parent's own partition's
        // table (it was canonicalized there when the parent was evaluated),
        // which may differ from this node's table.
        let vector = match parent_id {
            None => self.lifted_index.root_vector(arena.get(node_id).state().unwrap()),
            Some(p) => {
                let parent_table_key = self.feature_table_key(arena.get(p).partition);
                let parent_vector = arena
                    .get(p)
                    .feat_ptr
                    .map(|k| {
                        self.feature_tables
                            .get(&parent_table_key)
                            .map(|t| t.vector(k).to_vec())
                            .unwrap_or_default()
                    })
                    .unwrap_or_default();
                let parent_state = arena
                    .get(p)
                    .state()
                    .expect("ancestors are materialized before their descendants")
                    .clone();
                let action = arena.get(node_id).action;
                let added = problem.action(action).effective_add(&parent_state);
                let deleted = problem.action(action).effective_del(&parent_state);
                self.lifted_index
                    .incremental_vector(&parent_vector, &parent_state, &added, &deleted)
            }
        };
        let table_key = self.feature_table_key(partition);
        let (feat_key, occurrence) = self
            .feature_tables
            .entry(table_key)
            .or_insert_with(FeatureTable::new)
            .canonicalize(vector);
        {
            let node = arena.get_mut(node_id);
            node.feat_ptr = Some(feat_key);
            node.alt_h1 = features::alt_h1(occurrence);
        }

        true
    }

    #[must_use]
    pub fn best_gc_so_far(&self) -> u32 {
        self.best_gc_so_far
    }

    pub fn downgrade_novelty_if_over_budget(&mut self, live_partitions: usize) {
        self.novelty.downgrade_if_over_budget(live_partitions);
    }
}

/// Number of distinct fluents from the nearest ancestor's rp-set that have
/// been added by actions along the sub-path from that ancestor to `node_id`.
fn rp_fluents_achieved_along_path(
    arena: &NodeArena,
    problem: &dyn StripsProblem,
    node_id: NodeId,
) -> u32 {
    let ancestry = arena.ancestry(node_id);
    let Some(holder_idx) = ancestry.iter().rposition(|&id| arena.get(id).rp_set.is_some()) else {
        return 0;
    };
    let rp_set = arena.get(ancestry[holder_idx]).rp_set.as_ref().unwrap();

    let mut achieved: HashSet<FluentId> = HashSet::new();
    for w in (holder_idx + 1)..ancestry.len() {
        let nid = ancestry[w];
        let action = arena.get(nid).action;
        let parent_state = arena
            .get(ancestry[w - 1])
            .state()
            .expect("sub-path ancestors are materialized");
        for f in problem.action(action).effective_add(parent_state) {
            if rp_set.contains(&f) {
                achieved.insert(f);
            }
        }
    }
    achieved.len() as u32
}
