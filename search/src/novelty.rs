//! Partitioned novelty table.
//!
//! A partition isolates a slice of the novelty table, derived from `(GC, r)`
//! as `1000 * GC + r`. [`NO_PARTITION`] means "skip evaluation" (see
//! `crate::node::NO_PARTITION`).

use std::collections::HashMap;

use widthplan_kernel::model::fluent::FluentId;

use crate::node::NO_PARTITION;

/// Occurrence-count table over `(partition, fluent)` and, when arity 2 is
/// enabled, `(partition, fluent_pair)`.
#[derive(Debug)]
pub struct NoveltyTable {
    num_fluents: usize,
    max_arity: u8,
    arity: u8,
    memory_budget_mb: f64,
    saturate_at: Option<u32>,
    by_partition_1: HashMap<u64, Vec<u32>>,
    by_partition_2: HashMap<u64, HashMap<u64, u32>>,
}

impl NoveltyTable {
    #[must_use]
    pub fn new(num_fluents: usize, max_arity: u8, memory_budget_mb: f64) -> Self {
        Self {
            num_fluents,
            max_arity: max_arity.clamp(1, 2),
            arity: max_arity.clamp(1, 2),
            memory_budget_mb,
            saturate_at: None,
            by_partition_1: HashMap::new(),
            by_partition_2: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_saturation(mut self, cap: u32) -> Self {
        self.saturate_at = Some(cap);
        self
    }

    #[must_use]
    pub fn arity(&self) -> u8 {
        self.arity
    }

    /// Mirrors the original `set_arity`: estimate the table's memory
    /// footprint for `partition_count` live partitions and downgrade to
    /// arity 1 if the requested arity would exceed the configured budget.
    pub fn downgrade_if_over_budget(&mut self, partition_count: usize) {
        let per_entry_bytes = std::mem::size_of::<u32>() as f64;
        let size_mb_1 =
            (self.num_fluents as f64 / 1_024_000.0) * partition_count as f64 * per_entry_bytes;
        let mut size_mb = size_mb_1;
        if self.max_arity >= 2 {
            let size_mb_2 = ((self.num_fluents * self.num_fluents) as f64 / 1_024_000.0)
                * partition_count as f64
                * per_entry_bytes;
            size_mb += size_mb_2;
        }
        if self.max_arity >= 2 && size_mb > self.memory_budget_mb {
            tracing::warn!(
                estimated_mb = size_mb,
                budget_mb = self.memory_budget_mb,
                "novelty table memory budget exceeded, downgraded to arity 1"
            );
            self.arity = 1;
        } else {
            self.arity = self.max_arity;
        }
    }

    fn pair_index(&self, a: FluentId, b: FluentId) -> u64 {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        u64::from(lo) + u64::from(hi) * self.num_fluents as u64
    }

    /// Evaluate `fluents` (the node's true state) against `partition`,
    /// incrementing every visited tuple's count as a side effect and
    /// returning the minimum count seen (the width-style novelty metric).
    /// Returns `i64::MAX` for [`NO_PARTITION`] (evaluation skipped).
    pub fn evaluate(&mut self, partition: u64, fluents: &[FluentId]) -> i64 {
        if partition == NO_PARTITION {
            return i64::MAX;
        }

        let mut min_count = u32::MAX;
        let num_fluents = self.num_fluents;
        let table1 = self
            .by_partition_1
            .entry(partition)
            .or_insert_with(|| vec![0u32; num_fluents]);
        for &f in fluents {
            let idx = f as usize;
            let count = table1[idx];
            min_count = min_count.min(count);
            table1[idx] = Self::bump(count, self.saturate_at);
        }

        if self.arity >= 2 {
            let table2 = self.by_partition_2.entry(partition).or_default();
            for i in 0..fluents.len() {
                for j in (i + 1)..fluents.len() {
                    let (a, b) = (fluents[i], fluents[j]);
                    if a == b {
                        continue;
                    }
                    let idx = self.pair_index(a, b);
                    let count = *table2.get(&idx).unwrap_or(&0);
                    min_count = min_count.min(count);
                    table2.insert(idx, Self::bump(count, self.saturate_at));
                }
            }
        }

        i64::from(min_count)
    }

    fn bump(count: u32, saturate_at: Option<u32>) -> u32 {
        match saturate_at {
            Some(cap) => count.saturating_add(1).min(cap),
            None => count.saturating_add(1),
        }
    }
}

/// Derive the partition key from goal-count and relevant-fluent counter.
/// Assumes `r < 1000`; domains with wider `r` ranges should use a pair key
/// instead.
#[must_use]
pub fn partition_key(gc: u32, r: u32) -> u64 {
    1000 * u64::from(gc) + u64::from(r)
}

/// Count-based novelty metric variant: always in `(-1, 0]`, lower = more
/// novel.
#[must_use]
pub fn count_based_metric(min_count: i64) -> f64 {
    -1.0 / (1.0 + min_count as f64)
}
