//! Open-list comparators. All variants order nodes by a lexicographic
//! key; which fields compose the key is the only thing that varies.

use std::cmp::Ordering;

use crate::node::SearchNode;

/// Ascending order: lower sorts first (pops first from a min-heap).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `Node_Comparer`: `(f, h1, g)`.
    FHG,
    /// `Node_Comparer_DH`: `(f, h1, h2)`.
    DualH,
    /// `Node_Comparer_3H`: `(h1, h2, h3)`.
    TripleH,
    /// The double-heap's alternate comparator: ranks purely by
    /// lifted-feature novelty.
    LiftedFeatureNovelty,
}

impl Comparator {
    #[must_use]
    pub fn compare(self, a: &SearchNode, b: &SearchNode) -> Ordering {
        match self {
            Self::FHG => a
                .f_cost()
                .cmp(&b.f_cost())
                .then_with(|| a.h1.cmp(&b.h1))
                .then_with(|| a.g.partial_cmp(&b.g).unwrap_or(Ordering::Equal)),
            Self::DualH => a
                .f_cost()
                .cmp(&b.f_cost())
                .then_with(|| a.h1.cmp(&b.h1))
                .then_with(|| a.h2.cmp(&b.h2)),
            Self::TripleH => a
                .h1
                .cmp(&b.h1)
                .then_with(|| a.h2.cmp(&b.h2))
                .then_with(|| a.h3.cmp(&b.h3)),
            Self::LiftedFeatureNovelty => {
                a.alt_h1.partial_cmp(&b.alt_h1).unwrap_or(Ordering::Equal)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use widthplan_kernel::model::state::State;

    fn node(h1: i64, h2: i64, h3: i64, g: f32) -> SearchNode {
        let mut n = SearchNode::root(State::from_fluents(1, vec![]));
        n.h1 = h1;
        n.h2 = h2;
        n.h3 = h3;
        n.g = g;
        n
    }

    #[test]
    fn fhg_orders_by_f_then_h1_then_g() {
        let a = node(1, 0, 0, 5.0);
        let b = node(2, 0, 0, 0.0);
        assert_eq!(Comparator::FHG.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn triple_h_ignores_g_entirely() {
        let a = node(1, 1, 1, 100.0);
        let b = node(1, 1, 1, 0.0);
        assert_eq!(Comparator::TripleH.compare(&a, &b), Ordering::Equal);
    }
}
