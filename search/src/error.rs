//! Typed search errors.

/// Outcome of a search run that did not return a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Open list exhausted without reaching a goal, or the root itself was
    /// a relaxed-deadend.
    Infeasible,

    /// Wall-clock time budget exceeded.
    TimeBudgetExceeded { elapsed_ms: u64, budget_ms: u64 },

    /// Resident-memory budget exceeded.
    MemoryBudgetExceeded {
        resident_mb: u64,
        budget_mb: u64,
    },

    /// A configuration value is outside its supported range.
    InvalidPolicy { detail: String },

    /// An internal invariant was violated (e.g. a pop from a heap that
    /// reported itself non-empty). Always fatal; never produced by normal
    /// search progress.
    InvariantViolation { detail: String },
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Infeasible => write!(f, "no plan: open list exhausted"),
            Self::TimeBudgetExceeded {
                elapsed_ms,
                budget_ms,
            } => write!(
                f,
                "aborted: time budget exceeded ({elapsed_ms}ms elapsed, {budget_ms}ms budget)"
            ),
            Self::MemoryBudgetExceeded {
                resident_mb,
                budget_mb,
            } => write!(
                f,
                "aborted: memory budget exceeded ({resident_mb}MB resident, {budget_mb}MB budget)"
            ),
            Self::InvalidPolicy { detail } => write!(f, "invalid search policy: {detail}"),
            Self::InvariantViolation { detail } => {
                write!(f, "internal invariant violation: {detail}")
            }
        }
    }
}

impl std::error::Error for SearchError {}
