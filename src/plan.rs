//! Per-round workload plan derived from a small set of parameters.

use crate::error::GeneratorError;
use std::time::Duration;

/// Expansion of the workload parameters into per-round counts.
///
/// Pure value type, no I/O. Given `created_per_round = N`, updated and
/// deleted are both `N / 2` with integer (floor) division: for odd `N` one
/// element per round is neither updated nor deleted. Existing fixtures
/// depend on that exact expansion, so it is reproduced rather than derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePlan {
    /// Number of workload rounds to run
    pub total_rounds: u32,
    /// Elements created in each round
    pub created_per_round: u32,
    /// Elements updated in each round, drawn from earlier rounds
    pub updated_per_round: u32,
    /// Elements deleted in each round, disjoint from the update set
    pub deleted_per_round: u32,
    /// Pause between consecutive pushes, pacing requests against the hub
    pub push_delay: Duration,
}

impl SequencePlan {
    /// Build a plan from raw parameters.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidPlan`] for negative counts. Rejected
    /// before any I/O happens.
    pub fn new(
        total_rounds: i64,
        created_per_round: i64,
        push_delay: Duration,
    ) -> Result<Self, GeneratorError> {
        if total_rounds < 0 {
            return Err(GeneratorError::InvalidPlan(format!(
                "total rounds must be non-negative, got {total_rounds}"
            )));
        }
        if created_per_round < 0 {
            return Err(GeneratorError::InvalidPlan(format!(
                "created per round must be non-negative, got {created_per_round}"
            )));
        }
        let created_per_round = u32::try_from(created_per_round)
            .map_err(|_| GeneratorError::InvalidPlan("created per round too large".into()))?;
        let total_rounds = u32::try_from(total_rounds)
            .map_err(|_| GeneratorError::InvalidPlan("total rounds too large".into()))?;

        Ok(Self {
            total_rounds,
            created_per_round,
            updated_per_round: created_per_round / 2,
            deleted_per_round: created_per_round / 2,
            push_delay,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_counts_halve_exactly() {
        for n in [0i64, 2, 4, 20, 1000] {
            let plan = SequencePlan::new(1, n, Duration::ZERO).unwrap();
            assert_eq!(plan.updated_per_round as i64, n / 2);
            assert_eq!(plan.deleted_per_round as i64, n / 2);
        }
    }

    #[test]
    fn test_default_workload_expansion() {
        // The documented default workload: 10 created, 5 updated, 5 deleted
        let plan = SequencePlan::new(10, 10, Duration::from_millis(2000)).unwrap();
        assert_eq!(plan.updated_per_round, 5);
        assert_eq!(plan.deleted_per_round, 5);
    }

    #[test]
    fn test_odd_counts_floor() {
        // One element per round stays untouched when the count is odd
        let plan = SequencePlan::new(1, 7, Duration::ZERO).unwrap();
        assert_eq!(plan.updated_per_round, 3);
        assert_eq!(plan.deleted_per_round, 3);
    }

    #[test]
    fn test_negative_counts_rejected() {
        assert!(matches!(
            SequencePlan::new(-1, 10, Duration::ZERO),
            Err(GeneratorError::InvalidPlan(_))
        ));
        assert!(matches!(
            SequencePlan::new(10, -1, Duration::ZERO),
            Err(GeneratorError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_zero_rounds_is_a_valid_plan() {
        let plan = SequencePlan::new(0, 0, Duration::ZERO).unwrap();
        assert_eq!(plan.total_rounds, 0);
        assert_eq!(plan.created_per_round, 0);
    }
}
