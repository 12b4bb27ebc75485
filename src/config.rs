//! CLI and environment configuration.
//!
//! Defaults reproduce the documented default workload: 10 rounds, 20
//! elements created per round, a 2000 ms pause between pushes.

use crate::error::GeneratorError;
use crate::generator::{GeneratorOptions, TagPolicy};
use crate::plan::SequencePlan;
use clap::Parser;
use loadgen_core::RemoteIdentity;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
pub struct GeneratorOpts {
    /// Number of workload rounds to run
    #[arg(long, default_value = "10", env = "LOADGEN_ROUNDS")]
    pub rounds: i64,

    /// Elements created in each round; half are later updated and half
    /// deleted
    #[arg(long, default_value = "20", env = "LOADGEN_CREATED_PER_ROUND")]
    pub created_per_round: i64,

    /// Pause between consecutive pushes, in milliseconds
    #[arg(long, default_value = "2000", env = "LOADGEN_PUSH_DELAY_MS")]
    pub push_delay_ms: u64,

    /// Project the target database belongs to
    #[arg(long, default_value = "loadgen-project", env = "LOADGEN_PROJECT")]
    pub project: String,

    /// The versioned model database to generate changesets against
    #[arg(long, default_value = "loadgen-db", env = "LOADGEN_DATABASE")]
    pub database: String,

    /// Named-version tagging policy
    #[arg(long, value_enum, default_value_t = TagPolicy::EveryRound, env = "LOADGEN_TAG_POLICY")]
    pub tag_policy: TagPolicy,

    /// Synchronize-cycle attempts per round before the run aborts
    #[arg(long, default_value = "3", env = "LOADGEN_SYNC_ATTEMPTS")]
    pub sync_attempts: u32,

    /// Delay between conflicted synchronize attempts, in milliseconds
    #[arg(long, default_value = "500", env = "LOADGEN_SYNC_BACKOFF_MS")]
    pub sync_backoff_ms: u64,

    /// Seed for deterministic element content
    #[arg(long, default_value = "42", env = "LOADGEN_SEED")]
    pub seed: u64,
}

impl GeneratorOpts {
    /// Expand the raw parameters into the per-round workload plan.
    pub fn plan(&self) -> Result<SequencePlan, GeneratorError> {
        SequencePlan::new(
            self.rounds,
            self.created_per_round,
            Duration::from_millis(self.push_delay_ms),
        )
    }

    pub fn identity(&self) -> RemoteIdentity {
        RemoteIdentity::new(self.project.clone(), self.database.clone())
    }

    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            sync_attempts: self.sync_attempts,
            sync_backoff: Duration::from_millis(self.sync_backoff_ms),
            tag_policy: self.tag_policy,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_opts_expand_to_default_workload() {
        let opts = GeneratorOpts::parse_from(["changeset-loadgen"]);
        let plan = opts.plan().unwrap();
        assert_eq!(plan.total_rounds, 10);
        assert_eq!(plan.created_per_round, 20);
        assert_eq!(plan.updated_per_round, 10);
        assert_eq!(plan.deleted_per_round, 10);
        assert_eq!(plan.push_delay, Duration::from_millis(2000));
    }

    #[test]
    fn test_negative_rounds_rejected_at_plan_expansion() {
        let opts = GeneratorOpts::parse_from(["changeset-loadgen", "--rounds=-3"]);
        assert!(opts.plan().is_err());
    }
}
