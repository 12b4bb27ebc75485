//! Synthetic changeset workload generator for a shared versioned model hub.
//!
//! The generator exercises a hub's change-synchronization path under a
//! realistic usage pattern: repeated rounds of element creation, mutation,
//! and deletion, each round committed on a local replica and then driven
//! through the pull-merge-push protocol against the shared remote history,
//! with conflict handling, pacing, and periodic named-version tagging.
//!
//! # Architecture
//!
//! ```text
//! SequencePlan ──┐
//!                ├──> ChangesetGenerator ──> DbGateway   (local replica)
//! RemoteIdentity ┘            │
//!                             └────────────> HubClient   (shared hub)
//! ```
//!
//! - [`plan::SequencePlan`] expands the workload parameters into per-round
//!   created/updated/deleted counts. Pure, no I/O.
//! - [`generator::ChangesetGenerator`] bootstraps the fixture idempotently,
//!   then runs strictly sequential rounds, one synchronize cycle each.
//! - The collaborator contracts live in the `loadgen-core` crate; the
//!   [`testing`] module provides in-memory implementations of both, used by
//!   the CLI for self-contained runs and by the integration tests with
//!   failure injection.
//!
//! Correctness is judged by the sequence of changesets reproduced against
//! the hub contract, not by throughput.

pub mod config;
pub mod error;
pub mod fixture;
pub mod generator;
pub mod plan;
pub mod testing;

pub use config::GeneratorOpts;
pub use error::GeneratorError;
pub use fixture::{Fixture, ProvisionOutcome};
pub use generator::{ChangesetGenerator, GeneratorOptions, RoundResult, RunSummary, TagPolicy};
pub use plan::SequencePlan;
