//! Contract for remote synchronization primitives against the shared hub.
//!
//! A [`HubClient`] is scoped to one project/database identity at construction
//! time. The hub is shared by many independent writers, so concurrency is
//! optimistic: reservations are advisory and conflicts surface as
//! [`HubError::Conflict`] rather than being prevented at edit time.

use crate::context::RunContext;
use crate::id::{ChangesetId, ElementId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error type for hub operations.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// A reservation or merge detected concurrent remote modification.
    /// Recoverable by retrying the synchronize cycle.
    #[error("concurrent modification conflict: {0}")]
    Conflict(String),

    /// The automatic merge could not reconcile a structural conflict.
    /// Fatal to the run.
    #[error("unresolvable merge conflict: {0}")]
    UnresolvableMerge(String),

    /// The hub rejected a push after a successful merge.
    #[error("push rejected: {0}")]
    PushRejected(String),

    /// Network or transport failure talking to the hub
    #[error("hub transport error: {0}")]
    Transport(String),
}

/// An immutable, human-readable tag bound to a specific pushed changeset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedVersion {
    pub name: String,
    pub description: String,
    pub changeset_id: ChangesetId,
    pub created_at: DateTime<Utc>,
}

/// Remote synchronization primitives.
///
/// One synchronize cycle is reserve, pull-and-merge, push, in that order;
/// the generator drives the cycle and owns the retry policy. Implementations
/// only report outcomes.
#[async_trait::async_trait]
pub trait HubClient: Send + Sync {
    /// Request optimistic-concurrency reservations for every element touched
    /// in the pending local delta.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Conflict`] if another writer holds a reservation
    /// on any of the ids.
    async fn reserve_resources(
        &self,
        ctx: &RunContext,
        ids: &[ElementId],
    ) -> Result<(), HubError>;

    /// Pull the latest remote history and merge it into the local replica.
    ///
    /// Merging is automatic, remote-then-local; there is no interactive
    /// resolution.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::UnresolvableMerge`] on a structural conflict the
    /// automatic merge cannot reconcile.
    async fn pull_and_merge(&self, ctx: &RunContext) -> Result<(), HubError>;

    /// Push the merged local changes as one atomic changeset.
    ///
    /// On success the hub returns the identifier it assigned to the new
    /// changeset.
    async fn push(&self, ctx: &RunContext, description: &str) -> Result<ChangesetId, HubError>;

    /// Create a named version pointing at an already-pushed changeset.
    async fn tag_version(
        &self,
        ctx: &RunContext,
        name: &str,
        description: &str,
        changeset_id: ChangesetId,
    ) -> Result<(), HubError>;
}

impl HubError {
    /// Whether retrying the synchronize cycle can recover from this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HubError::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflicts_are_retryable() {
        assert!(HubError::Conflict("reserved elsewhere".into()).is_retryable());
        assert!(!HubError::UnresolvableMerge("schema clash".into()).is_retryable());
        assert!(!HubError::PushRejected("quota".into()).is_retryable());
        assert!(!HubError::Transport("timeout".into()).is_retryable());
    }
}
