//! Orchestration of workload rounds against the shared hub.
//!
//! [`ChangesetGenerator`] owns the full run: one idempotent fixture
//! bootstrap, then `total_rounds` strictly sequential rounds of
//! create/update/delete, each committed locally and synchronized through the
//! pull-merge-push protocol before the next round starts. The hub is shared
//! with other writers, so every cycle goes through optimistic reservations
//! and a bounded conflict-retry loop.

use crate::error::GeneratorError;
use crate::fixture::{self, Fixture};
use crate::plan::SequencePlan;
use loadgen_core::{
    CategoryId, ChangesetId, DbGateway, ElementId, ElementSpec, HubClient, HubError,
    RemoteIdentity, RunContext,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// When named versions are tagged during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TagPolicy {
    /// Never create named versions
    Never,
    /// Tag every successfully pushed round
    EveryRound,
    /// Tag only the final round of the sequence
    SequenceEnd,
}

impl TagPolicy {
    /// Name and description of the version to tag after round `index`,
    /// if this policy wants one.
    fn tag_for(&self, index: u32, total_rounds: u32) -> Option<(String, String)> {
        match self {
            TagPolicy::Never => None,
            TagPolicy::EveryRound => Some((
                format!("round-{index}"),
                format!("Workload round {index} of {total_rounds}"),
            )),
            TagPolicy::SequenceEnd if index + 1 == total_rounds => Some((
                "final".to_string(),
                format!("Final round of a {total_rounds}-round sequence"),
            )),
            TagPolicy::SequenceEnd => None,
        }
    }
}

/// Tunables that are policy rather than plan: retry budget, backoff,
/// tagging, and the seed for generated element content.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Synchronize-cycle attempts per round before the run aborts
    pub sync_attempts: u32,
    /// Fixed delay between conflicted cycle attempts
    pub sync_backoff: Duration,
    /// Named-version tagging policy
    pub tag_policy: TagPolicy,
    /// Seed for deterministic element payloads
    pub seed: u64,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            sync_attempts: 3,
            sync_backoff: Duration::from_millis(500),
            tag_policy: TagPolicy::EveryRound,
            seed: 42,
        }
    }
}

/// Outcome of one fully synchronized round.
#[derive(Debug, Clone, Serialize)]
pub struct RoundResult {
    pub index: u32,
    pub created_ids: Vec<ElementId>,
    pub updated_ids: Vec<ElementId>,
    pub deleted_ids: Vec<ElementId>,
    /// Identifier the hub assigned to this round's changeset
    pub changeset_id: ChangesetId,
}

/// In-memory record of a whole run. The hub is the durable owner of the
/// changeset history; this is advisory output for the caller.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub rounds: Vec<RoundResult>,
    pub tagged_versions: Vec<String>,
}

impl RunSummary {
    pub fn changesets_pushed(&self) -> usize {
        self.rounds.len()
    }
}

/// Lifecycle of the generator itself. Operations other than initialization
/// are rejected outside `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Initializing,
    Ready(Fixture),
    Failed,
}

/// States of one synchronize cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncState {
    Idle,
    ReservingResources,
    Merging,
    Pushing,
    Done,
    Failed,
}

impl SyncState {
    fn as_str(&self) -> &'static str {
        match self {
            SyncState::Idle => "idle",
            SyncState::ReservingResources => "reserving_resources",
            SyncState::Merging => "merging",
            SyncState::Pushing => "pushing",
            SyncState::Done => "done",
            SyncState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn advance(ctx: &RunContext, state: &mut SyncState, next: SyncState) {
    tracing::debug!(%ctx, from = %state, to = %next, "synchronize cycle transition");
    *state = next;
}

/// Cleanup changeset pushed during bootstrap. It stands in for the first
/// workload round, which then skips its baseline create.
#[derive(Debug, Clone)]
struct CleanupRound {
    deleted_ids: Vec<ElementId>,
    changeset_id: ChangesetId,
}

/// The orchestration state machine driving the workload.
///
/// Collaborators are injected at construction; use
/// [`crate::testing::in_memory_collaborators`] for the default self-contained
/// pair. One generator instance drives one local replica and must not be
/// shared across runs against different targets.
pub struct ChangesetGenerator {
    gateway: Arc<dyn DbGateway>,
    hub: Arc<dyn HubClient>,
    identity: RemoteIdentity,
    options: GeneratorOptions,
    state: Lifecycle,
    /// Cleanup pushed during bootstrap, not yet consumed as a round
    cleanup: Option<CleanupRound>,
    /// Live elements created by earlier rounds, in creation order
    pool: Vec<ElementId>,
    rng: StdRng,
}

impl ChangesetGenerator {
    pub fn new(
        gateway: Arc<dyn DbGateway>,
        hub: Arc<dyn HubClient>,
        identity: RemoteIdentity,
        options: GeneratorOptions,
    ) -> Self {
        let rng = StdRng::seed_from_u64(options.seed);
        Self {
            gateway,
            hub,
            identity,
            options,
            state: Lifecycle::Uninitialized,
            cleanup: None,
            pool: Vec::new(),
            rng,
        }
    }

    /// Whether the generator has completed its bootstrap.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, Lifecycle::Ready(_))
    }

    /// Bootstrap the fixture and publish the baseline.
    ///
    /// Idempotent: calling this on an already-initialized generator does
    /// nothing, and re-running against an already-provisioned replica
    /// performs zero creates and zero pushes.
    pub async fn initialize(&mut self, ctx: &RunContext) -> Result<(), GeneratorError> {
        match self.state {
            Lifecycle::Ready(_) => return Ok(()),
            Lifecycle::Initializing => {
                return Err(GeneratorError::NotReady(
                    "initialization already in progress".into(),
                ))
            }
            Lifecycle::Failed => {
                return Err(GeneratorError::NotReady(
                    "a previous initialization failed".into(),
                ))
            }
            Lifecycle::Uninitialized => {}
        }

        self.state = Lifecycle::Initializing;
        match self.bootstrap(ctx).await {
            Ok(fixture) => {
                self.state = Lifecycle::Ready(fixture);
                tracing::info!(%ctx, target = %self.identity, "generator initialized");
                Ok(())
            }
            Err(err) => {
                self.state = Lifecycle::Failed;
                Err(err)
            }
        }
    }

    /// Run the whole sequence: bootstrap if needed, then one synchronized
    /// round per plan entry.
    ///
    /// Rounds already pushed stay on the hub when a later round fails; the
    /// run is not transactional across rounds.
    pub async fn generate(
        &mut self,
        ctx: &RunContext,
        plan: &SequencePlan,
    ) -> Result<RunSummary, GeneratorError> {
        if matches!(self.state, Lifecycle::Uninitialized) {
            self.initialize(ctx).await?;
        }
        let fixture = match self.state {
            Lifecycle::Ready(fixture) => fixture,
            _ => {
                return Err(GeneratorError::NotReady(
                    "generator must be initialized before generating changesets".into(),
                ))
            }
        };

        tracing::info!(
            %ctx,
            target = %self.identity,
            rounds = plan.total_rounds,
            created_per_round = plan.created_per_round,
            "starting changeset sequence"
        );

        let mut summary = RunSummary::default();
        for index in 0..plan.total_rounds {
            // A cleanup changeset pushed during bootstrap substitutes for
            // the first workload round: its deletions are the round's delta
            // and no baseline create happens.
            let round = match self.cleanup.take() {
                Some(cleanup) => {
                    tracing::info!(
                        %ctx,
                        round = index,
                        changeset = %cleanup.changeset_id,
                        "cleanup changeset stands in for this round"
                    );
                    RoundResult {
                        index,
                        created_ids: Vec::new(),
                        updated_ids: Vec::new(),
                        deleted_ids: cleanup.deleted_ids,
                        changeset_id: cleanup.changeset_id,
                    }
                }
                None => self.run_round(ctx, plan, fixture, index).await?,
            };
            tracing::info!(
                %ctx,
                round = index,
                changeset = %round.changeset_id,
                "round synchronized"
            );

            if let Some((name, description)) = self.options.tag_policy.tag_for(index, plan.total_rounds)
            {
                self.hub
                    .tag_version(ctx, &name, &description, round.changeset_id)
                    .await
                    .map_err(|err| GeneratorError::Tag(err.to_string()))?;
                tracing::info!(%ctx, version = %name, "tagged named version");
                summary.tagged_versions.push(name);
            }
            summary.rounds.push(round);

            // Deliberate pacing against the shared hub, not an incidental sleep
            if index + 1 < plan.total_rounds {
                tokio::time::sleep(plan.push_delay).await;
            }
        }

        tracing::info!(
            %ctx,
            pushed = summary.changesets_pushed(),
            "changeset sequence complete"
        );
        Ok(summary)
    }

    /// Provision the fixture and, when needed, publish the baseline and the
    /// cleanup changeset before any workload round runs.
    async fn bootstrap(&mut self, ctx: &RunContext) -> Result<Fixture, GeneratorError> {
        let outcome = fixture::provision(ctx, self.gateway.as_ref()).await?;

        if outcome.needs_pre_push {
            self.gateway
                .commit(ctx, "Provisioned workload fixture")
                .await
                .map_err(GeneratorError::Bootstrap)?;
            self.synchronize(ctx, &[], "Baseline fixture").await?;
            tracing::info!(%ctx, "published baseline fixture");
        }

        if !outcome.stale_elements.is_empty() {
            fixture::delete_stale_elements(ctx, self.gateway.as_ref(), &outcome.stale_elements)
                .await
                .map_err(GeneratorError::Bootstrap)?;
            let description = format!(
                "Removed {} stale elements from a previous run",
                outcome.stale_elements.len()
            );
            self.gateway
                .commit(ctx, &description)
                .await
                .map_err(GeneratorError::Bootstrap)?;
            let changeset_id = self
                .synchronize(ctx, &outcome.stale_elements, &description)
                .await?;
            tracing::info!(%ctx, changeset = %changeset_id, "pushed cleanup changeset");
            // Held back so the next round loop can consume it as its first
            // round instead of pushing a baseline create of its own
            self.cleanup = Some(CleanupRound {
                deleted_ids: outcome.stale_elements,
                changeset_id,
            });
        }

        Ok(outcome.fixture)
    }

    /// Apply one round's mutations, commit them locally, and synchronize.
    async fn run_round(
        &mut self,
        ctx: &RunContext,
        plan: &SequencePlan,
        fixture: Fixture,
        index: u32,
    ) -> Result<RoundResult, GeneratorError> {
        // Update/delete targets come from strictly earlier rounds, chosen
        // earliest-created-first and disjoint from each other. A pool smaller
        // than the plan only shrinks the effective delta.
        let update_count = (plan.updated_per_round as usize).min(self.pool.len());
        let delete_count =
            (plan.deleted_per_round as usize).min(self.pool.len() - update_count);
        let updated_ids: Vec<ElementId> = self.pool.iter().take(update_count).copied().collect();
        let deleted_ids: Vec<ElementId> = self
            .pool
            .iter()
            .skip(update_count)
            .take(delete_count)
            .copied()
            .collect();

        let mut created_ids = Vec::with_capacity(plan.created_per_round as usize);
        for seq in 0..plan.created_per_round {
            let spec = self.element_spec(format!("element-r{index}-{seq}"), fixture.category);
            let id = self
                .gateway
                .create_element(ctx, fixture.container, &spec)
                .await?;
            created_ids.push(id);
        }

        for (seq, id) in updated_ids.iter().enumerate() {
            let spec = self.element_spec(format!("element-r{index}-u{seq}"), fixture.category);
            self.gateway.update_element(ctx, *id, &spec).await?;
        }

        for id in &deleted_ids {
            self.gateway.delete_element(ctx, *id).await?;
        }

        let gone: HashSet<ElementId> = deleted_ids.iter().copied().collect();
        self.pool.retain(|id| !gone.contains(id));
        self.pool.extend(created_ids.iter().copied());

        let description = format!(
            "Round {index}: created {}, updated {}, deleted {}",
            created_ids.len(),
            updated_ids.len(),
            deleted_ids.len()
        );
        self.gateway.commit(ctx, &description).await?;

        let mut touched =
            Vec::with_capacity(created_ids.len() + updated_ids.len() + deleted_ids.len());
        touched.extend_from_slice(&created_ids);
        touched.extend_from_slice(&updated_ids);
        touched.extend_from_slice(&deleted_ids);

        let changeset_id = self.synchronize(ctx, &touched, &description).await?;

        Ok(RoundResult {
            index,
            created_ids,
            updated_ids,
            deleted_ids,
            changeset_id,
        })
    }

    /// Drive the pull-merge-push protocol for one pending delta, retrying
    /// conflicted cycles up to the configured attempt budget.
    async fn synchronize(
        &self,
        ctx: &RunContext,
        touched: &[ElementId],
        description: &str,
    ) -> Result<ChangesetId, GeneratorError> {
        let budget = self.options.sync_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.sync_cycle(ctx, touched, description).await {
                Ok(id) => return Ok(id),
                Err(err) if err.is_retryable() && attempt < budget => {
                    tracing::warn!(
                        %ctx,
                        attempt,
                        budget,
                        error = %err,
                        "synchronize cycle conflicted, retrying"
                    );
                    tokio::time::sleep(self.options.sync_backoff).await;
                }
                Err(err) => return Err(GeneratorError::from_hub(err, attempt)),
            }
        }
    }

    /// One pass of the cycle state machine:
    /// `Idle -> ReservingResources -> Merging -> Pushing -> Done | Failed`.
    async fn sync_cycle(
        &self,
        ctx: &RunContext,
        touched: &[ElementId],
        description: &str,
    ) -> Result<ChangesetId, HubError> {
        let mut state = SyncState::Idle;

        advance(ctx, &mut state, SyncState::ReservingResources);
        if let Err(err) = self.hub.reserve_resources(ctx, touched).await {
            advance(ctx, &mut state, SyncState::Failed);
            return Err(err);
        }

        advance(ctx, &mut state, SyncState::Merging);
        if let Err(err) = self.hub.pull_and_merge(ctx).await {
            advance(ctx, &mut state, SyncState::Failed);
            return Err(err);
        }

        advance(ctx, &mut state, SyncState::Pushing);
        let pushed = match self.hub.push(ctx, description).await {
            Ok(id) => id,
            Err(HubError::PushRejected(reason)) => {
                // A rejected push after a successful merge gets exactly one
                // in-cycle retry
                tracing::warn!(%ctx, %reason, "push rejected, retrying once");
                match self.hub.push(ctx, description).await {
                    Ok(id) => id,
                    Err(err) => {
                        advance(ctx, &mut state, SyncState::Failed);
                        return Err(err);
                    }
                }
            }
            Err(err) => {
                advance(ctx, &mut state, SyncState::Failed);
                return Err(err);
            }
        };

        advance(ctx, &mut state, SyncState::Done);
        Ok(pushed)
    }

    fn element_spec(&mut self, name: String, category: CategoryId) -> ElementSpec {
        ElementSpec {
            name,
            category,
            payload: serde_json::json!({ "value": self.rng.gen::<u32>() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_policy_every_round() {
        let policy = TagPolicy::EveryRound;
        let (name, _) = policy.tag_for(0, 3).unwrap();
        assert_eq!(name, "round-0");
        assert!(policy.tag_for(2, 3).is_some());
    }

    #[test]
    fn test_tag_policy_sequence_end() {
        let policy = TagPolicy::SequenceEnd;
        assert!(policy.tag_for(0, 3).is_none());
        assert!(policy.tag_for(1, 3).is_none());
        let (name, _) = policy.tag_for(2, 3).unwrap();
        assert_eq!(name, "final");
    }

    #[test]
    fn test_tag_policy_never() {
        assert!(TagPolicy::Never.tag_for(0, 1).is_none());
    }
}
