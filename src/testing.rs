//! In-memory collaborator implementations.
//!
//! [`InMemoryReplica`] and [`InMemoryHub`] implement the full
//! [`DbGateway`]/[`HubClient`] contracts, including optimistic-concurrency
//! conflict signaling. They serve two purposes:
//!
//! - the default pair for a self-contained CLI run (the live hub wire
//!   protocol is an external concern, not part of this tool), and
//! - controllable doubles for the integration tests, with injection knobs
//!   for reservation conflicts, unresolvable merges, and push rejections.

use loadgen_core::{
    CategoryId, ChangesetId, ContainerId, DbGateway, ElementId, ElementSpec, GatewayError,
    HubClient, HubError, NamedVersion, NamespaceId, RemoteIdentity, RunContext,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Build the default collaborator pair for a run against `identity`.
pub fn in_memory_collaborators(
    identity: &RemoteIdentity,
) -> (Arc<InMemoryReplica>, Arc<InMemoryHub>) {
    (
        Arc::new(InMemoryReplica::new()),
        Arc::new(InMemoryHub::new(identity.clone())),
    )
}

#[derive(Debug, Clone)]
struct ElementRecord {
    container: ContainerId,
    spec: ElementSpec,
}

#[derive(Debug, Default)]
struct ReplicaState {
    containers: HashMap<String, ContainerId>,
    categories: HashMap<String, CategoryId>,
    namespaces: HashMap<String, NamespaceId>,
    elements: HashMap<ElementId, ElementRecord>,
    /// Insertion order of live elements, so queries are deterministic
    order: Vec<ElementId>,
    /// Mutations staged since the last commit
    staged_mutations: usize,
    commits: Vec<String>,
    fixture_create_calls: u64,
}

/// In-memory local replica.
#[derive(Debug, Default)]
pub struct InMemoryReplica {
    state: Mutex<ReplicaState>,
}

impl InMemoryReplica {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, ReplicaState> {
        self.state.lock().expect("replica state poisoned")
    }

    /// How many fixture artifacts (containers, categories, namespaces) have
    /// been created over the replica's lifetime.
    pub fn fixture_create_calls(&self) -> u64 {
        self.locked().fixture_create_calls
    }

    /// Descriptions of every local commit, in order.
    pub fn commit_descriptions(&self) -> Vec<String> {
        self.locked().commits.clone()
    }

    /// Number of live elements across all containers.
    pub fn live_elements(&self) -> usize {
        self.locked().order.len()
    }

    /// Current properties of a live element, if it exists.
    pub fn element_spec(&self, id: ElementId) -> Option<ElementSpec> {
        self.locked().elements.get(&id).map(|r| r.spec.clone())
    }

    /// Mutations staged since the last commit.
    pub fn staged_mutations(&self) -> usize {
        self.locked().staged_mutations
    }
}

#[async_trait::async_trait]
impl DbGateway for InMemoryReplica {
    async fn find_container(
        &self,
        _ctx: &RunContext,
        name: &str,
    ) -> Result<Option<ContainerId>, GatewayError> {
        Ok(self.locked().containers.get(name).copied())
    }

    async fn create_container(
        &self,
        _ctx: &RunContext,
        name: &str,
    ) -> Result<ContainerId, GatewayError> {
        let mut state = self.locked();
        if state.containers.contains_key(name) {
            return Err(GatewayError::Storage(format!(
                "container {name} already exists"
            )));
        }
        let id = ContainerId::new();
        state.containers.insert(name.to_string(), id);
        state.fixture_create_calls += 1;
        state.staged_mutations += 1;
        Ok(id)
    }

    async fn find_category(
        &self,
        _ctx: &RunContext,
        name: &str,
    ) -> Result<Option<CategoryId>, GatewayError> {
        Ok(self.locked().categories.get(name).copied())
    }

    async fn create_category(
        &self,
        _ctx: &RunContext,
        name: &str,
    ) -> Result<CategoryId, GatewayError> {
        let mut state = self.locked();
        if state.categories.contains_key(name) {
            return Err(GatewayError::Storage(format!(
                "category {name} already exists"
            )));
        }
        let id = CategoryId::new();
        state.categories.insert(name.to_string(), id);
        state.fixture_create_calls += 1;
        state.staged_mutations += 1;
        Ok(id)
    }

    async fn find_namespace(
        &self,
        _ctx: &RunContext,
        name: &str,
    ) -> Result<Option<NamespaceId>, GatewayError> {
        Ok(self.locked().namespaces.get(name).copied())
    }

    async fn create_namespace(
        &self,
        _ctx: &RunContext,
        name: &str,
    ) -> Result<NamespaceId, GatewayError> {
        let mut state = self.locked();
        if state.namespaces.contains_key(name) {
            return Err(GatewayError::Storage(format!(
                "namespace {name} already exists"
            )));
        }
        let id = NamespaceId::new();
        state.namespaces.insert(name.to_string(), id);
        state.fixture_create_calls += 1;
        state.staged_mutations += 1;
        Ok(id)
    }

    async fn create_element(
        &self,
        _ctx: &RunContext,
        container: ContainerId,
        spec: &ElementSpec,
    ) -> Result<ElementId, GatewayError> {
        let mut state = self.locked();
        if !state.containers.values().any(|id| *id == container) {
            return Err(GatewayError::ContainerNotFound(container));
        }
        let id = ElementId::new();
        state.elements.insert(
            id,
            ElementRecord {
                container,
                spec: spec.clone(),
            },
        );
        state.order.push(id);
        state.staged_mutations += 1;
        Ok(id)
    }

    async fn update_element(
        &self,
        _ctx: &RunContext,
        id: ElementId,
        spec: &ElementSpec,
    ) -> Result<(), GatewayError> {
        let mut state = self.locked();
        let record = state
            .elements
            .get_mut(&id)
            .ok_or(GatewayError::ElementNotFound(id))?;
        record.spec = spec.clone();
        state.staged_mutations += 1;
        Ok(())
    }

    async fn delete_element(&self, _ctx: &RunContext, id: ElementId) -> Result<(), GatewayError> {
        let mut state = self.locked();
        if state.elements.remove(&id).is_none() {
            return Err(GatewayError::ElementNotFound(id));
        }
        state.order.retain(|existing| *existing != id);
        state.staged_mutations += 1;
        Ok(())
    }

    async fn query_elements(
        &self,
        _ctx: &RunContext,
        container: ContainerId,
    ) -> Result<Vec<ElementId>, GatewayError> {
        let state = self.locked();
        Ok(state
            .order
            .iter()
            .filter(|id| {
                state
                    .elements
                    .get(*id)
                    .is_some_and(|record| record.container == container)
            })
            .copied()
            .collect())
    }

    async fn commit(&self, _ctx: &RunContext, description: &str) -> Result<(), GatewayError> {
        let mut state = self.locked();
        state.staged_mutations = 0;
        state.commits.push(description.to_string());
        Ok(())
    }
}

/// One changeset as recorded by the hub double.
#[derive(Debug, Clone)]
pub struct PushedChangeset {
    pub id: ChangesetId,
    pub description: String,
    pub pushed_at: Instant,
}

#[derive(Debug, Default)]
struct HubState {
    changesets: Vec<PushedChangeset>,
    versions: Vec<NamedVersion>,
    reserve_calls: u32,
    conflicts_remaining: u32,
    push_rejections_remaining: u32,
    unresolvable_merge: bool,
}

/// In-memory hub, scoped to one project/database identity.
#[derive(Debug)]
pub struct InMemoryHub {
    identity: RemoteIdentity,
    state: Mutex<HubState>,
}

impl InMemoryHub {
    pub fn new(identity: RemoteIdentity) -> Self {
        Self {
            identity,
            state: Mutex::new(HubState::default()),
        }
    }

    /// Signal a conflict on the next `count` reservation attempts, then
    /// succeed.
    pub fn with_reserve_conflicts(self, count: u32) -> Self {
        self.locked().conflicts_remaining = count;
        self
    }

    /// Reject the next `count` pushes, then succeed.
    pub fn with_push_rejections(self, count: u32) -> Self {
        self.locked().push_rejections_remaining = count;
        self
    }

    /// Make every merge fail with a structural conflict.
    pub fn with_unresolvable_merge(self) -> Self {
        self.locked().unresolvable_merge = true;
        self
    }

    pub fn identity(&self) -> &RemoteIdentity {
        &self.identity
    }

    fn locked(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().expect("hub state poisoned")
    }

    /// All changesets pushed so far, in push order.
    pub fn pushed_changesets(&self) -> Vec<PushedChangeset> {
        self.locked().changesets.clone()
    }

    /// All named versions created so far.
    pub fn named_versions(&self) -> Vec<NamedVersion> {
        self.locked().versions.clone()
    }

    /// Total reservation attempts, including conflicted ones.
    pub fn reserve_calls(&self) -> u32 {
        self.locked().reserve_calls
    }
}

#[async_trait::async_trait]
impl HubClient for InMemoryHub {
    async fn reserve_resources(
        &self,
        _ctx: &RunContext,
        _ids: &[ElementId],
    ) -> Result<(), HubError> {
        let mut state = self.locked();
        state.reserve_calls += 1;
        if state.conflicts_remaining > 0 {
            state.conflicts_remaining -= 1;
            return Err(HubError::Conflict(
                "resources reserved by another writer".into(),
            ));
        }
        Ok(())
    }

    async fn pull_and_merge(&self, _ctx: &RunContext) -> Result<(), HubError> {
        let state = self.locked();
        if state.unresolvable_merge {
            return Err(HubError::UnresolvableMerge(
                "divergent structural change".into(),
            ));
        }
        Ok(())
    }

    async fn push(&self, _ctx: &RunContext, description: &str) -> Result<ChangesetId, HubError> {
        let mut state = self.locked();
        if state.push_rejections_remaining > 0 {
            state.push_rejections_remaining -= 1;
            return Err(HubError::PushRejected("remote rejected changeset".into()));
        }
        let id = ChangesetId::new();
        state.changesets.push(PushedChangeset {
            id,
            description: description.to_string(),
            pushed_at: Instant::now(),
        });
        Ok(id)
    }

    async fn tag_version(
        &self,
        _ctx: &RunContext,
        name: &str,
        description: &str,
        changeset_id: ChangesetId,
    ) -> Result<(), HubError> {
        let mut state = self.locked();
        if !state.changesets.iter().any(|cs| cs.id == changeset_id) {
            return Err(HubError::Transport(format!(
                "cannot tag unknown changeset {changeset_id}"
            )));
        }
        state.versions.push(NamedVersion {
            name: name.to_string(),
            description: description.to_string(),
            changeset_id,
            created_at: chrono::Utc::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commit_drains_staged_mutations_into_the_log() {
        let replica = InMemoryReplica::new();
        let ctx = RunContext::new();

        let container = replica.create_container(&ctx, "c1").await.unwrap();
        let category = replica.create_category(&ctx, "cat1").await.unwrap();
        let spec = ElementSpec {
            name: "e-0".to_string(),
            category,
            payload: serde_json::json!({ "value": 1 }),
        };
        let id = replica.create_element(&ctx, container, &spec).await.unwrap();
        assert_eq!(replica.staged_mutations(), 3);

        replica.commit(&ctx, "Initial population").await.unwrap();
        assert_eq!(replica.staged_mutations(), 0);
        assert_eq!(replica.commit_descriptions(), vec!["Initial population"]);

        // Staging starts again after a commit
        replica.delete_element(&ctx, id).await.unwrap();
        assert_eq!(replica.staged_mutations(), 1);
    }
}
