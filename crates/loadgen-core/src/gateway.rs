//! Contract for element/category/namespace lifecycle on the local replica.
//!
//! The generator mutates a disposable local working copy of the database
//! through this trait and commits the accumulated delta locally before each
//! synchronize cycle. Lookups return `Ok(None)` when an artifact does not
//! exist; `Err` is reserved for real failures, the two are never conflated.

use crate::context::RunContext;
use crate::id::{CategoryId, ContainerId, ElementId, NamespaceId};
use serde::{Deserialize, Serialize};

/// Error type for local replica operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Element does not exist in the replica
    #[error("element not found: {0}")]
    ElementNotFound(ElementId),

    /// Container does not exist in the replica
    #[error("container not found: {0}")]
    ContainerNotFound(ContainerId),

    /// Underlying storage failure
    #[error("replica storage error: {0}")]
    Storage(String),
}

/// Properties of a single workload element.
///
/// The content is synthetic - only count and existence matter to the hub's
/// change-synchronization path - but it is deterministic so that runs are
/// reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    /// Code value of the element, unique within the container
    pub name: String,
    /// Category the element belongs to
    pub category: CategoryId,
    /// Generated payload; opaque to the replica
    pub payload: serde_json::Value,
}

/// Lifecycle operations on the local replica.
///
/// Implementations are expected to stage mutations until [`commit`] is
/// called; the generator treats one commit as one pending changeset.
///
/// [`commit`]: DbGateway::commit
#[async_trait::async_trait]
pub trait DbGateway: Send + Sync {
    /// Look up the workload container by its fixed name.
    async fn find_container(
        &self,
        ctx: &RunContext,
        name: &str,
    ) -> Result<Option<ContainerId>, GatewayError>;

    /// Create the workload container.
    async fn create_container(
        &self,
        ctx: &RunContext,
        name: &str,
    ) -> Result<ContainerId, GatewayError>;

    /// Look up the workload category by name.
    async fn find_category(
        &self,
        ctx: &RunContext,
        name: &str,
    ) -> Result<Option<CategoryId>, GatewayError>;

    /// Create the workload category.
    async fn create_category(
        &self,
        ctx: &RunContext,
        name: &str,
    ) -> Result<CategoryId, GatewayError>;

    /// Look up the naming namespace by name.
    async fn find_namespace(
        &self,
        ctx: &RunContext,
        name: &str,
    ) -> Result<Option<NamespaceId>, GatewayError>;

    /// Create the naming namespace.
    async fn create_namespace(
        &self,
        ctx: &RunContext,
        name: &str,
    ) -> Result<NamespaceId, GatewayError>;

    /// Insert a new element into the container.
    async fn create_element(
        &self,
        ctx: &RunContext,
        container: ContainerId,
        spec: &ElementSpec,
    ) -> Result<ElementId, GatewayError>;

    /// Overwrite an existing element's properties.
    async fn update_element(
        &self,
        ctx: &RunContext,
        id: ElementId,
        spec: &ElementSpec,
    ) -> Result<(), GatewayError>;

    /// Remove an element from the container.
    async fn delete_element(&self, ctx: &RunContext, id: ElementId) -> Result<(), GatewayError>;

    /// List all live element ids in the container, in insertion order.
    ///
    /// The order must be deterministic so that update/delete selection is
    /// reproducible across runs.
    async fn query_elements(
        &self,
        ctx: &RunContext,
        container: ContainerId,
    ) -> Result<Vec<ElementId>, GatewayError>;

    /// Commit the accumulated mutations as one local save.
    ///
    /// The description is for audit/logging only and does not affect
    /// correctness.
    async fn commit(&self, ctx: &RunContext, description: &str) -> Result<(), GatewayError>;
}
