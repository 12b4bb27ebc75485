//! Baseline fixture provisioning on the local replica.
//!
//! The workload writes into one container, one category, and one naming
//! namespace, all identified by fixed names. Provisioning is
//! create-if-absent, so re-running against the same remote target never
//! double-creates anything.

use crate::error::GeneratorError;
use loadgen_core::{
    CategoryId, ContainerId, DbGateway, ElementId, GatewayError, NamespaceId, RunContext,
};

/// Fixed name of the workload container.
pub const CONTAINER_NAME: &str = "LoadgenContainer";
/// Fixed name of the workload category.
pub const CATEGORY_NAME: &str = "LoadgenCategory";
/// Fixed name of the naming namespace for element codes.
pub const NAMESPACE_NAME: &str = "LoadgenCodes";

/// The baseline artifacts every workload round writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixture {
    pub container: ContainerId,
    pub category: CategoryId,
    pub namespace: NamespaceId,
}

/// What provisioning found and did on the replica.
///
/// The generator decides from this whether a baseline publish and/or a
/// cleanup changeset are needed before the round loop starts.
#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    pub fixture: Fixture,
    /// True if any fixture artifact was newly created and the baseline has
    /// to be published before the first round
    pub needs_pre_push: bool,
    /// Elements left in the container by a previous, possibly-incomplete run
    pub stale_elements: Vec<ElementId>,
}

/// Reach the known-good baseline: find or create the three fixture
/// artifacts and detect leftovers from earlier runs.
///
/// # Errors
///
/// Any replica failure aborts the run before a single round executes.
pub async fn provision(
    ctx: &RunContext,
    gateway: &dyn DbGateway,
) -> Result<ProvisionOutcome, GeneratorError> {
    let mut needs_pre_push = false;

    let container = match gateway
        .find_container(ctx, CONTAINER_NAME)
        .await
        .map_err(GeneratorError::Bootstrap)?
    {
        Some(id) => id,
        None => {
            tracing::debug!(%ctx, name = CONTAINER_NAME, "creating workload container");
            needs_pre_push = true;
            gateway
                .create_container(ctx, CONTAINER_NAME)
                .await
                .map_err(GeneratorError::Bootstrap)?
        }
    };

    let category = match gateway
        .find_category(ctx, CATEGORY_NAME)
        .await
        .map_err(GeneratorError::Bootstrap)?
    {
        Some(id) => id,
        None => {
            tracing::debug!(%ctx, name = CATEGORY_NAME, "creating workload category");
            needs_pre_push = true;
            gateway
                .create_category(ctx, CATEGORY_NAME)
                .await
                .map_err(GeneratorError::Bootstrap)?
        }
    };

    let namespace = match gateway
        .find_namespace(ctx, NAMESPACE_NAME)
        .await
        .map_err(GeneratorError::Bootstrap)?
    {
        Some(id) => id,
        None => {
            tracing::debug!(%ctx, name = NAMESPACE_NAME, "creating naming namespace");
            needs_pre_push = true;
            gateway
                .create_namespace(ctx, NAMESPACE_NAME)
                .await
                .map_err(GeneratorError::Bootstrap)?
        }
    };

    let stale_elements = gateway
        .query_elements(ctx, container)
        .await
        .map_err(GeneratorError::Bootstrap)?;

    if !stale_elements.is_empty() {
        tracing::info!(
            %ctx,
            count = stale_elements.len(),
            "found stale elements from a previous run"
        );
    }

    Ok(ProvisionOutcome {
        fixture: Fixture {
            container,
            category,
            namespace,
        },
        needs_pre_push,
        stale_elements,
    })
}

/// Delete every stale element, staging a cleanup delta.
pub async fn delete_stale_elements(
    ctx: &RunContext,
    gateway: &dyn DbGateway,
    stale: &[ElementId],
) -> Result<(), GatewayError> {
    for id in stale {
        gateway.delete_element(ctx, *id).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryReplica;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_provision_creates_all_artifacts_once() {
        let replica = Arc::new(InMemoryReplica::new());
        let ctx = RunContext::new();

        let first = provision(&ctx, replica.as_ref()).await.unwrap();
        assert!(first.needs_pre_push);
        assert!(first.stale_elements.is_empty());
        assert_eq!(replica.fixture_create_calls(), 3);

        let second = provision(&ctx, replica.as_ref()).await.unwrap();
        assert!(!second.needs_pre_push);
        assert_eq!(second.fixture, first.fixture);
        // Nothing new was created on the second pass
        assert_eq!(replica.fixture_create_calls(), 3);
    }
}
