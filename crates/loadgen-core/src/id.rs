//! Identifier newtypes for replica artifacts and hub changesets.
//!
//! All identifiers are uuid-backed. The hub and the local replica both assign
//! ids at creation time; the generator only ever passes them back, it never
//! inspects their contents.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Mint a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id! {
    /// Identifier of a single element in the workload container.
    ElementId
}

uuid_id! {
    /// Identifier of the container (model) the workload writes into.
    ContainerId
}

uuid_id! {
    /// Identifier of the category the workload elements belong to.
    CategoryId
}

uuid_id! {
    /// Identifier of the naming namespace used for element codes.
    NamespaceId
}

uuid_id! {
    /// Hub-assigned identifier of a pushed changeset.
    ChangesetId
}

/// Identity of the shared remote target, immutable for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIdentity {
    /// Project the target database belongs to
    pub project_id: String,
    /// The versioned model database within the project
    pub database_id: String,
}

impl RemoteIdentity {
    pub fn new(project_id: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: database_id.into(),
        }
    }
}

impl std::fmt::Display for RemoteIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.project_id, self.database_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_ids_are_unique() {
        assert_ne!(ElementId::new(), ElementId::new());
    }

    #[test]
    fn test_remote_identity_display() {
        let identity = RemoteIdentity::new("proj-a", "db-1");
        assert_eq!(identity.to_string(), "proj-a/db-1");
    }
}
