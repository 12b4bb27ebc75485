//! Error taxonomy for a generator run.

use loadgen_core::{GatewayError, HubError};

/// Error type for workload generation.
///
/// Transient hub errors (reservation conflicts, a first push rejection) are
/// retried inside the synchronize cycle and only surface here once the retry
/// budget is spent. Everything else is fatal to the run but never to the
/// process.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Bad plan parameters, rejected before any I/O
    #[error("invalid sequence plan: {0}")]
    InvalidPlan(String),

    /// Operation attempted while the generator is not in the Ready state
    #[error("generator is not ready: {0}")]
    NotReady(String),

    /// The fixture container/category/namespace could not be queried or
    /// created; aborts the run before any round executes
    #[error("fixture bootstrap failed")]
    Bootstrap(#[source] GatewayError),

    /// Reservation or merge conflicts persisted through every retry attempt
    #[error("synchronize cycle still conflicted after {attempts} attempts")]
    Conflict { attempts: u32 },

    /// The automatic merge hit a structural conflict it cannot reconcile
    #[error("unresolvable merge: {0}")]
    UnresolvableMerge(String),

    /// The hub rejected the push twice in one cycle
    #[error("push failed: {0}")]
    Push(String),

    /// Failure tagging a named version after a successful push
    #[error("named version tagging failed: {0}")]
    Tag(String),

    /// Transport failure talking to the hub
    #[error("hub transport failure: {0}")]
    Hub(String),

    /// Local replica failure during workload application
    #[error("local replica failure")]
    Gateway(#[from] GatewayError),
}

impl GeneratorError {
    /// Map a hub error that escaped the retry loop to the run-level taxonomy.
    pub(crate) fn from_hub(err: HubError, attempts: u32) -> Self {
        match err {
            HubError::Conflict(_) => GeneratorError::Conflict { attempts },
            HubError::UnresolvableMerge(reason) => GeneratorError::UnresolvableMerge(reason),
            HubError::PushRejected(reason) => GeneratorError::Push(reason),
            HubError::Transport(reason) => GeneratorError::Hub(reason),
        }
    }
}
