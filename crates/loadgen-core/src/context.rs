//! Per-run context threaded explicitly through the call chain.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Context value identifying one generator run.
///
/// Every collaborator call receives a `&RunContext` so that replica and hub
/// implementations can correlate their own diagnostics with a run. This is a
/// plain value passed by parameter, never global state.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Unique id of this run, included in log events
    pub run_id: Uuid,
    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run {}", self.run_id)
    }
}
