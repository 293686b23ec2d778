//! Execution backends
//!
//! The orchestrator hands a persisted run to a backend by id and waits only
//! for acknowledgment that the run entered the backend's queue. Backends
//! deduplicate by run id, so submitting the same id again is safe.

mod http;
mod local;

use async_trait::async_trait;

use crate::error::BackendError;

pub use http::HttpExecutionBackend;
pub use local::LocalQueueBackend;

/// Backend's answer to a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The run is in the backend's queue
    Accepted,
    /// The backend refused the run (e.g. queue full)
    Rejected { reason: String },
}

/// Execution backend contract
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Submits a persisted run for execution
    ///
    /// Transport failures are reported as [`BackendError`]; a refusal by a
    /// reachable backend is [`Submission::Rejected`].
    async fn submit(&self, run_id: &str) -> Result<Submission, BackendError>;
}
