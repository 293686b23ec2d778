//! Orchestrator error types
//!
//! Every failure is typed and carries the identifiers a caller needs to
//! render an actionable message. Nothing here is retried automatically.

use sluice_core::domain::execution::ReexecutionPolicy;
use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// A referenced location, repository, pipeline or run does not exist
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("location '{0}' not found")]
    Location(String),

    #[error("repository '{repository}' not found in location '{location}'")]
    Repository { location: String, repository: String },

    #[error("pipeline '{pipeline}' not found in repository '{repository}' (location '{location}')")]
    Pipeline {
        location: String,
        repository: String,
        pipeline: String,
    },

    #[error("run '{0}' not found")]
    Run(String),
}

/// A launch request does not fit the resolved pipeline or lineage rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("mode '{mode}' is not defined on pipeline '{pipeline}' (available: {available:?})")]
    UnknownMode {
        pipeline: String,
        mode: String,
        available: Vec<String>,
    },

    #[error("re-execution requires a non-empty {field}")]
    MissingLineage { field: &'static str },

    #[error("step '{step_key}' is not part of pipeline '{pipeline}'")]
    UnknownStep { pipeline: String, step_key: String },

    #[error(
        "root run '{root_run_id}' does not match the lineage of parent run '{parent_run_id}' (expected '{expected_root_run_id}')"
    )]
    LineageMismatch {
        parent_run_id: String,
        root_run_id: String,
        expected_root_run_id: String,
    },
}

/// Re-execution planning failed
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("parent run '{run_id}' not found")]
    ParentNotFound { run_id: String },

    #[error("parent run '{parent_run_id}' has no failed steps to re-execute")]
    NothingToReexecute { parent_run_id: String },

    #[error("re-execution policy {policy} is not supported, only FROM_FAILURE is")]
    UnsupportedPolicy { policy: ReexecutionPolicy },

    #[error(transparent)]
    Store(#[from] RunStoreError),
}

/// Persisting or submitting a run failed
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("a run with id '{run_id}' already exists")]
    DuplicateRunId { run_id: String },

    /// The record exists in NOT_STARTED; submission may be retried with the same id
    #[error("submission of run '{run_id}' failed: {reason}")]
    SubmissionFailed { run_id: String, reason: String },

    #[error(transparent)]
    Store(#[from] RunStoreError),
}

/// Failures reported by a run store implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunStoreError {
    /// Unique-id constraint hit on insert
    #[error("run '{0}' already exists")]
    Conflict(String),

    #[error("run store unavailable: {0}")]
    Unavailable(String),
}

/// Failures talking to an execution backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("execution backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid execution backend URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("execution queue is closed")]
    QueueClosed,

    #[error("execution backend unavailable: {0}")]
    Unavailable(String),
}

/// Umbrella error returned by the orchestrator entry points
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Planning(#[from] PlanningError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Store(#[from] RunStoreError),
}

impl OrchestratorError {
    /// Whether the caller may retry submission with the same run id
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Launch(LaunchError::SubmissionFailed { .. }))
    }

    /// Run id the error refers to, when there is one
    pub fn run_id(&self) -> Option<&str> {
        match self {
            Self::NotFound(NotFoundError::Run(run_id))
            | Self::Planning(PlanningError::ParentNotFound { run_id })
            | Self::Launch(LaunchError::DuplicateRunId { run_id })
            | Self::Launch(LaunchError::SubmissionFailed { run_id, .. }) => Some(run_id.as_str()),
            Self::Planning(PlanningError::NothingToReexecute { parent_run_id }) => {
                Some(parent_run_id.as_str())
            }
            _ => None,
        }
    }
}
