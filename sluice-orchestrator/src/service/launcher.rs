//! Run Launcher
//!
//! Creates the run record and hands it to the execution backend.
//!
//! The record is always committed before submission is attempted, so a
//! failure in between leaves an inspectable NOT_STARTED run instead of a lost
//! request. Submission only waits for the backend's acknowledgment.

use chrono::Utc;
use sluice_core::domain::run::{PipelineRun, RunLineage, RunStatus};
use sluice_core::tags::lineage_tags;
use std::collections::BTreeSet;
use uuid::Uuid;

use super::validator::ValidatedRequest;
use crate::backend::{ExecutionBackend, Submission};
use crate::error::{LaunchError, NotFoundError, OrchestratorError, RunStoreError};
use crate::repository::RunStore;

/// Persists and submits a validated request
///
/// `lineage` and `step_keys`, when given, take precedence over the ones
/// carried by the request.
pub async fn launch<S, B>(
    store: &S,
    backend: &B,
    request: ValidatedRequest,
    lineage: Option<RunLineage>,
    step_keys: Option<BTreeSet<String>>,
) -> Result<PipelineRun, LaunchError>
where
    S: RunStore + ?Sized,
    B: ExecutionBackend + ?Sized,
{
    let run_id = request
        .run_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if store.get_by_id(&run_id).await?.is_some() {
        return Err(LaunchError::DuplicateRunId { run_id });
    }

    let run = build_run(run_id, request, lineage, step_keys);

    let run = store.create(run).await.map_err(|err| match err {
        RunStoreError::Conflict(run_id) => LaunchError::DuplicateRunId { run_id },
        other => LaunchError::Store(other),
    })?;

    tracing::info!("Run created: {} for pipeline: {}", run.run_id, run.pipeline_name);

    submit(backend, &run.run_id).await?;

    Ok(run)
}

/// Retries submission of an already persisted run
///
/// Only runs still in NOT_STARTED are submitted again; any other status means
/// the backend already holds the run, and the record is returned as is.
pub async fn resubmit<S, B>(
    store: &S,
    backend: &B,
    run_id: &str,
) -> Result<PipelineRun, OrchestratorError>
where
    S: RunStore + ?Sized,
    B: ExecutionBackend + ?Sized,
{
    let run = store
        .get_by_id(run_id)
        .await?
        .ok_or_else(|| NotFoundError::Run(run_id.to_string()))?;

    if run.status != RunStatus::NotStarted {
        tracing::debug!(
            "Run {} already submitted (status: {:?}), skipping",
            run_id,
            run.status
        );
        return Ok(run);
    }

    submit(backend, run_id).await?;

    Ok(run)
}

async fn submit<B>(backend: &B, run_id: &str) -> Result<(), LaunchError>
where
    B: ExecutionBackend + ?Sized,
{
    let reason = match backend.submit(run_id).await {
        Ok(Submission::Accepted) => {
            tracing::info!("Run {} accepted by execution backend", run_id);
            return Ok(());
        }
        Ok(Submission::Rejected { reason }) => reason,
        Err(err) => err.to_string(),
    };

    tracing::warn!("Submission of run {} failed: {}", run_id, reason);

    Err(LaunchError::SubmissionFailed {
        run_id: run_id.to_string(),
        reason,
    })
}

fn build_run(
    run_id: String,
    request: ValidatedRequest,
    lineage: Option<RunLineage>,
    step_keys: Option<BTreeSet<String>>,
) -> PipelineRun {
    let lineage = lineage.or(request.lineage);

    let mut tags = request.tags;
    if let Some(lineage) = &lineage {
        tags.extend(lineage_tags(lineage));
    }

    let (root_run_id, parent_run_id) = match lineage {
        Some(RunLineage {
            root_run_id,
            parent_run_id,
        }) => (Some(root_run_id), Some(parent_run_id)),
        None => (None, None),
    };

    PipelineRun {
        run_id,
        pipeline_name: request.pipeline_name,
        origin: request.origin,
        mode: request.mode,
        run_config: request.run_config,
        status: RunStatus::NotStarted,
        root_run_id,
        parent_run_id,
        step_keys_to_execute: step_keys.or(request.step_keys_to_execute),
        created_at: Utc::now(),
        tags,
    }
}
