//! Orchestrator
//!
//! Single entry point for launching runs. A request is resolved, validated,
//! optionally planned for re-execution, persisted and submitted, and the
//! resulting record is read back fresh from the store.

use sluice_core::domain::execution::{ExecutionMetadata, ExecutionParams, ReexecutionPolicy};
use sluice_core::domain::run::{PipelineRun, RunLineage};
use sluice_core::tags::RESUME_RETRY_TAG;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::{launcher, planner, query, validator};
use crate::backend::ExecutionBackend;
use crate::config::OrchestratorConfig;
use crate::error::{PlanningError, Result};
use crate::repository::{PipelineResolver, RunHistoryReader, RunStore};

/// A launch request
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchRequest {
    /// Launch a new run
    Fresh(ExecutionParams),
    /// Launch a re-execution whose lineage the caller supplies in the metadata
    Reexecute(ExecutionParams),
    /// Re-execute a prior run, deriving everything from its record
    ReexecuteFromParent {
        parent_run_id: String,
        policy: ReexecutionPolicy,
    },
}

/// Launches runs against injected collaborators
///
/// Holds no mutable state of its own; concurrent launches only meet in the
/// run store and the execution backend.
#[derive(Clone)]
pub struct Orchestrator {
    resolver: Arc<dyn PipelineResolver>,
    store: Arc<dyn RunStore>,
    backend: Arc<dyn ExecutionBackend>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        resolver: Arc<dyn PipelineResolver>,
        store: Arc<dyn RunStore>,
        backend: Arc<dyn ExecutionBackend>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            resolver,
            store,
            backend,
            config,
        }
    }

    /// Launches a run for any kind of request
    ///
    /// Returns the persisted, backend-acknowledged run as currently stored,
    /// or a typed error. Never both.
    pub async fn launch(&self, request: LaunchRequest) -> Result<PipelineRun> {
        let run = match request {
            LaunchRequest::Fresh(params) => self.launch_params(params, false).await?,
            LaunchRequest::Reexecute(params) => self.launch_params(params, true).await?,
            LaunchRequest::ReexecuteFromParent {
                parent_run_id,
                policy,
            } => self.launch_from_parent(&parent_run_id, policy).await?,
        };

        Ok(self.read_back(run).await)
    }

    pub async fn launch_execution(&self, params: ExecutionParams) -> Result<PipelineRun> {
        self.launch(LaunchRequest::Fresh(params)).await
    }

    pub async fn launch_reexecution(&self, params: ExecutionParams) -> Result<PipelineRun> {
        self.launch(LaunchRequest::Reexecute(params)).await
    }

    pub async fn launch_reexecution_from_parent(
        &self,
        parent_run_id: &str,
        policy: ReexecutionPolicy,
    ) -> Result<PipelineRun> {
        self.launch(LaunchRequest::ReexecuteFromParent {
            parent_run_id: parent_run_id.to_string(),
            policy,
        })
        .await
    }

    /// Retries submission of a run whose launch failed with `SubmissionFailed`
    pub async fn resubmit(&self, run_id: &str) -> Result<PipelineRun> {
        let run = launcher::resubmit(self.store.as_ref(), self.backend.as_ref(), run_id).await?;
        Ok(self.read_back(run).await)
    }

    /// Fetches runs by id straight from the store
    pub async fn get_runs(
        &self,
        run_ids: &BTreeSet<String>,
    ) -> Result<HashMap<String, PipelineRun>> {
        Ok(query::get_by_ids(self.store.as_ref(), run_ids).await?)
    }

    // =============================================================================
    // Launch paths
    // =============================================================================

    async fn launch_params(
        &self,
        params: ExecutionParams,
        is_reexecution: bool,
    ) -> Result<PipelineRun> {
        let pipeline = self.resolver.resolve(&params.selector).await?;

        let request =
            validator::validate(params, &pipeline, is_reexecution, &self.config.default_mode)?;

        if let Some(lineage) = &request.lineage {
            let parent = self.load_parent(&lineage.parent_run_id).await?;
            validator::validate_parent_lineage(lineage, &parent)?;
        }

        let run = launcher::launch(
            self.store.as_ref(),
            self.backend.as_ref(),
            request,
            None,
            None,
        )
        .await?;

        Ok(run)
    }

    async fn launch_from_parent(
        &self,
        parent_run_id: &str,
        policy: ReexecutionPolicy,
    ) -> Result<PipelineRun> {
        planner::check_policy(policy)?;

        let parent = self.load_parent(parent_run_id).await?;

        let pipeline = self.resolver.resolve(&parent.selector()).await?;

        let step_keys =
            planner::plan_from_failure(self.store.as_ref(), parent_run_id, &pipeline).await?;

        let lineage = RunLineage::from_parent(&parent);

        let metadata = ExecutionMetadata {
            run_id: None,
            root_run_id: Some(lineage.root_run_id.clone()),
            parent_run_id: Some(lineage.parent_run_id.clone()),
            tags: parent.tags.clone(),
        }
        .with_tag(RESUME_RETRY_TAG, "true");

        let params = ExecutionParams {
            selector: parent.selector(),
            run_config: parent.run_config.clone(),
            execution_metadata: metadata,
            mode: Some(parent.mode.clone()),
        };

        let request = validator::validate(params, &pipeline, true, &self.config.default_mode)?;

        tracing::info!(
            "Re-executing run {} from failure (root: {})",
            parent_run_id,
            lineage.root_run_id
        );

        let run = launcher::launch(
            self.store.as_ref(),
            self.backend.as_ref(),
            request,
            Some(lineage),
            Some(step_keys),
        )
        .await?;

        Ok(run)
    }

    async fn load_parent(&self, parent_run_id: &str) -> Result<PipelineRun> {
        let parent = self
            .store
            .get_by_id(parent_run_id)
            .await?
            .ok_or_else(|| PlanningError::ParentNotFound {
                run_id: parent_run_id.to_string(),
            })?;

        Ok(parent)
    }

    /// Re-reads a run so the caller sees any status change since submission
    ///
    /// The run is already persisted and acknowledged at this point, so a
    /// failed read falls back to the record in hand rather than an error.
    async fn read_back(&self, run: PipelineRun) -> PipelineRun {
        match query::get_by_id(self.store.as_ref(), &run.run_id).await {
            Ok(Some(fresh)) => fresh,
            Ok(None) => {
                tracing::warn!(
                    "Run {} missing on read-back, returning the created record",
                    run.run_id
                );
                run
            }
            Err(err) => {
                tracing::warn!(
                    "Read-back of run {} failed: {}, returning the created record",
                    run.run_id,
                    err
                );
                run
            }
        }
    }
}
