//! Run Validator
//!
//! Checks a launch request against the resolved pipeline and the lineage
//! rules, and normalizes it into the shape the launcher persists.

use serde_json::Value as JsonValue;
use sluice_core::domain::execution::{ExecutionMetadata, ExecutionParams};
use sluice_core::domain::pipeline::{PipelineOrigin, ResolvedPipeline};
use sluice_core::domain::run::{PipelineRun, RunLineage};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::ValidationError;

/// Launch request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub pipeline_name: String,
    pub origin: PipelineOrigin,
    /// Always a mode declared on the pipeline
    pub mode: String,
    pub run_config: JsonValue,
    /// Caller-supplied run id, if any
    pub run_id: Option<String>,
    pub lineage: Option<RunLineage>,
    /// `None` runs every step
    pub step_keys_to_execute: Option<BTreeSet<String>>,
    /// Pipeline tags overlaid with the request's own tags
    pub tags: BTreeMap<String, String>,
}

/// Validates `params` against `pipeline`
///
/// `preferred_mode` is used when the request names no mode and the pipeline
/// declares it; otherwise the pipeline's first mode is used.
pub fn validate(
    params: ExecutionParams,
    pipeline: &ResolvedPipeline,
    is_reexecution: bool,
    preferred_mode: &str,
) -> Result<ValidatedRequest, ValidationError> {
    let ExecutionParams {
        selector,
        run_config,
        execution_metadata,
        mode,
    } = params;

    let mode = validate_mode(mode, pipeline, preferred_mode)?;
    let lineage = validate_lineage(&execution_metadata, is_reexecution)?;
    let step_keys_to_execute = validate_step_selection(selector.step_selection, pipeline)?;

    let mut tags = pipeline.tags.clone();
    tags.extend(execution_metadata.tags);

    let run_id = execution_metadata
        .run_id
        .filter(|run_id| !run_id.trim().is_empty());

    tracing::debug!(
        "Validated launch of {} (mode: {}, re-execution: {})",
        pipeline.name,
        mode,
        is_reexecution
    );

    Ok(ValidatedRequest {
        pipeline_name: pipeline.name.clone(),
        origin: pipeline.origin.clone(),
        mode,
        run_config,
        run_id,
        lineage,
        step_keys_to_execute,
        tags,
    })
}

// =============================================================================
// Rules
// =============================================================================

fn validate_mode(
    mode: Option<String>,
    pipeline: &ResolvedPipeline,
    preferred_mode: &str,
) -> Result<String, ValidationError> {
    let unknown = |mode: String| ValidationError::UnknownMode {
        pipeline: pipeline.name.clone(),
        mode,
        available: pipeline.modes.clone(),
    };

    match mode {
        Some(mode) if pipeline.has_mode(&mode) => Ok(mode),
        Some(mode) => Err(unknown(mode)),
        None => pipeline
            .default_mode(preferred_mode)
            .map(str::to_string)
            .ok_or_else(|| unknown(preferred_mode.to_string())),
    }
}

/// Root and parent ids must be both present or both absent, and both present
/// for a re-execution
fn validate_lineage(
    metadata: &ExecutionMetadata,
    is_reexecution: bool,
) -> Result<Option<RunLineage>, ValidationError> {
    let root = non_empty(&metadata.root_run_id);
    let parent = non_empty(&metadata.parent_run_id);

    match (root, parent) {
        (Some(root), Some(parent)) => Ok(Some(RunLineage {
            root_run_id: root.to_string(),
            parent_run_id: parent.to_string(),
        })),
        (None, None) if !is_reexecution => Ok(None),
        (None, _) => Err(ValidationError::MissingLineage {
            field: "root_run_id",
        }),
        (Some(_), None) => Err(ValidationError::MissingLineage {
            field: "parent_run_id",
        }),
    }
}

/// Checks caller-supplied lineage against the parent run it names
///
/// The root must be the one the parent itself descends from, so it stays
/// stable across any number of re-executions.
pub fn validate_parent_lineage(
    lineage: &RunLineage,
    parent: &PipelineRun,
) -> Result<(), ValidationError> {
    let expected = RunLineage::from_parent(parent);

    if lineage.root_run_id != expected.root_run_id {
        return Err(ValidationError::LineageMismatch {
            parent_run_id: parent.run_id.clone(),
            root_run_id: lineage.root_run_id.clone(),
            expected_root_run_id: expected.root_run_id,
        });
    }

    Ok(())
}

fn validate_step_selection(
    selection: Option<BTreeSet<String>>,
    pipeline: &ResolvedPipeline,
) -> Result<Option<BTreeSet<String>>, ValidationError> {
    let Some(selection) = selection.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Some(unknown) = selection.iter().find(|key| !pipeline.steps.contains(key)) {
        return Err(ValidationError::UnknownStep {
            pipeline: pipeline.name.clone(),
            step_key: unknown.clone(),
        });
    }

    Ok(Some(selection))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
