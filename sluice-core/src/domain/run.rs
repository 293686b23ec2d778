//! Run domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::pipeline::{PipelineOrigin, PipelineSelector};

/// Persisted run record
///
/// Created exactly once by the orchestrator. Status transitions belong to the
/// execution backend; the orchestrator only observes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub run_id: String,
    pub pipeline_name: String,
    pub origin: PipelineOrigin,
    pub mode: String,
    /// Opaque to the orchestrator; validated by the step engine
    pub run_config: serde_json::Value,
    pub status: RunStatus,
    pub root_run_id: Option<String>,
    pub parent_run_id: Option<String>,
    /// `None` runs every step of the pipeline
    pub step_keys_to_execute: Option<BTreeSet<String>>,
    pub created_at: DateTime<Utc>,
    pub tags: BTreeMap<String, String>,
}

impl PipelineRun {
    /// Lineage of this run, if it is a re-execution
    pub fn lineage(&self) -> Option<RunLineage> {
        match (&self.root_run_id, &self.parent_run_id) {
            (Some(root), Some(parent)) => Some(RunLineage {
                root_run_id: root.clone(),
                parent_run_id: parent.clone(),
            }),
            _ => None,
        }
    }

    /// Root of the lineage chain this run belongs to (itself for original runs)
    pub fn lineage_root(&self) -> &str {
        self.root_run_id.as_deref().unwrap_or(&self.run_id)
    }

    /// Selector for the whole pipeline this run was launched against
    pub fn selector(&self) -> PipelineSelector {
        PipelineSelector::new(
            &self.origin.location_name,
            &self.origin.repository_name,
            &self.pipeline_name,
        )
    }
}

/// Root/parent chain linking a re-executed run back to its origin
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunLineage {
    pub root_run_id: String,
    pub parent_run_id: String,
}

impl RunLineage {
    /// Lineage for a run re-executing `parent`
    ///
    /// The root stays fixed across any number of re-executions.
    pub fn from_parent(parent: &PipelineRun) -> Self {
        Self {
            root_run_id: parent.lineage_root().to_string(),
            parent_run_id: parent.run_id.clone(),
        }
    }
}

/// Run lifecycle status, owned by the execution backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    NotStarted,
    Queued,
    Started,
    Success,
    Failure,
    Canceled,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure | Self::Canceled)
    }
}
