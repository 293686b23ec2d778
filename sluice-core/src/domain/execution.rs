//! Launch request types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::pipeline::PipelineSelector;

/// Full launch request as supplied by a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionParams {
    pub selector: PipelineSelector,
    /// Opaque document handed to the step engine
    #[serde(default)]
    pub run_config: serde_json::Value,
    #[serde(default)]
    pub execution_metadata: ExecutionMetadata,
    /// Falls back to the pipeline's default mode when omitted
    #[serde(default)]
    pub mode: Option<String>,
}

impl ExecutionParams {
    pub fn new(selector: PipelineSelector) -> Self {
        Self {
            selector,
            run_config: serde_json::Value::Object(Default::default()),
            execution_metadata: ExecutionMetadata::default(),
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_run_config(mut self, run_config: serde_json::Value) -> Self {
        self.run_config = run_config;
        self
    }

    pub fn with_metadata(mut self, execution_metadata: ExecutionMetadata) -> Self {
        self.execution_metadata = execution_metadata;
        self
    }
}

/// Caller-supplied identity, lineage and tags for a run
///
/// `root_run_id` and `parent_run_id` are either both present or both absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub root_run_id: Option<String>,
    #[serde(default)]
    pub parent_run_id: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl ExecutionMetadata {
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_lineage(
        mut self,
        root_run_id: impl Into<String>,
        parent_run_id: impl Into<String>,
    ) -> Self {
        self.root_run_id = Some(root_run_id.into());
        self.parent_run_id = Some(parent_run_id.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Strategy for re-executing a prior run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReexecutionPolicy {
    AllSteps,
    FromFailure,
}

impl fmt::Display for ReexecutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllSteps => write!(f, "ALL_STEPS"),
            Self::FromFailure => write!(f, "FROM_FAILURE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_deserialize_with_defaults() {
        let params: ExecutionParams = serde_json::from_value(serde_json::json!({
            "selector": {
                "location_name": "prod",
                "repository_name": "etl",
                "pipeline_name": "nightly"
            }
        }))
        .unwrap();

        assert!(params.mode.is_none());
        assert!(params.execution_metadata.run_id.is_none());
        assert!(params.selector.step_selection.is_none());
    }

    #[test]
    fn test_policy_display_matches_wire_name() {
        let policy = ReexecutionPolicy::FromFailure;
        let wire = serde_json::to_string(&policy).unwrap();
        assert_eq!(wire, format!("\"{}\"", policy));
        assert_eq!(ReexecutionPolicy::AllSteps.to_string(), "ALL_STEPS");
    }
}
