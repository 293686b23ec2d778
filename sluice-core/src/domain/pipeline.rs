//! Pipeline domain types

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::graph::StepGraph;

/// Mode every pipeline gets when its definition does not declare any
pub const DEFAULT_MODE: &str = "default";

/// Lookup key for a deployed pipeline definition
///
/// Uniquely resolves to one pipeline definition at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineSelector {
    pub location_name: String,
    pub repository_name: String,
    pub pipeline_name: String,
    /// Optional subset of steps to run
    #[serde(default)]
    pub step_selection: Option<BTreeSet<String>>,
}

impl PipelineSelector {
    pub fn new(
        location_name: impl Into<String>,
        repository_name: impl Into<String>,
        pipeline_name: impl Into<String>,
    ) -> Self {
        Self {
            location_name: location_name.into(),
            repository_name: repository_name.into(),
            pipeline_name: pipeline_name.into(),
            step_selection: None,
        }
    }

    /// Restricts the selector to a subset of steps
    pub fn with_step_selection<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.step_selection = Some(steps.into_iter().map(Into::into).collect());
        self
    }

    pub fn origin(&self) -> PipelineOrigin {
        PipelineOrigin {
            location_name: self.location_name.clone(),
            repository_name: self.repository_name.clone(),
        }
    }
}

/// Where a pipeline definition lives inside the deployment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineOrigin {
    pub location_name: String,
    pub repository_name: String,
}

/// Pipeline definition as resolved from the current deployment snapshot
///
/// The resolver is authoritative for everything here: step graph, modes and
/// pipeline-level tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPipeline {
    pub name: String,
    pub origin: PipelineOrigin,
    /// Declared modes, in declaration order
    pub modes: Vec<String>,
    pub steps: StepGraph,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl ResolvedPipeline {
    pub fn new(name: impl Into<String>, origin: PipelineOrigin, steps: StepGraph) -> Self {
        Self {
            name: name.into(),
            origin,
            modes: vec![DEFAULT_MODE.to_string()],
            steps,
            tags: BTreeMap::new(),
        }
    }

    /// Replaces the declared modes
    pub fn with_modes<I, S>(mut self, modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modes = modes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn has_mode(&self, mode: &str) -> bool {
        self.modes.iter().any(|m| m == mode)
    }

    /// Mode used when a request names none: `preferred` if declared,
    /// otherwise the first declared mode.
    pub fn default_mode(&self, preferred: &str) -> Option<&str> {
        self.modes
            .iter()
            .find(|mode| *mode == preferred)
            .or_else(|| self.modes.first())
            .map(String::as_str)
    }

    /// Selector that resolves back to this pipeline
    pub fn selector(&self) -> PipelineSelector {
        PipelineSelector::new(
            &self.origin.location_name,
            &self.origin.repository_name,
            &self.name,
        )
    }
}
