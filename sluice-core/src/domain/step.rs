//! Step outcome types
//!
//! Outcomes are read from a parent run's history; the orchestrator never
//! records them itself.

use serde::{Deserialize, Serialize};

/// Terminal status a step reached within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Success,
    Failure,
    Skipped,
}

/// Recorded outcome of one step in one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step_key: String,
    pub status: StepStatus,
}

impl StepOutcome {
    pub fn new(step_key: impl Into<String>, status: StepStatus) -> Self {
        Self {
            step_key: step_key.into(),
            status,
        }
    }

    pub fn success(step_key: impl Into<String>) -> Self {
        Self::new(step_key, StepStatus::Success)
    }

    pub fn failure(step_key: impl Into<String>) -> Self {
        Self::new(step_key, StepStatus::Failure)
    }

    pub fn skipped(step_key: impl Into<String>) -> Self {
        Self::new(step_key, StepStatus::Skipped)
    }
}
