//! Run store
//!
//! Persistence contract for run records and the step outcomes recorded
//! against them:
//! - Creating a run record exactly once
//! - Fetching runs by id
//! - Reading a run's ordered step history

use async_trait::async_trait;
use sluice_core::domain::run::{PipelineRun, RunStatus};
use sluice_core::domain::step::StepOutcome;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

use crate::error::RunStoreError;

/// Read access to run history, all the re-execution planner needs
#[async_trait]
pub trait RunHistoryReader: Send + Sync {
    /// Fetches a run by id
    async fn get_by_id(&self, run_id: &str) -> Result<Option<PipelineRun>, RunStoreError>;

    /// Fetches a run's step outcomes, oldest first
    async fn get_step_outcomes(&self, run_id: &str) -> Result<Vec<StepOutcome>, RunStoreError>;
}

/// Repository trait for run records
#[async_trait]
pub trait RunStore: RunHistoryReader {
    /// Persists a new run record
    ///
    /// Must fail with [`RunStoreError::Conflict`] when the run id is taken,
    /// so that concurrent launches with the same id persist exactly one record.
    async fn create(&self, run: PipelineRun) -> Result<PipelineRun, RunStoreError>;

    /// Fetches every run whose id is in `run_ids`; missing ids are omitted
    async fn get_by_ids(
        &self,
        run_ids: &BTreeSet<String>,
    ) -> Result<HashMap<String, PipelineRun>, RunStoreError>;
}

/// In-process implementation of [`RunStore`]
///
/// Also exposes the write paths the execution backend owns (status changes
/// and step outcomes), which the orchestrator itself never calls.
#[derive(Debug, Default)]
pub struct InMemoryRunStore {
    runs: RwLock<HashMap<String, PipelineRun>>,
    outcomes: RwLock<HashMap<String, Vec<StepOutcome>>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted runs
    pub async fn len(&self) -> usize {
        self.runs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.runs.read().await.is_empty()
    }

    /// Moves a run to a new status
    ///
    /// Returns false when the run does not exist.
    pub async fn update_status(&self, run_id: &str, status: RunStatus) -> bool {
        match self.runs.write().await.get_mut(run_id) {
            Some(run) => {
                run.status = status;
                true
            }
            None => false,
        }
    }

    /// Appends a step outcome to a run's history
    pub async fn record_step_outcome(&self, run_id: &str, outcome: StepOutcome) {
        self.outcomes
            .write()
            .await
            .entry(run_id.to_string())
            .or_default()
            .push(outcome);
    }
}

#[async_trait]
impl RunHistoryReader for InMemoryRunStore {
    async fn get_by_id(&self, run_id: &str) -> Result<Option<PipelineRun>, RunStoreError> {
        Ok(self.runs.read().await.get(run_id).cloned())
    }

    async fn get_step_outcomes(&self, run_id: &str) -> Result<Vec<StepOutcome>, RunStoreError> {
        Ok(self
            .outcomes
            .read()
            .await
            .get(run_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl RunStore for InMemoryRunStore {
    async fn create(&self, run: PipelineRun) -> Result<PipelineRun, RunStoreError> {
        let mut runs = self.runs.write().await;

        if runs.contains_key(&run.run_id) {
            return Err(RunStoreError::Conflict(run.run_id));
        }

        runs.insert(run.run_id.clone(), run.clone());
        Ok(run)
    }

    async fn get_by_ids(
        &self,
        run_ids: &BTreeSet<String>,
    ) -> Result<HashMap<String, PipelineRun>, RunStoreError> {
        let runs = self.runs.read().await;

        Ok(run_ids
            .iter()
            .filter_map(|id| runs.get(id).map(|run| (id.clone(), run.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_run;
    use sluice_core::domain::step::StepStatus;

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let store = InMemoryRunStore::new();
        store.create(sample_run("r1")).await.unwrap();

        let err = store.create(sample_run("r1")).await.unwrap_err();
        assert_eq!(err, RunStoreError::Conflict("r1".to_string()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_by_ids_omits_missing() {
        let store = InMemoryRunStore::new();
        store.create(sample_run("r1")).await.unwrap();
        store.create(sample_run("r2")).await.unwrap();

        let ids = BTreeSet::from(["r1".to_string(), "missing".to_string()]);
        let runs = store.get_by_ids(&ids).await.unwrap();

        assert_eq!(runs.len(), 1);
        assert!(runs.contains_key("r1"));
    }

    #[tokio::test]
    async fn test_update_status() {
        let store = InMemoryRunStore::new();
        store.create(sample_run("r1")).await.unwrap();

        assert!(store.update_status("r1", RunStatus::Queued).await);
        assert!(!store.update_status("missing", RunStatus::Queued).await);

        let run = store.get_by_id("r1").await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Queued);
    }

    #[tokio::test]
    async fn test_step_outcomes_keep_order() {
        let store = InMemoryRunStore::new();
        store.record_step_outcome("r1", StepOutcome::failure("a")).await;
        store.record_step_outcome("r1", StepOutcome::success("a")).await;

        let outcomes = store.get_step_outcomes("r1").await.unwrap();
        let statuses: Vec<StepStatus> = outcomes.iter().map(|o| o.status).collect();
        assert_eq!(statuses, vec![StepStatus::Failure, StepStatus::Success]);

        assert!(store.get_step_outcomes("r2").await.unwrap().is_empty());
    }
}
