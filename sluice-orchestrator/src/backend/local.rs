//! In-process execution queue

use async_trait::async_trait;
use sluice_core::domain::run::RunStatus;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

use super::{ExecutionBackend, Submission};
use crate::config::OrchestratorConfig;
use crate::error::BackendError;
use crate::repository::InMemoryRunStore;

/// Bounded in-process queue of run ids
///
/// Workers consume accepted run ids from the receiver returned by
/// [`LocalQueueBackend::new`]. When attached to an [`InMemoryRunStore`], the
/// backend marks accepted runs QUEUED, as a real backend would.
///
/// Every accepted id is remembered for the life of the backend so that
/// resubmission stays idempotent; the set is unbounded. Use
/// [`LocalQueueBackend::forget`] once a run reaches a terminal status.
#[derive(Debug)]
pub struct LocalQueueBackend {
    sender: mpsc::Sender<String>,
    accepted: Mutex<HashSet<String>>,
    store: Option<Arc<InMemoryRunStore>>,
}

impl LocalQueueBackend {
    /// Creates a backend and the receiving end of its queue
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let backend = Self {
            sender,
            accepted: Mutex::new(HashSet::new()),
            store: None,
        };
        (backend, receiver)
    }

    /// Creates a backend sized by `queue_capacity`
    pub fn from_config(config: &OrchestratorConfig) -> (Self, mpsc::Receiver<String>) {
        Self::new(config.queue_capacity)
    }

    /// Drops a run id from the deduplication set
    ///
    /// Returns false when the id was never accepted.
    pub async fn forget(&self, run_id: &str) -> bool {
        self.accepted.lock().await.remove(run_id)
    }

    /// Number of run ids currently remembered
    pub async fn accepted_len(&self) -> usize {
        self.accepted.lock().await.len()
    }

    /// Attaches the store whose run statuses this backend owns
    pub fn with_store(mut self, store: Arc<InMemoryRunStore>) -> Self {
        self.store = Some(store);
        self
    }
}

#[async_trait]
impl ExecutionBackend for LocalQueueBackend {
    async fn submit(&self, run_id: &str) -> Result<Submission, BackendError> {
        let mut accepted = self.accepted.lock().await;

        if accepted.contains(run_id) {
            tracing::debug!("Run {} already queued, acknowledging again", run_id);
            return Ok(Submission::Accepted);
        }

        match self.sender.try_send(run_id.to_string()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                return Ok(Submission::Rejected {
                    reason: "queue full".to_string(),
                });
            }
            Err(mpsc::error::TrySendError::Closed(_)) => return Err(BackendError::QueueClosed),
        }

        accepted.insert(run_id.to_string());
        drop(accepted);

        if let Some(store) = &self.store {
            if !store.update_status(run_id, RunStatus::Queued).await {
                tracing::warn!("Queued run {} has no record in the attached store", run_id);
            }
        }

        tracing::debug!("Run {} queued", run_id);

        Ok(Submission::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{RunHistoryReader, RunStore};
    use crate::testing::sample_run;

    #[tokio::test]
    async fn test_accepts_and_enqueues() {
        let (backend, mut receiver) = LocalQueueBackend::new(4);

        let outcome = backend.submit("r1").await.unwrap();
        assert_eq!(outcome, Submission::Accepted);
        assert_eq!(receiver.recv().await, Some("r1".to_string()));
    }

    #[tokio::test]
    async fn test_resubmission_is_deduplicated() {
        let (backend, mut receiver) = LocalQueueBackend::new(4);

        backend.submit("r1").await.unwrap();
        assert_eq!(backend.submit("r1").await.unwrap(), Submission::Accepted);

        assert_eq!(receiver.recv().await, Some("r1".to_string()));
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_forget_prunes_accepted_ids() {
        let (backend, mut receiver) = LocalQueueBackend::new(4);

        backend.submit("r1").await.unwrap();
        backend.submit("r2").await.unwrap();
        assert_eq!(backend.accepted_len().await, 2);

        assert_eq!(receiver.recv().await, Some("r1".to_string()));
        assert!(backend.forget("r1").await);
        assert!(!backend.forget("r1").await);
        assert_eq!(backend.accepted_len().await, 1);
    }

    #[tokio::test]
    async fn test_full_queue_rejects() {
        let (backend, _receiver) = LocalQueueBackend::new(1);

        backend.submit("r1").await.unwrap();
        let outcome = backend.submit("r2").await.unwrap();

        assert_eq!(
            outcome,
            Submission::Rejected {
                reason: "queue full".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_capacity_from_config() {
        let mut config = OrchestratorConfig::default();
        config.queue_capacity = 2;
        let (backend, _receiver) = LocalQueueBackend::from_config(&config);

        backend.submit("r1").await.unwrap();
        backend.submit("r2").await.unwrap();
        let outcome = backend.submit("r3").await.unwrap();

        assert!(matches!(outcome, Submission::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_closed_queue_is_an_error() {
        let (backend, receiver) = LocalQueueBackend::new(1);
        drop(receiver);

        let err = backend.submit("r1").await.unwrap_err();
        assert!(matches!(err, BackendError::QueueClosed));
    }

    #[tokio::test]
    async fn test_marks_runs_queued_in_attached_store() {
        let store = Arc::new(InMemoryRunStore::new());
        store.create(sample_run("r1")).await.unwrap();

        let (backend, _receiver) = LocalQueueBackend::new(4);
        let backend = backend.with_store(store.clone());
        backend.submit("r1").await.unwrap();

        let run = store.get_by_id("r1").await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Queued);
    }
}
