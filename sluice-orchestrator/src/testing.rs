//! Test fixtures and collaborator doubles

use async_trait::async_trait;
use chrono::Utc;
use sluice_core::domain::pipeline::{PipelineSelector, ResolvedPipeline};
use sluice_core::domain::run::{PipelineRun, RunStatus};
use sluice_core::graph::{StepDefinition, StepGraph};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::backend::{ExecutionBackend, Submission};
use crate::error::BackendError;
use crate::repository::{InMemoryRunStore, RunHistoryReader};
use crate::service::ValidatedRequest;

pub const LOCATION: &str = "prod";
pub const REPOSITORY: &str = "etl";

/// `a`, `b`, and `c` downstream of `b`
pub fn nightly_pipeline() -> ResolvedPipeline {
    let steps = StepGraph::new([
        StepDefinition::new("a"),
        StepDefinition::new("b"),
        StepDefinition::new("c").after(["b"]),
    ])
    .unwrap();

    ResolvedPipeline::new("nightly", nightly_selector().origin(), steps)
}

pub fn nightly_selector() -> PipelineSelector {
    PipelineSelector::new(LOCATION, REPOSITORY, "nightly")
}

pub fn sample_run(run_id: &str) -> PipelineRun {
    let pipeline = nightly_pipeline();
    PipelineRun {
        run_id: run_id.to_string(),
        pipeline_name: pipeline.name,
        origin: pipeline.origin,
        mode: "default".to_string(),
        run_config: serde_json::json!({}),
        status: RunStatus::NotStarted,
        root_run_id: None,
        parent_run_id: None,
        step_keys_to_execute: None,
        created_at: Utc::now(),
        tags: BTreeMap::new(),
    }
}

pub fn validated_request() -> ValidatedRequest {
    let pipeline = nightly_pipeline();
    ValidatedRequest {
        pipeline_name: pipeline.name,
        origin: pipeline.origin,
        mode: "default".to_string(),
        run_config: serde_json::json!({}),
        run_id: None,
        lineage: None,
        step_keys_to_execute: None,
        tags: BTreeMap::new(),
    }
}

/// Accepts everything and remembers what it was given
#[derive(Debug, Default)]
pub struct AcceptingBackend {
    submitted: Mutex<Vec<String>>,
}

impl AcceptingBackend {
    pub async fn count(&self) -> usize {
        self.submitted.lock().await.len()
    }
}

#[async_trait]
impl ExecutionBackend for AcceptingBackend {
    async fn submit(&self, run_id: &str) -> Result<Submission, BackendError> {
        self.submitted.lock().await.push(run_id.to_string());
        Ok(Submission::Accepted)
    }
}

/// Refuses every submission, either politely or by being unreachable
#[derive(Debug)]
pub enum FailingBackend {
    Rejecting(String),
    Unreachable,
}

impl FailingBackend {
    pub fn rejecting(reason: &str) -> Self {
        Self::Rejecting(reason.to_string())
    }

    pub fn unreachable() -> Self {
        Self::Unreachable
    }
}

#[async_trait]
impl ExecutionBackend for FailingBackend {
    async fn submit(&self, _run_id: &str) -> Result<Submission, BackendError> {
        match self {
            Self::Rejecting(reason) => Ok(Submission::Rejected {
                reason: reason.clone(),
            }),
            Self::Unreachable => Err(BackendError::Unavailable("connection refused".to_string())),
        }
    }
}

/// Checks at submission time that the run is already persisted
#[derive(Debug)]
pub struct PersistenceCheckingBackend {
    store: Arc<InMemoryRunStore>,
    submitted: Mutex<Vec<String>>,
    always_persisted: AtomicBool,
}

impl PersistenceCheckingBackend {
    pub fn new(store: Arc<InMemoryRunStore>) -> Self {
        Self {
            store,
            submitted: Mutex::new(Vec::new()),
            always_persisted: AtomicBool::new(true),
        }
    }

    pub async fn submitted(&self) -> Vec<String> {
        self.submitted.lock().await.clone()
    }

    pub fn always_persisted(&self) -> bool {
        self.always_persisted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionBackend for PersistenceCheckingBackend {
    async fn submit(&self, run_id: &str) -> Result<Submission, BackendError> {
        let persisted = matches!(self.store.get_by_id(run_id).await, Ok(Some(_)));
        if !persisted {
            self.always_persisted.store(false, Ordering::SeqCst);
        }

        self.submitted.lock().await.push(run_id.to_string());
        Ok(Submission::Accepted)
    }
}
