//! Sluice Orchestrator
//!
//! Launches pipeline runs and re-executions for the Sluice batch job system.
//!
//! A launch request is resolved against the deployed pipeline definitions,
//! validated, optionally planned for re-execution from a parent run's
//! failures, persisted, and handed to an execution backend. Collaborators
//! (pipeline resolver, run store, execution backend) are injected as traits.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sluice_core::domain::execution::ExecutionParams;
//! use sluice_core::domain::pipeline::PipelineSelector;
//! use sluice_orchestrator::backend::HttpExecutionBackend;
//! use sluice_orchestrator::config::OrchestratorConfig;
//! use sluice_orchestrator::repository::{InMemoryPipelineCatalog, InMemoryRunStore};
//! use sluice_orchestrator::service::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     sluice_orchestrator::logging::init()?;
//!     let config = OrchestratorConfig::from_env()?;
//!
//!     let orchestrator = Orchestrator::new(
//!         Arc::new(InMemoryPipelineCatalog::new()),
//!         Arc::new(InMemoryRunStore::new()),
//!         Arc::new(HttpExecutionBackend::from_config(&config)?),
//!         config,
//!     );
//!
//!     let selector = PipelineSelector::new("prod", "etl", "nightly");
//!     let run = orchestrator.launch_execution(ExecutionParams::new(selector)).await?;
//!     println!("Launched run: {}", run.run_id);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod repository;
pub mod service;

#[cfg(test)]
mod testing;

pub use error::{OrchestratorError, Result};
