//! Pipeline catalog
//!
//! Resolves a [`PipelineSelector`] to the pipeline definition currently
//! deployed at its location and repository.

use async_trait::async_trait;
use sluice_core::domain::pipeline::{PipelineSelector, ResolvedPipeline};
use std::collections::HashMap;

use crate::error::NotFoundError;

/// Pipeline definition store contract
///
/// Authoritative for pipeline existence and shape (step graph, modes). Pure
/// lookup, no side effects.
#[async_trait]
pub trait PipelineResolver: Send + Sync {
    /// Resolves a selector; the selector's step selection is not checked here
    async fn resolve(&self, selector: &PipelineSelector) -> Result<ResolvedPipeline, NotFoundError>;
}

type Repositories = HashMap<String, HashMap<String, ResolvedPipeline>>;

/// Deployment snapshot held in memory: locations → repositories → pipelines
#[derive(Debug, Clone, Default)]
pub struct InMemoryPipelineCatalog {
    locations: HashMap<String, Repositories>,
}

impl InMemoryPipelineCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pipeline under its own origin, replacing any previous
    /// definition with the same name
    pub fn with_pipeline(mut self, pipeline: ResolvedPipeline) -> Self {
        self.locations
            .entry(pipeline.origin.location_name.clone())
            .or_default()
            .entry(pipeline.origin.repository_name.clone())
            .or_default()
            .insert(pipeline.name.clone(), pipeline);
        self
    }

    /// Registers an empty repository
    pub fn with_repository(
        mut self,
        location_name: impl Into<String>,
        repository_name: impl Into<String>,
    ) -> Self {
        self.locations
            .entry(location_name.into())
            .or_default()
            .entry(repository_name.into())
            .or_default();
        self
    }

    /// Number of pipelines across all locations
    pub fn len(&self) -> usize {
        self.locations
            .values()
            .flat_map(|repos| repos.values())
            .map(HashMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PipelineResolver for InMemoryPipelineCatalog {
    async fn resolve(&self, selector: &PipelineSelector) -> Result<ResolvedPipeline, NotFoundError> {
        let repositories = self
            .locations
            .get(&selector.location_name)
            .ok_or_else(|| NotFoundError::Location(selector.location_name.clone()))?;

        let pipelines = repositories.get(&selector.repository_name).ok_or_else(|| {
            NotFoundError::Repository {
                location: selector.location_name.clone(),
                repository: selector.repository_name.clone(),
            }
        })?;

        let pipeline = pipelines.get(&selector.pipeline_name).ok_or_else(|| {
            NotFoundError::Pipeline {
                location: selector.location_name.clone(),
                repository: selector.repository_name.clone(),
                pipeline: selector.pipeline_name.clone(),
            }
        })?;

        tracing::debug!(
            "Resolved pipeline {} in {}/{}",
            pipeline.name,
            selector.location_name,
            selector.repository_name
        );

        Ok(pipeline.clone())
    }
}
