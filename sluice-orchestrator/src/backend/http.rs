//! HTTP execution backend
//!
//! Submits runs to a remote backend:
//! - `POST {base_url}/api/runs/{run_id}/submit`
//! - 2xx, or 409 for a run the backend already holds, is an acknowledgment
//! - any other status is a rejection carrying the response body

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::{ExecutionBackend, Submission};
use crate::config::OrchestratorConfig;
use crate::error::BackendError;

/// HTTP implementation of [`ExecutionBackend`]
#[derive(Debug, Clone)]
pub struct HttpExecutionBackend {
    /// Base URL of the backend (e.g., "http://localhost:8080")
    base_url: String,
    client: Client,
}

impl HttpExecutionBackend {
    /// Creates a backend client with default HTTP settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Creates a backend client around a configured reqwest Client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Builds the backend from `backend_url` and `submit_timeout`
    pub fn from_config(config: &OrchestratorConfig) -> anyhow::Result<Self> {
        let base_url = config
            .backend_url
            .as_deref()
            .context("backend_url is not configured")?;

        let client = Client::builder()
            .timeout(config.submit_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_client(base_url, client))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submission endpoint for `run_id`, percent-encoded as one path segment
    fn submit_url(&self, run_id: &str) -> Result<Url, BackendError> {
        let invalid = |reason: String| BackendError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };

        let mut url = Url::parse(&self.base_url).map_err(|err| invalid(err.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| invalid("cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(["api", "runs", run_id, "submit"]);

        Ok(url)
    }
}

#[async_trait]
impl ExecutionBackend for HttpExecutionBackend {
    async fn submit(&self, run_id: &str) -> Result<Submission, BackendError> {
        let response = self.client.post(self.submit_url(run_id)?).send().await?;
        let status = response.status();

        if status.is_success() || status == StatusCode::CONFLICT {
            return Ok(Submission::Accepted);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => format!("<unreadable body: {}>", err),
        };

        Ok(Submission::Rejected {
            reason: format!("{} - {}", status, body),
        })
    }
}
