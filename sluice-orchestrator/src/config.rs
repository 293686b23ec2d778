//! Orchestrator configuration
//!
//! Defines the tunables for launching runs: which mode a request falls back
//! to, and how the execution backend is reached.

use std::time::Duration;

use sluice_core::domain::pipeline::DEFAULT_MODE;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Mode preferred when a launch request does not name one
    pub default_mode: String,

    /// Base URL of the HTTP execution backend (e.g., "http://localhost:8080")
    pub backend_url: Option<String>,

    /// Maximum time to wait for the backend to acknowledge a submission
    pub submit_timeout: Duration,

    /// Capacity of the in-process execution queue
    pub queue_capacity: usize,
}

impl OrchestratorConfig {
    /// Creates a new configuration with defaults
    pub fn new() -> Self {
        Self {
            default_mode: DEFAULT_MODE.to_string(),
            backend_url: None,
            submit_timeout: Duration::from_secs(10),
            queue_capacity: 1024,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - SLUICE_DEFAULT_MODE (optional, default: "default")
    /// - SLUICE_BACKEND_URL (optional)
    /// - SLUICE_SUBMIT_TIMEOUT (optional, seconds, default: 10)
    /// - SLUICE_QUEUE_CAPACITY (optional, default: 1024)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::new();

        let default_mode = std::env::var("SLUICE_DEFAULT_MODE").unwrap_or(defaults.default_mode);

        let backend_url = std::env::var("SLUICE_BACKEND_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let submit_timeout = match std::env::var("SLUICE_SUBMIT_TIMEOUT") {
            Ok(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| {
                    anyhow::anyhow!("SLUICE_SUBMIT_TIMEOUT must be a number of seconds, got '{}'", raw)
                })?,
            Err(_) => defaults.submit_timeout,
        };

        let queue_capacity = match std::env::var("SLUICE_QUEUE_CAPACITY") {
            Ok(raw) => raw
                .parse::<usize>()
                .map_err(|_| {
                    anyhow::anyhow!("SLUICE_QUEUE_CAPACITY must be a positive integer, got '{}'", raw)
                })?,
            Err(_) => defaults.queue_capacity,
        };

        let config = Self {
            default_mode,
            backend_url,
            submit_timeout,
            queue_capacity,
        };
        config.validate()?;

        Ok(config)
    }

    /// Points the orchestrator at an HTTP execution backend
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into());
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.default_mode.trim().is_empty() {
            anyhow::bail!("default_mode cannot be empty");
        }

        if let Some(url) = &self.backend_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("backend_url must start with http:// or https://");
            }
        }

        if self.submit_timeout.is_zero() {
            anyhow::bail!("submit_timeout must be greater than 0");
        }

        if self.queue_capacity == 0 {
            anyhow::bail!("queue_capacity must be greater than 0");
        }

        Ok(())
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::new()
    }
}
