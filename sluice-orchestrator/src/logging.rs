//! Logging setup
//!
//! Installs the global `tracing` subscriber for processes embedding the
//! orchestrator. Filtering follows `RUST_LOG` when set.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "sluice_orchestrator=debug";

/// Installs a fmt subscriber filtered by `RUST_LOG`
///
/// Fails instead of panicking when a global subscriber is already set.
pub fn init() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    tracing::debug!("Logging initialized");

    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}
