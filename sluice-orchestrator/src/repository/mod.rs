//! Repository layer
//!
//! Contracts for the external collaborators the orchestrator reads from and
//! writes to, plus in-process implementations of them. Repositories hold no
//! business logic.
//!
//! All repositories are trait-based so services can be tested against doubles.

mod catalog;
mod run_store;

// Re-export traits
pub use catalog::PipelineResolver;
pub use run_store::{RunHistoryReader, RunStore};

// Re-export implementations
pub use catalog::InMemoryPipelineCatalog;
pub use run_store::InMemoryRunStore;
