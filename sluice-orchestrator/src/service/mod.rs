//! Service Module
//!
//! Business logic layer for the orchestrator.
//! Services take their collaborators as parameters and contain the launch and
//! re-execution rules; [`orchestrator::Orchestrator`] wires them together.

pub mod launcher;
pub mod orchestrator;
pub mod planner;
pub mod query;
pub mod validator;

pub use orchestrator::{LaunchRequest, Orchestrator};
pub use validator::ValidatedRequest;
