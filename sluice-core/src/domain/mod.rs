//! Core domain types
//!
//! This module contains the core domain structures used across Sluice services.
//! The orchestrator creates run records from these types; the execution backend
//! and the run store own everything that happens to a run afterwards.

pub mod execution;
pub mod pipeline;
pub mod run;
pub mod step;
