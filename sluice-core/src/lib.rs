//! Sluice Core
//!
//! Core types and abstractions for the Sluice run orchestrator.
//!
//! This crate contains:
//! - Domain types: launch requests, pipeline references, run records and step outcomes
//! - The step dependency graph shared by validation and re-execution planning
//! - Well-known run tags written by the orchestrator

pub mod domain;
pub mod graph;
pub mod tags;
