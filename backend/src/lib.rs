//! Listing Orchestrator Backend Library
//!
//! This library exposes modules for testing and external use.
//! The server binary is in `src/main.rs`; `src/bin/run_workflow.rs` runs a
//! single workflow in-process.

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod orchestrator;
/// Application state management
///
/// Handles the workflow registry and shared collaborators.
pub mod state;
pub mod store;
