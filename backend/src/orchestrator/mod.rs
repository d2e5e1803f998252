//! Orchestrator module
//!
//! Coordinates a sale-preparation workflow: three specialists analyze the
//! catalog concurrently, their results are merged into one plan, and an
//! approved plan is applied to the item store.
//!
//! The state machine in [`state`] is pure; [`runtime`] owns the tasks and
//! channels that drive it.

pub mod actions;
pub mod config;
pub mod constants;
pub mod executor;
pub mod merge;
pub mod runtime;
pub mod specialists;
pub mod state;

pub use actions::{ProposedAction, SpecialistId, SpecialistResult};
pub use merge::MergedPlan;
pub use runtime::{WorkflowHandle, WorkflowRuntime};
pub use state::{
    PrepareRequest, Signal, WorkflowError, WorkflowId, WorkflowState, WorkflowStatus,
};
