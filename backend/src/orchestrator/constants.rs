//! Orchestrator constants
//!
//! Centralized constants used throughout the orchestrator module.

/// SSE stream termination signal
pub const SSE_DONE_SIGNAL: &str = "[DONE]";

/// SSE error prefix
pub const SSE_ERROR_PREFIX: &str = "[ERROR]";

/// Token budget for announcement drafts
pub const ANNOUNCEMENT_MAX_TOKENS: u32 = 512;

/// Sampling temperature for announcement drafts
pub const ANNOUNCEMENT_TEMPERATURE: f32 = 0.7;

/// Actor used when a request does not name one
pub const DEFAULT_ACTOR: &str = "demo-user";

/// Capacity of a workflow's signal channel
pub const SIGNAL_CHANNEL_CAPACITY: usize = 32;

/// Finished workflows kept in the registry; older ones are dropped
pub const MAX_FINISHED_WORKFLOWS: usize = 100;
