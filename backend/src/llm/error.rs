//! Generation-specific error types
//!
//! Every variant is recoverable from the caller's point of view: the
//! announcement specialist falls back to its template on any of them.

use thiserror::Error;

/// Errors returned by a [`super::TextGenerator`]
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Generation is turned off by configuration
    #[error("Text generation is disabled")]
    Disabled,

    /// No API key was configured
    #[error("API key is empty")]
    MissingApiKey,

    /// The HTTP request could not be sent or read
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    /// The service answered with a non-success status
    #[error("Service returned error status {code}: {body}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// The service rejected the call due to rate limiting (HTTP 429)
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The service refused the prompt
    #[error("Service blocked the prompt: {0}")]
    Blocked(String),

    /// The response had no usable text
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// The response could not be parsed
    #[error("Failed to parse JSON response: {0}")]
    Malformed(String),

    /// The call did not complete in time
    #[error("Generation timed out after {0} seconds")]
    Timeout(u64),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL may carry credentials
        GenerationError::Http(err.without_url())
    }
}

impl GenerationError {
    /// Short description safe to show to users
    ///
    /// Never includes upstream response bodies or request details; the
    /// full error is only logged.
    pub fn category(&self) -> String {
        match self {
            GenerationError::Disabled => "generation disabled".to_string(),
            GenerationError::MissingApiKey => "generation not configured".to_string(),
            GenerationError::Http(e) if e.is_timeout() => "generation timed out".to_string(),
            GenerationError::Http(_) => "generation service unreachable".to_string(),
            GenerationError::Status { code, .. } => format!("generation service error {}", code),
            GenerationError::RateLimited(_) => "generation rate limited".to_string(),
            GenerationError::Blocked(_) => "prompt blocked by generation service".to_string(),
            GenerationError::EmptyResponse(_) => "generation returned no copy".to_string(),
            GenerationError::Malformed(_) => "generation returned unreadable copy".to_string(),
            GenerationError::Timeout(_) => "generation timed out".to_string(),
        }
    }
}
