//! Store-specific error types

use thiserror::Error;

/// Errors returned by [`super::ItemStore`] operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// No item with the given ID exists
    #[error("Item not found: {0}")]
    NotFound(String),

    /// The acting user is not allowed to perform the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Input failed validation (empty title, negative price, ...)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The item is in a state that does not allow the operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The backing database returned an error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failure injected by a test store
    #[error("Injected failure: {0}")]
    Injected(String),
}
