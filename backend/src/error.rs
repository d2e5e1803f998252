//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use crate::orchestrator::state::{WorkflowError, WorkflowId};
use crate::store::StoreError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
///
/// Subsystem errors are folded in here so handlers can use `?` throughout.
#[derive(Error, Debug)]
pub enum AppError {
    /// Workflow with the given ID was not found
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(WorkflowId),

    /// Request body or parameters failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request is valid but conflicts with the workflow's current phase
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Item store operation failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NotFound(id) => AppError::WorkflowNotFound(id),
            WorkflowError::InvalidRequest(msg) => AppError::InvalidRequest(msg),
            WorkflowError::InvalidTransition { .. } | WorkflowError::DuplicateReport(_) => {
                AppError::Conflict(err.to_string())
            }
            WorkflowError::MissingResults(_) | WorkflowError::Closed(_) => {
                AppError::Internal(anyhow::Error::new(err))
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::WorkflowNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::Forbidden(_)) => StatusCode::FORBIDDEN,
            AppError::Store(StoreError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Store(StoreError::InvalidState(_)) => StatusCode::CONFLICT,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::state::WorkflowStatus;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::WorkflowNotFound(Uuid::new_v4()), StatusCode::NOT_FOUND),
            (AppError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                AppError::Store(StoreError::NotFound("x".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::Store(StoreError::Validation("x".into())),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_invalid_transition_maps_to_conflict() {
        let err: AppError = WorkflowError::InvalidTransition {
            signal: "execute",
            status: WorkflowStatus::Collecting,
        }
        .into();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}
