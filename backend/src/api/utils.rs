//! API utility functions
//!
//! Contains helper functions used by API handlers for validation and
//! caller identity, plus the JSON body extractor.

use crate::error::AppError;
use crate::orchestrator::constants::DEFAULT_ACTOR;
use crate::store::StoreContext;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::HeaderMap,
    Json,
};
use serde::{de::DeserializeOwned, Serialize};

/// Header naming the acting user
pub const ACTOR_HEADER: &str = "x-actor";

/// Message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable message
    pub message: String,
    /// Status indicator (e.g., "ok", "error")
    pub status: String,
}

impl MessageResponse {
    /// An "ok" message
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: "ok".to_string(),
        }
    }
}

/// JSON request body whose rejections use the `{error, status}` shape
///
/// Unparseable bodies, wrong field types and a missing
/// `Content-Type: application/json` all become `AppError::InvalidRequest`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

/// Validate a requested discount
///
/// # Returns
/// * `Ok(u8)` - Discount in 0..=100
/// * `Err(AppError::InvalidRequest)` - Anything else
pub fn validate_discount(discount_percent: i64) -> Result<u8, AppError> {
    if !(0..=100).contains(&discount_percent) {
        return Err(AppError::InvalidRequest(format!(
            "discount_percent must be between 0 and 100, got {}",
            discount_percent
        )));
    }
    Ok(discount_percent as u8)
}

/// Caller identity from the `X-Actor` header
///
/// Requests without the header act as the demo user. A present but blank
/// header is passed through so the store can reject it.
pub fn store_context(headers: &HeaderMap) -> StoreContext {
    match headers.get(ACTOR_HEADER) {
        Some(value) => StoreContext::new(value.to_str().unwrap_or_default().trim()),
        None => StoreContext::new(DEFAULT_ACTOR),
    }
}
