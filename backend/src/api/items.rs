//! Item API handlers
//!
//! Read and seed the listing catalog the workflows operate on.

use crate::api::utils::{store_context, JsonBody};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{Item, NewItem};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Items list response
#[derive(Debug, Serialize)]
pub struct ItemsListResponse {
    /// Items in creation order
    pub items: Vec<Item>,
    /// Total number of items
    pub count: usize,
}

/// GET /api/items - List all items
pub async fn list_items(
    State(state): State<Arc<RwLock<AppState>>>,
    headers: HeaderMap,
) -> Result<Json<ItemsListResponse>, AppError> {
    let store = state.read().await.store.clone();
    let items = store.list(&store_context(&headers)).await?;
    let count = items.len();
    Ok(Json(ItemsListResponse { items, count }))
}

/// POST /api/items - Create an item
pub async fn create_item(
    State(state): State<Arc<RwLock<AppState>>>,
    headers: HeaderMap,
    JsonBody(request): JsonBody<NewItem>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    let store = state.read().await.store.clone();
    let item = store.create(&store_context(&headers), request).await?;
    tracing::info!(listing_id = %item.id, title = %item.title, "Item created");
    Ok((StatusCode::CREATED, Json(item)))
}
