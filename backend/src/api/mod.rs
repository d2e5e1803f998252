//! API module
//!
//! Contains HTTP request handlers and the application router

pub mod items;
pub mod streaming;
pub mod utils;
pub mod workflows;

use crate::state::AppState;
use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Hello response
#[derive(Serialize)]
pub struct HelloResponse {
    message: String,
    status: String,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
    message: String,
}

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = start.elapsed().as_millis(),
        "Request completed"
    );

    response
}

/// GET / - Greeting
pub async fn hello_world() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Hello from Listing Orchestrator!".to_string(),
        status: "ok".to_string(),
    })
}

/// GET /api/health - Liveness check
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "Backend is healthy".to_string(),
    })
}

/// Build the application router
pub fn router(state: Arc<RwLock<AppState>>) -> Router {
    Router::new()
        // Health check and hello world
        .route("/", get(hello_world))
        .route("/api/health", get(health_check))
        // Catalog
        .route(
            "/api/items",
            get(items::list_items).post(items::create_item),
        )
        // Workflows
        .route(
            "/api/workflows",
            get(workflows::list_workflows).post(workflows::prepare_workflow),
        )
        .route(
            "/api/workflows/:id",
            get(workflows::get_workflow).delete(workflows::discard_workflow),
        )
        .route(
            "/api/workflows/:id/events",
            get(workflows::workflow_events_stream),
        )
        .route(
            "/api/workflows/:id/execute",
            post(workflows::execute_workflow),
        )
        .route(
            "/api/config",
            get(workflows::get_config).post(workflows::update_config),
        )
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive()) // Allow CORS for development
        .with_state(state)
}
