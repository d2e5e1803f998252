//! Workflow API handlers
//!
//! Contains HTTP request handlers for preparing, inspecting, approving
//! and discarding sale-preparation workflows, plus the orchestrator
//! configuration endpoints.
//!
//! Preparation and execution run in the background: the handlers return
//! `202 Accepted` and clients follow progress through the snapshot
//! endpoint or the SSE event stream.

use crate::api::streaming::{sse_response, workflow_events};
use crate::api::utils::{store_context, validate_discount, JsonBody, MessageResponse};
use crate::error::AppError;
use crate::orchestrator::config::{ConfigUpdateRequest, OrchestratorConfig};
use crate::orchestrator::specialists::GenerationMode;
use crate::orchestrator::state::{WorkflowId, WorkflowState, WorkflowStatus};
use crate::state::{workflows, AppState, PrepareOptions};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Prepare workflow request
#[derive(Debug, Deserialize)]
pub struct PrepareWorkflowRequest {
    /// Sale discount, 0..=100
    pub discount_percent: i64,
    /// Free-form context, e.g. the sale's name (optional)
    pub context: Option<String>,
    /// Announcement generation mode (optional, defaults to `llm`)
    pub generation: Option<GenerationMode>,
}

/// Response for accepted workflow commands
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkflowAccepted {
    /// Workflow ID
    pub workflow_id: WorkflowId,
    /// Phase after the command was accepted
    pub status: WorkflowStatus,
}

/// Workflows list response
#[derive(Debug, Serialize)]
pub struct WorkflowsListResponse {
    /// Snapshots of all workflows, oldest first
    pub workflows: Vec<WorkflowState>,
    /// Total number of workflows
    pub count: usize,
}

/// POST /api/workflows - Start a workflow
pub async fn prepare_workflow(
    State(state): State<Arc<RwLock<AppState>>>,
    headers: HeaderMap,
    JsonBody(request): JsonBody<PrepareWorkflowRequest>,
) -> Result<(StatusCode, Json<WorkflowAccepted>), AppError> {
    let discount_percent = validate_discount(request.discount_percent)?;

    let options = PrepareOptions {
        discount_percent,
        context: request.context,
        generation: request.generation.unwrap_or_default(),
        store_ctx: store_context(&headers),
    };
    let workflow_id = workflows::prepare(&state, options).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(WorkflowAccepted {
            workflow_id,
            status: WorkflowStatus::Collecting,
        }),
    ))
}

/// GET /api/workflows - List all workflows
pub async fn list_workflows(
    State(state): State<Arc<RwLock<AppState>>>,
) -> Json<WorkflowsListResponse> {
    let workflows = state.read().await.list_workflows();
    let count = workflows.len();
    Json(WorkflowsListResponse { workflows, count })
}

/// GET /api/workflows/:id - Latest snapshot
pub async fn get_workflow(
    State(state): State<Arc<RwLock<AppState>>>,
    Path(id): Path<WorkflowId>,
) -> Result<Json<WorkflowState>, AppError> {
    let snapshot = state.read().await.get_status(id)?;
    Ok(Json(snapshot))
}

/// GET /api/workflows/:id/events - SSE stream of snapshots
pub async fn workflow_events_stream(
    State(state): State<Arc<RwLock<AppState>>>,
    Path(id): Path<WorkflowId>,
) -> Result<Response, AppError> {
    let rx = state.read().await.handle(id)?.subscribe();
    sse_response(workflow_events(rx))
}

/// POST /api/workflows/:id/execute - Approve the plan
///
/// Returns 409 unless the workflow is ready.
pub async fn execute_workflow(
    State(state): State<Arc<RwLock<AppState>>>,
    Path(id): Path<WorkflowId>,
) -> Result<(StatusCode, Json<WorkflowAccepted>), AppError> {
    workflows::execute(&state, id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(WorkflowAccepted {
            workflow_id: id,
            status: WorkflowStatus::Executing,
        }),
    ))
}

/// DELETE /api/workflows/:id - Discard a workflow
pub async fn discard_workflow(
    State(state): State<Arc<RwLock<AppState>>>,
    Path(id): Path<WorkflowId>,
) -> Result<Json<MessageResponse>, AppError> {
    workflows::discard(&state, id).await?;
    Ok(Json(MessageResponse::ok(format!("Workflow {} discarded", id))))
}

/// GET /api/config - Current orchestrator configuration
pub async fn get_config(
    State(state): State<Arc<RwLock<AppState>>>,
) -> Json<OrchestratorConfig> {
    Json(state.read().await.orchestrator_config.clone())
}

/// POST /api/config - Partial configuration update
pub async fn update_config(
    State(state): State<Arc<RwLock<AppState>>>,
    JsonBody(request): JsonBody<ConfigUpdateRequest>,
) -> Result<Json<OrchestratorConfig>, AppError> {
    let updated = state.write().await.update_config(request)?;
    tracing::info!(config = ?updated, "Orchestrator configuration updated");
    Ok(Json(updated))
}
