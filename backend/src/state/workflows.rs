//! Workflow operations on shared application state
//!
//! The registry lock is only held for lookups and inserts; signals are sent
//! to workflow tasks after the lock is released.

use crate::orchestrator::specialists::GenerationMode;
use crate::orchestrator::state::{PrepareRequest, Signal, WorkflowError, WorkflowId};
use crate::state::AppState;
use crate::store::StoreContext;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Options for preparing a workflow
#[derive(Debug, Clone)]
pub struct PrepareOptions {
    /// Sale discount, 0..=100
    pub discount_percent: u8,
    /// Free-form context; blank is treated as absent
    pub context: Option<String>,
    /// Announcement generation mode
    pub generation: GenerationMode,
    /// Caller identity for store operations
    pub store_ctx: StoreContext,
}

/// Start a new workflow and send it the prepare signal
///
/// # Returns
/// * `Ok(WorkflowId)` - Workflow is collecting specialist results
/// * `Err(WorkflowError::InvalidRequest)` - Discount or context rejected
pub async fn prepare(
    state: &Arc<RwLock<AppState>>,
    options: PrepareOptions,
) -> Result<WorkflowId, WorkflowError> {
    let context = options
        .context
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let runtime = {
        let state = state.read().await;
        let max = state.orchestrator_config.max_context_length;
        if let Some(ctx) = &context {
            if ctx.chars().count() > max {
                return Err(WorkflowError::InvalidRequest(format!(
                    "context exceeds maximum length of {} characters",
                    max
                )));
            }
        }
        state.runtime()
    };

    let handle = runtime.spawn_workflow();
    let id = handle.id();
    let request = PrepareRequest {
        discount_percent: options.discount_percent,
        context,
        generation: options.generation,
        store_ctx: options.store_ctx,
    };

    if let Err(e) = handle.send(Signal::Prepare(request)).await {
        handle.shutdown();
        return Err(e);
    }

    state.write().await.register(handle);
    info!(workflow_id = %id, discount_percent = options.discount_percent, "Workflow prepared");
    Ok(id)
}

/// Approve a ready workflow's plan
pub async fn execute(state: &Arc<RwLock<AppState>>, id: WorkflowId) -> Result<(), WorkflowError> {
    let handle = state.read().await.handle(id)?;
    handle.send(Signal::Execute).await?;
    info!(workflow_id = %id, "Workflow execution approved");
    Ok(())
}

/// Discard a workflow, whatever its phase
pub async fn discard(state: &Arc<RwLock<AppState>>, id: WorkflowId) -> Result<(), WorkflowError> {
    state.write().await.discard(id)?;
    info!(workflow_id = %id, "Workflow discarded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::DisabledGenerator;
    use crate::orchestrator::config::OrchestratorConfig;
    use crate::orchestrator::state::WorkflowStatus;
    use crate::store::{demo_items, seed, InMemoryItemStore};

    async fn shared_state() -> Arc<RwLock<AppState>> {
        let store = Arc::new(InMemoryItemStore::new());
        seed(store.as_ref(), &StoreContext::new("demo-user"), demo_items())
            .await
            .unwrap();
        Arc::new(RwLock::new(AppState::new(
            store,
            Arc::new(DisabledGenerator),
            OrchestratorConfig::default(),
        )))
    }

    fn options(discount_percent: u8, context: Option<&str>) -> PrepareOptions {
        PrepareOptions {
            discount_percent,
            context: context.map(str::to_string),
            generation: GenerationMode::Template,
            store_ctx: StoreContext::new("demo-user"),
        }
    }

    #[tokio::test]
    async fn test_prepare_execute_discard() {
        let state = shared_state().await;
        let id = prepare(&state, options(20, Some("Spring Sale"))).await.unwrap();

        let handle = state.read().await.handle(id).unwrap();
        let ready = handle.wait_for_status(WorkflowStatus::Ready).await.unwrap();
        assert_eq!(ready.context.as_deref(), Some("Spring Sale"));
        assert!(ready.plan.is_some());

        execute(&state, id).await.unwrap();
        let done = handle.wait_for_status(WorkflowStatus::Done).await.unwrap();
        assert!(done.execution_results.is_some());

        discard(&state, id).await.unwrap();
        assert!(state.read().await.handle(id).is_err());
    }

    #[tokio::test]
    async fn test_prepare_rejects_bad_input() {
        let state = shared_state().await;

        let err = prepare(&state, options(101, None)).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidRequest(_)));

        let long = "x".repeat(OrchestratorConfig::default().max_context_length + 1);
        let err = prepare(&state, options(10, Some(&long))).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidRequest(_)));

        assert_eq!(state.read().await.workflow_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_context_is_dropped() {
        let state = shared_state().await;
        let id = prepare(&state, options(10, Some("   "))).await.unwrap();
        let snapshot = state.read().await.get_status(id).unwrap();
        assert!(snapshot.context.is_none());
    }

    #[tokio::test]
    async fn test_execute_unknown_workflow() {
        let state = shared_state().await;
        let id = uuid::Uuid::new_v4();
        assert_eq!(execute(&state, id).await, Err(WorkflowError::NotFound(id)));
    }
}
