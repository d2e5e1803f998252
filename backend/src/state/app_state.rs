// Application state management
// Contains the workflow registry and the shared collaborators

use crate::error::AppError;
use crate::llm::{DisabledGenerator, GeminiClient, TextGenerator};
use crate::orchestrator::config::{
    validate_and_apply_config_update, ConfigUpdateRequest, OrchestratorConfig,
};
use crate::orchestrator::constants::MAX_FINISHED_WORKFLOWS;
use crate::orchestrator::runtime::{WorkflowHandle, WorkflowRuntime};
use crate::orchestrator::specialists::roster;
use crate::orchestrator::state::{WorkflowError, WorkflowId, WorkflowState, WorkflowStatus};
use crate::store::ItemStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Main application state
///
/// Holds every live workflow plus the store and text generator new
/// workflows are wired to.
pub struct AppState {
    /// Registry of live workflows (id -> handle)
    pub workflows: HashMap<WorkflowId, WorkflowHandle>,
    /// Item store shared by all workflows
    pub store: Arc<dyn ItemStore>,
    /// Text generator used by new workflows
    pub generator: Arc<dyn TextGenerator>,
    /// Runtime-tunable orchestrator settings
    pub orchestrator_config: OrchestratorConfig,
    api_key: Option<String>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("workflows", &self.workflows.len())
            .field("orchestrator_config", &self.orchestrator_config)
            .finish()
    }
}

/// Build the text generator for `config`
///
/// Falls back to [`DisabledGenerator`] when generation is switched off or
/// no API key is configured.
pub fn build_generator(
    config: &OrchestratorConfig,
    api_key: Option<&str>,
) -> Arc<dyn TextGenerator> {
    match api_key {
        Some(key) if config.generation_enabled => Arc::new(
            GeminiClient::new(key, config.gemini_model.clone())
                .with_base_url(config.gemini_api_base_url.clone())
                .with_timeout(Duration::from_secs(config.generation_timeout_secs)),
        ),
        _ => Arc::new(DisabledGenerator),
    }
}

impl AppState {
    /// Create state with an explicit generator (tests, demo binary)
    pub fn new(
        store: Arc<dyn ItemStore>,
        generator: Arc<dyn TextGenerator>,
        orchestrator_config: OrchestratorConfig,
    ) -> Self {
        Self {
            workflows: HashMap::new(),
            store,
            generator,
            orchestrator_config,
            api_key: None,
        }
    }

    /// Create state whose generator follows the configuration
    ///
    /// The generator is rebuilt whenever the configuration changes.
    pub fn with_api_key(
        store: Arc<dyn ItemStore>,
        orchestrator_config: OrchestratorConfig,
        api_key: Option<String>,
    ) -> Self {
        let generator = build_generator(&orchestrator_config, api_key.as_deref());
        Self {
            workflows: HashMap::new(),
            store,
            generator,
            orchestrator_config,
            api_key,
        }
    }

    /// Runtime wired to the current store, generator and timeout
    pub fn runtime(&self) -> WorkflowRuntime {
        WorkflowRuntime::new(
            self.store.clone(),
            roster(self.store.clone(), self.generator.clone()),
            Duration::from_secs(self.orchestrator_config.specialist_timeout_secs),
        )
    }

    /// Add a workflow to the registry
    ///
    /// Also drops the oldest finished workflows beyond
    /// [`MAX_FINISHED_WORKFLOWS`].
    pub fn register(&mut self, handle: WorkflowHandle) {
        self.workflows.insert(handle.id(), handle);
        self.prune_finished(MAX_FINISHED_WORKFLOWS);
    }

    /// Keep only the `keep` most recently finished workflows
    ///
    /// Workflows that are still running are never touched.
    ///
    /// # Returns
    /// Number of workflows removed
    pub fn prune_finished(&mut self, keep: usize) -> usize {
        let mut finished: Vec<WorkflowState> = self
            .workflows
            .values()
            .map(|h| h.snapshot())
            .filter(|s| s.status == WorkflowStatus::Done)
            .collect();
        if finished.len() <= keep {
            return 0;
        }

        // Newest first
        finished.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });
        let mut removed = 0;
        for stale in finished.into_iter().skip(keep) {
            if let Some(handle) = self.workflows.remove(&stale.id) {
                handle.shutdown();
                removed += 1;
            }
        }
        debug!(removed, "Pruned finished workflows");
        removed
    }

    /// Handle of a live workflow
    pub fn handle(&self, id: WorkflowId) -> Result<WorkflowHandle, WorkflowError> {
        self.workflows
            .get(&id)
            .cloned()
            .ok_or(WorkflowError::NotFound(id))
    }

    /// Latest snapshot of a workflow
    pub fn get_status(&self, id: WorkflowId) -> Result<WorkflowState, WorkflowError> {
        self.handle(id).map(|handle| handle.snapshot())
    }

    /// Snapshots of all workflows, oldest first
    pub fn list_workflows(&self) -> Vec<WorkflowState> {
        let mut snapshots: Vec<WorkflowState> =
            self.workflows.values().map(|h| h.snapshot()).collect();
        snapshots.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        snapshots
    }

    /// Stop a workflow and drop it from the registry
    pub fn discard(&mut self, id: WorkflowId) -> Result<(), WorkflowError> {
        let handle = self.workflows.remove(&id).ok_or(WorkflowError::NotFound(id))?;
        handle.shutdown();
        Ok(())
    }

    /// Number of live workflows
    pub fn workflow_count(&self) -> usize {
        self.workflows.len()
    }

    /// Apply a validated partial configuration update
    pub fn update_config(
        &mut self,
        request: ConfigUpdateRequest,
    ) -> Result<OrchestratorConfig, AppError> {
        let updated = validate_and_apply_config_update(self.orchestrator_config.clone(), request)?;
        if self.api_key.is_some() {
            self.generator = build_generator(&updated, self.api_key.as_deref());
        }
        self.orchestrator_config = updated.clone();
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::specialists::GenerationMode;
    use crate::orchestrator::state::{PrepareRequest, Signal};
    use crate::store::{InMemoryItemStore, StoreContext};

    fn test_state() -> AppState {
        AppState::new(
            Arc::new(InMemoryItemStore::new()),
            Arc::new(DisabledGenerator),
            OrchestratorConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_register_and_discard() {
        let mut state = test_state();
        let handle = state.runtime().spawn_workflow();
        let id = handle.id();
        state.register(handle);

        assert_eq!(state.workflow_count(), 1);
        assert_eq!(state.get_status(id).unwrap().id, id);

        state.discard(id).unwrap();
        assert_eq!(state.workflow_count(), 0);
        assert_eq!(state.get_status(id), Err(WorkflowError::NotFound(id)));
        assert_eq!(state.discard(id), Err(WorkflowError::NotFound(id)));
    }

    #[tokio::test]
    async fn test_list_workflows_is_stable() {
        let mut state = test_state();
        for _ in 0..3 {
            let handle = state.runtime().spawn_workflow();
            state.register(handle);
        }

        let first: Vec<_> = state.list_workflows().iter().map(|s| s.id).collect();
        let second: Vec<_> = state.list_workflows().iter().map(|s| s.id).collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    async fn spawn_until(state: &AppState, status: WorkflowStatus) -> WorkflowHandle {
        let handle = state.runtime().spawn_workflow();
        handle
            .send(Signal::Prepare(PrepareRequest {
                discount_percent: 10,
                context: None,
                generation: GenerationMode::Template,
                store_ctx: StoreContext::new("demo-user"),
            }))
            .await
            .unwrap();
        handle.wait_for_status(WorkflowStatus::Ready).await.unwrap();
        if status == WorkflowStatus::Done {
            handle.send(Signal::Execute).await.unwrap();
            handle.wait_for_status(WorkflowStatus::Done).await.unwrap();
        }
        handle
    }

    #[tokio::test]
    async fn test_prune_finished_keeps_running_and_recent() {
        let mut state = test_state();
        let ready = spawn_until(&state, WorkflowStatus::Ready).await;
        let ready_id = ready.id();
        state.register(ready);

        let mut done_ids = Vec::new();
        for _ in 0..3 {
            let done = spawn_until(&state, WorkflowStatus::Done).await;
            done_ids.push(done.id());
            state.register(done);
        }
        assert_eq!(state.workflow_count(), 4);

        assert_eq!(state.prune_finished(1), 2);
        assert_eq!(state.workflow_count(), 2);
        assert!(state.handle(ready_id).is_ok());
        let remaining_done = done_ids
            .iter()
            .filter(|id| state.handle(**id).is_ok())
            .count();
        assert_eq!(remaining_done, 1);

        assert_eq!(state.prune_finished(1), 0);
    }

    #[tokio::test]
    async fn test_register_bounds_finished_workflows() {
        let mut state = test_state();
        for _ in 0..MAX_FINISHED_WORKFLOWS + 2 {
            let done = spawn_until(&state, WorkflowStatus::Done).await;
            state.register(done);
        }
        assert_eq!(state.workflow_count(), MAX_FINISHED_WORKFLOWS);
    }

    #[test]
    fn test_update_config_rejects_invalid_values() {
        let mut state = test_state();
        let before = state.orchestrator_config.clone();

        let result = state.update_config(ConfigUpdateRequest {
            specialist_timeout_secs: Some(0),
            ..Default::default()
        });

        assert!(result.is_err());
        assert_eq!(state.orchestrator_config, before);
    }

    #[test]
    fn test_update_config_applies_values() {
        let mut state = test_state();
        let updated = state
            .update_config(ConfigUpdateRequest {
                specialist_timeout_secs: Some(3),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.specialist_timeout_secs, 3);
        assert_eq!(state.orchestrator_config.specialist_timeout_secs, 3);
    }
}
