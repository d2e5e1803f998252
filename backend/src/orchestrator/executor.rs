//! Plan executor
//!
//! Applies an approved plan's mutations to the item store. Every price
//! update is attempted first, then every publish action, each in plan
//! order. A failed mutation is recorded and the batch continues; nothing
//! is rolled back.

use crate::orchestrator::actions::ActionKind;
use crate::orchestrator::merge::MergedPlan;
use crate::store::{ItemId, ItemStore, StoreContext};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A mutation that was applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedAction {
    /// Kind of mutation
    pub kind: ActionKind,
    /// Listing it was applied to
    pub id: ItemId,
}

/// A mutation that failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionFailure {
    /// Kind of mutation
    pub kind: ActionKind,
    /// Listing it targeted
    pub id: ItemId,
    /// Store error, rendered for display
    pub reason: String,
}

/// Result of executing a plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Applied mutations, in attempt order
    pub executed: Vec<ExecutedAction>,
    /// Failed mutations, in attempt order
    pub errors: Vec<ExecutionFailure>,
}

impl ExecutionOutcome {
    fn record<T, E: std::fmt::Display>(
        &mut self,
        kind: ActionKind,
        id: ItemId,
        result: Result<T, E>,
    ) {
        match result {
            Ok(_) => self.executed.push(ExecutedAction { kind, id }),
            Err(e) => {
                warn!(listing_id = %id, kind = ?kind, error = %e, "Plan mutation failed");
                self.errors.push(ExecutionFailure {
                    kind,
                    id,
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Apply `plan` to `store`
///
/// Never fails as a whole; per-item failures are collected in
/// [`ExecutionOutcome::errors`].
pub async fn execute_plan(
    store: &dyn ItemStore,
    ctx: &StoreContext,
    plan: &MergedPlan,
) -> ExecutionOutcome {
    let mut outcome = ExecutionOutcome::default();

    for update in &plan.price_updates {
        let result = store
            .update_price(ctx, update.listing_id, update.new_price)
            .await;
        outcome.record(ActionKind::PriceUpdate, update.listing_id, result);
    }

    for publish in &plan.publish_actions {
        let result = store.publish(ctx, publish.listing_id).await;
        outcome.record(ActionKind::Publish, publish.listing_id, result);
    }

    info!(
        executed = outcome.executed.len(),
        errors = outcome.errors.len(),
        "Plan execution finished"
    );
    outcome
}
