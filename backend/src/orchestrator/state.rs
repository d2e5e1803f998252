//! Workflow state machine
//!
//! A pure reducer: [`WorkflowState::apply`] consumes one [`Signal`],
//! updates the state synchronously, and returns the [`Directive`]s the
//! runtime must carry out. It performs no I/O itself.
//!
//! Transitions (anything else is rejected and leaves the state untouched):
//!
//! | Signal               | From       | To                      |
//! |----------------------|------------|-------------------------|
//! | `Prepare`            | idle       | collecting              |
//! | `SpecialistReported` | collecting | collecting / ready      |
//! | `Execute`            | ready      | executing               |
//! | `ExecutionComplete`  | executing  | done                    |

use crate::orchestrator::actions::{SpecialistId, SpecialistResult};
use crate::orchestrator::executor::ExecutionOutcome;
use crate::orchestrator::merge::{merge, MergedPlan};
use crate::orchestrator::specialists::{GenerationMode, SpecialistRequest};
use crate::store::StoreContext;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a workflow run
pub type WorkflowId = Uuid;

/// Workflow phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Waiting for a prepare request
    Idle,
    /// Specialists are running
    Collecting,
    /// Plan merged, waiting for approval
    Ready,
    /// Plan executor is running
    Executing,
    /// Execution outcome recorded
    Done,
}

impl WorkflowStatus {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Idle => "idle",
            WorkflowStatus::Collecting => "collecting",
            WorkflowStatus::Ready => "ready",
            WorkflowStatus::Executing => "executing",
            WorkflowStatus::Done => "done",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the workflow state machine and its runtime
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    /// Signal not accepted in the current phase
    #[error("Cannot handle '{signal}' while workflow is {status}")]
    InvalidTransition {
        /// Name of the rejected signal
        signal: &'static str,
        /// Phase at the time
        status: WorkflowStatus,
    },

    /// A specialist reported twice in the same run
    #[error("Duplicate report from specialist '{0}' ignored")]
    DuplicateReport(SpecialistId),

    /// Merge attempted before every specialist reported
    #[error("Missing results from specialists: {0:?}")]
    MissingResults(Vec<SpecialistId>),

    /// Prepare request failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No workflow with the given ID
    #[error("Workflow not found: {0}")]
    NotFound(WorkflowId),

    /// The workflow's runtime task has stopped
    #[error("Workflow {0} is no longer running")]
    Closed(WorkflowId),
}

/// Request to start collecting specialist results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareRequest {
    /// Sale discount, 0..=100
    pub discount_percent: u8,
    /// Free-form context passed to specialists
    pub context: Option<String>,
    /// Announcement generation mode
    pub generation: GenerationMode,
    /// Caller identity for store operations
    pub store_ctx: StoreContext,
}

/// Input message for the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Start a run
    Prepare(PrepareRequest),
    /// A specialist finished
    SpecialistReported {
        /// Reporting specialist
        id: SpecialistId,
        /// Its result
        result: SpecialistResult,
    },
    /// User approved the plan
    Execute,
    /// Plan executor finished
    ExecutionComplete(ExecutionOutcome),
}

impl Signal {
    /// Short name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Signal::Prepare(_) => "prepare",
            Signal::SpecialistReported { .. } => "specialist_result",
            Signal::Execute => "execute",
            Signal::ExecutionComplete(_) => "execution_complete",
        }
    }
}

/// Side effect requested by the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Run every specialist with this request
    SpawnSpecialists(SpecialistRequest),
    /// Run the plan executor
    ExecutePlan {
        /// Plan to apply
        plan: MergedPlan,
        /// Caller identity for store mutations
        store_ctx: StoreContext,
    },
}

/// State of one workflow run
///
/// Owned exclusively by the workflow's runtime task; everything else sees
/// cloned snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowState {
    /// Workflow ID
    pub id: WorkflowId,
    /// Current phase
    pub status: WorkflowStatus,
    /// Specialists that have not reported yet
    pub pending: BTreeSet<SpecialistId>,
    /// Reports received so far
    pub results: BTreeMap<SpecialistId, SpecialistResult>,
    /// Merged plan, once every specialist reported
    pub plan: Option<MergedPlan>,
    /// Discount requested for this run
    pub discount_percent: u8,
    /// Context requested for this run
    pub context: Option<String>,
    /// Plan executor outcome
    pub execution_results: Option<ExecutionOutcome>,
    /// Rejected specialist reports and similar non-fatal problems
    pub warnings: Vec<String>,
    /// Creation time (Unix timestamp)
    pub created_at: i64,
    /// Last transition time (Unix timestamp)
    pub updated_at: i64,
    #[serde(skip)]
    store_ctx: Option<StoreContext>,
}

impl WorkflowState {
    /// Create an idle workflow
    pub fn new(id: WorkflowId) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id,
            status: WorkflowStatus::Idle,
            pending: BTreeSet::new(),
            results: BTreeMap::new(),
            plan: None,
            discount_percent: 0,
            context: None,
            execution_results: None,
            warnings: Vec::new(),
            created_at: now,
            updated_at: now,
            store_ctx: None,
        }
    }

    /// Record a non-fatal problem for display
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
        self.updated_at = Utc::now().timestamp();
    }

    fn reject(&self, signal: &Signal) -> WorkflowError {
        WorkflowError::InvalidTransition {
            signal: signal.name(),
            status: self.status,
        }
    }

    /// Apply one signal
    ///
    /// # Returns
    /// * `Ok(Vec<Directive>)` - Side effects to run, possibly none
    /// * `Err(WorkflowError)` - Signal rejected; state unchanged
    pub fn apply(&mut self, signal: Signal) -> Result<Vec<Directive>, WorkflowError> {
        let directives = match (self.status, signal) {
            (WorkflowStatus::Idle, Signal::Prepare(request)) => {
                if request.discount_percent > 100 {
                    return Err(WorkflowError::InvalidRequest(format!(
                        "discount_percent must be between 0 and 100, got {}",
                        request.discount_percent
                    )));
                }
                self.discount_percent = request.discount_percent;
                self.context = request.context.clone();
                self.store_ctx = Some(request.store_ctx.clone());
                self.results.clear();
                self.plan = None;
                self.pending = SpecialistId::ALL.into_iter().collect();
                self.status = WorkflowStatus::Collecting;
                vec![Directive::SpawnSpecialists(SpecialistRequest {
                    discount_percent: request.discount_percent,
                    context: request.context,
                    generation: request.generation,
                    store_ctx: request.store_ctx,
                })]
            }
            (WorkflowStatus::Collecting, Signal::SpecialistReported { id, result }) => {
                if self.results.contains_key(&id) {
                    return Err(WorkflowError::DuplicateReport(id));
                }
                self.results.insert(id, result);
                self.pending.remove(&id);
                if self.pending.is_empty() {
                    self.plan = Some(merge(&self.results)?);
                    self.status = WorkflowStatus::Ready;
                }
                Vec::new()
            }
            (WorkflowStatus::Ready, Signal::Execute) => {
                let plan = self.plan.clone().ok_or_else(|| {
                    WorkflowError::MissingResults(self.pending.iter().copied().collect())
                })?;
                let store_ctx = self.store_ctx.clone().ok_or_else(|| {
                    WorkflowError::InvalidRequest("workflow has no store context".to_string())
                })?;
                self.status = WorkflowStatus::Executing;
                vec![Directive::ExecutePlan { plan, store_ctx }]
            }
            (WorkflowStatus::Executing, Signal::ExecutionComplete(outcome)) => {
                self.execution_results = Some(outcome);
                self.status = WorkflowStatus::Done;
                Vec::new()
            }
            (_, signal) => return Err(self.reject(&signal)),
        };

        self.updated_at = Utc::now().timestamp();
        Ok(directives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepare(discount_percent: u8) -> Signal {
        Signal::Prepare(PrepareRequest {
            discount_percent,
            context: Some("Spring Sale".to_string()),
            generation: GenerationMode::Template,
            store_ctx: StoreContext::new("demo-user"),
        })
    }

    fn report(id: SpecialistId, summary: &str) -> Signal {
        Signal::SpecialistReported {
            id,
            result: SpecialistResult::new(summary, vec![], vec![format!("{} question", id)], 0.9),
        }
    }

    #[test]
    fn test_full_transition_sequence() {
        let mut state = WorkflowState::new(Uuid::new_v4());
        assert_eq!(state.status, WorkflowStatus::Idle);

        let directives = state.apply(prepare(20)).unwrap();
        assert_eq!(state.status, WorkflowStatus::Collecting);
        assert_eq!(state.pending.len(), 3);
        match &directives[..] {
            [Directive::SpawnSpecialists(request)] => {
                assert_eq!(request.discount_percent, 20);
                assert_eq!(request.context.as_deref(), Some("Spring Sale"));
            }
            other => panic!("unexpected directives: {:?}", other),
        }

        // Arrival order differs from specialist order
        state.apply(report(SpecialistId::Support, "s")).unwrap();
        state.apply(report(SpecialistId::Listings, "l")).unwrap();
        assert_eq!(state.status, WorkflowStatus::Collecting);
        assert!(state.plan.is_none());
        state
            .apply(report(SpecialistId::Recommendations, "r"))
            .unwrap();
        assert_eq!(state.status, WorkflowStatus::Ready);
        assert!(state.pending.is_empty());
        let plan = state.plan.clone().unwrap();
        assert_eq!(
            plan.all_questions,
            vec![
                "listings question",
                "recommendations question",
                "support question"
            ]
        );

        let directives = state.apply(Signal::Execute).unwrap();
        assert_eq!(state.status, WorkflowStatus::Executing);
        assert!(matches!(&directives[..], [Directive::ExecutePlan { .. }]));

        state
            .apply(Signal::ExecutionComplete(ExecutionOutcome::default()))
            .unwrap();
        assert_eq!(state.status, WorkflowStatus::Done);
        assert!(state.execution_results.is_some());
    }

    #[test]
    fn test_ready_only_when_all_three_reported() {
        let mut state = WorkflowState::new(Uuid::new_v4());
        state.apply(prepare(10)).unwrap();
        for id in [SpecialistId::Listings, SpecialistId::Recommendations] {
            state.apply(report(id, "x")).unwrap();
            assert_ne!(state.status, WorkflowStatus::Ready);
        }
        state.apply(report(SpecialistId::Support, "x")).unwrap();
        assert_eq!(state.status, WorkflowStatus::Ready);
        assert_eq!(state.results.len(), 3);
    }

    #[test]
    fn test_duplicate_report_is_rejected() {
        let mut state = WorkflowState::new(Uuid::new_v4());
        state.apply(prepare(20)).unwrap();
        state.apply(report(SpecialistId::Listings, "first")).unwrap();
        state
            .apply(report(SpecialistId::Recommendations, "r"))
            .unwrap();
        let pending_before = state.pending.clone();

        let err = state
            .apply(report(SpecialistId::Listings, "second"))
            .unwrap_err();

        assert_eq!(err, WorkflowError::DuplicateReport(SpecialistId::Listings));
        assert_eq!(state.pending, pending_before);
        assert_eq!(state.results[&SpecialistId::Listings].summary, "first");
        assert_eq!(state.status, WorkflowStatus::Collecting);

        state.apply(report(SpecialistId::Support, "s")).unwrap();
        assert_eq!(state.status, WorkflowStatus::Ready);
    }

    #[test]
    fn test_prepare_rejected_while_active() {
        let mut state = WorkflowState::new(Uuid::new_v4());
        state.apply(prepare(20)).unwrap();

        let err = state.apply(prepare(30)).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidTransition {
                signal: "prepare",
                status: WorkflowStatus::Collecting
            }
        ));
        assert_eq!(state.discount_percent, 20);
    }

    #[test]
    fn test_execute_before_ready_is_rejected() {
        let mut state = WorkflowState::new(Uuid::new_v4());
        assert!(state.apply(Signal::Execute).is_err());
        state.apply(prepare(20)).unwrap();
        assert!(state.apply(Signal::Execute).is_err());
        assert_eq!(state.status, WorkflowStatus::Collecting);
    }

    #[test]
    fn test_report_outside_collecting_is_rejected() {
        let mut state = WorkflowState::new(Uuid::new_v4());
        let err = state
            .apply(report(SpecialistId::Listings, "early"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
        assert!(state.results.is_empty());
    }

    #[test]
    fn test_discount_over_100_is_rejected() {
        let mut state = WorkflowState::new(Uuid::new_v4());
        let err = state.apply(prepare(101)).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidRequest(_)));
        assert_eq!(state.status, WorkflowStatus::Idle);
    }

    #[test]
    fn test_snapshot_serializes_status() {
        let state = WorkflowState::new(Uuid::new_v4());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "idle");
        assert!(json.get("store_ctx").is_none());
    }
}
