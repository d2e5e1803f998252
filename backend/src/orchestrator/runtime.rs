//! Workflow runtime
//!
//! Each workflow runs as one tokio task that owns its [`WorkflowState`]
//! and consumes a channel of signals. After every signal it publishes a
//! snapshot on a watch channel and carries out the returned directives:
//! specialists and the plan executor run on their own tasks and report
//! back through the same channel, so the state has a single writer.
//!
//! Specialists are supervised: a run that exceeds the configured timeout
//! or panics is reported as a zero-confidence result, so a workflow never
//! stays in `collecting` forever.

use crate::orchestrator::actions::SpecialistResult;
use crate::orchestrator::constants::SIGNAL_CHANNEL_CAPACITY;
use crate::orchestrator::executor::execute_plan;
use crate::orchestrator::specialists::{Specialist, SpecialistRequest};
use crate::orchestrator::state::{
    Directive, Signal, WorkflowError, WorkflowId, WorkflowState, WorkflowStatus,
};
use crate::store::ItemStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::AbortHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// A signal plus an optional reply slot
///
/// User commands carry a reply so the caller learns whether the signal was
/// accepted; specialist and executor reports do not.
struct Command {
    signal: Signal,
    reply: Option<oneshot::Sender<Result<(), WorkflowError>>>,
}

/// Shared dependencies for spawning workflows
#[derive(Clone)]
pub struct WorkflowRuntime {
    store: Arc<dyn ItemStore>,
    specialists: Vec<Arc<dyn Specialist>>,
    specialist_timeout: Duration,
}

impl WorkflowRuntime {
    /// Create a runtime
    ///
    /// # Arguments
    /// * `store` - Store the plan executor mutates
    /// * `specialists` - Specialists spawned for every run
    /// * `specialist_timeout` - Upper bound on each specialist run
    pub fn new(
        store: Arc<dyn ItemStore>,
        specialists: Vec<Arc<dyn Specialist>>,
        specialist_timeout: Duration,
    ) -> Self {
        Self {
            store,
            specialists,
            specialist_timeout,
        }
    }

    /// Start a new idle workflow and return its handle
    pub fn spawn_workflow(&self) -> WorkflowHandle {
        let id = Uuid::new_v4();
        let state = WorkflowState::new(id);
        let (tx, rx) = mpsc::channel(SIGNAL_CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(state.clone());

        let actor = WorkflowActor {
            state,
            rx,
            self_tx: tx.downgrade(),
            snapshot_tx,
            runtime: self.clone(),
        };
        let span = tracing::info_span!("workflow", workflow_id = %id);
        let task = tokio::spawn(actor.run().instrument(span));

        info!(workflow_id = %id, "Workflow spawned");

        WorkflowHandle {
            id,
            tx,
            snapshot_rx,
            abort: Arc::new(task.abort_handle()),
        }
    }
}

/// Client side of a running workflow
#[derive(Clone)]
pub struct WorkflowHandle {
    id: WorkflowId,
    tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<WorkflowState>,
    abort: Arc<AbortHandle>,
}

impl WorkflowHandle {
    /// Workflow ID
    pub fn id(&self) -> WorkflowId {
        self.id
    }

    /// Deliver a signal and wait until the state machine accepted or
    /// rejected it
    pub async fn send(&self, signal: Signal) -> Result<(), WorkflowError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command {
                signal,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| WorkflowError::Closed(self.id))?;
        reply_rx.await.map_err(|_| WorkflowError::Closed(self.id))?
    }

    /// Latest published state
    pub fn snapshot(&self) -> WorkflowState {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified after every transition
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.snapshot_rx.clone()
    }

    /// Wait until the workflow reaches `status` or later
    ///
    /// Returns `None` if the workflow stopped before getting there.
    pub async fn wait_for_status(&self, status: WorkflowStatus) -> Option<WorkflowState> {
        let mut rx = self.subscribe();
        let rank = |s: WorkflowStatus| s as u8;
        rx.wait_for(|state| rank(state.status) >= rank(status))
            .await
            .ok()
            .map(|state| state.clone())
    }

    /// Stop the workflow task; in-flight specialists finish and are ignored
    pub fn shutdown(&self) {
        self.abort.abort();
    }
}

struct WorkflowActor {
    state: WorkflowState,
    rx: mpsc::Receiver<Command>,
    self_tx: mpsc::WeakSender<Command>,
    snapshot_tx: watch::Sender<WorkflowState>,
    runtime: WorkflowRuntime,
}

impl WorkflowActor {
    async fn run(mut self) {
        while let Some(Command { signal, reply }) = self.rx.recv().await {
            let signal_name = signal.name();
            let from = self.state.status;

            let result = self.state.apply(signal);
            match &result {
                Ok(directives) => {
                    info!(
                        signal = signal_name,
                        from = %from,
                        to = %self.state.status,
                        "Workflow transition"
                    );
                    for directive in directives.iter().cloned() {
                        self.run_directive(directive);
                    }
                }
                Err(e) => {
                    warn!(signal = signal_name, status = %from, error = %e, "Signal rejected");
                    // Reports from workers have nobody to answer to
                    if reply.is_none() {
                        self.state.warn(e.to_string());
                    }
                }
            }

            self.snapshot_tx.send_replace(self.state.clone());

            if let Some(reply) = reply {
                let _ = reply.send(result.map(|_| ()));
            }
        }
        debug!("Workflow channel closed, actor stopping");
    }

    fn run_directive(&self, directive: Directive) {
        let Some(tx) = self.self_tx.upgrade() else {
            warn!("No live senders, dropping directive");
            return;
        };

        match directive {
            Directive::SpawnSpecialists(request) => {
                for specialist in &self.runtime.specialists {
                    spawn_specialist(
                        specialist.clone(),
                        request.clone(),
                        self.runtime.specialist_timeout,
                        tx.clone(),
                    );
                }
            }
            Directive::ExecutePlan { plan, store_ctx } => {
                let store = self.runtime.store.clone();
                tokio::spawn(
                    async move {
                        let outcome = execute_plan(store.as_ref(), &store_ctx, &plan).await;
                        let command = Command {
                            signal: Signal::ExecutionComplete(outcome),
                            reply: None,
                        };
                        if tx.send(command).await.is_err() {
                            warn!("Workflow stopped before execution completed");
                        }
                    }
                    .in_current_span(),
                );
            }
        }
    }
}

/// Run one specialist under supervision and report its result
fn spawn_specialist(
    specialist: Arc<dyn Specialist>,
    request: SpecialistRequest,
    limit: Duration,
    tx: mpsc::Sender<Command>,
) {
    let id = specialist.id();
    tokio::spawn(
        async move {
            let mut worker = tokio::spawn(async move { specialist.handle(&request).await });

            let result = match timeout(limit, &mut worker).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_error)) => {
                    error!(specialist = %id, error = %join_error, "Specialist crashed");
                    SpecialistResult::failed(format!("Specialist {} crashed: {}", id, join_error))
                }
                Err(_) => {
                    worker.abort();
                    warn!(
                        specialist = %id,
                        timeout_secs = limit.as_secs_f64(),
                        "Specialist timed out"
                    );
                    SpecialistResult::failed(format!(
                        "Specialist {} did not respond within {:.1}s",
                        id,
                        limit.as_secs_f64()
                    ))
                }
            };

            debug!(specialist = %id, confidence = result.confidence, "Specialist reported");
            let command = Command {
                signal: Signal::SpecialistReported { id, result },
                reply: None,
            };
            if tx.send(command).await.is_err() {
                debug!(specialist = %id, "Workflow gone, dropping specialist result");
            }
        }
        .in_current_span(),
    );
}
