//! Chain engine: workflow registration and the forward/rollback runner.
//!
//! # Run protocol
//!
//! 1. Claim the workflow in the registry (unknown or already-running names
//!    produce a single forward `Failed` notification and stop there).
//! 2. Forward pass: run each present up action in order, one notification
//!    per action. The first failed or canceled action ends the pass.
//! 3. Rollback pass, only after a forward failure: run the down actions of
//!    the steps before the failed one, last to first. A failing down action
//!    is reported and the pass continues.
//! 4. Release the claim, then signal `done`.
//!
//! Notifications are sent with back-pressure: the runner waits for the
//! consumer to accept each one before moving on.

use std::sync::Arc;

use chainer_types::config::EngineConfig;
use chainer_types::step::Phase;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use super::action::{Action, Step};
use super::context::ExecutionContext;
use super::error::ChainError;
use super::notification::StepNotification;
use super::registry::WorkflowRegistry;
use super::step_runner::StepRunner;

/// Registry of saga workflows plus the runner that executes them.
///
/// Share it as `Arc<ChainEngine>`; runs of different workflows may proceed
/// concurrently.
#[derive(Debug, Default)]
pub struct ChainEngine {
    registry: WorkflowRegistry,
    runner: StepRunner,
    announce_steps: bool,
}

impl ChainEngine {
    /// An engine with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            registry: WorkflowRegistry::new(),
            runner: StepRunner::new(config),
            announce_steps: config.announce_steps,
        }
    }

    /// Register `steps` under `name`.
    ///
    /// Fails with `EmptyWorkflowName` for `""` and `WorkflowBusy` if a run of
    /// `name` is in progress; otherwise replaces any previous definition.
    pub fn add(&self, name: &str, steps: impl IntoIterator<Item = Step>) -> Result<(), ChainError> {
        self.registry.add(name, steps.into_iter().collect())
    }

    /// Unregister `name`. A no-op for unknown names; `WorkflowBusy` while running.
    pub fn remove(&self, name: &str) -> Result<(), ChainError> {
        self.registry.remove(name)
    }

    pub fn registry(&self) -> &WorkflowRegistry {
        &self.registry
    }

    /// Execute the workflow `name` against `ctx`.
    ///
    /// Every notification is delivered on `notifications` in order; `done`
    /// receives `true` once the last notification was accepted and the
    /// workflow is idle again. `done` also fires if an inline action panics
    /// and unwinds this future.
    pub async fn run(
        &self,
        name: &str,
        ctx: Arc<ExecutionContext>,
        notifications: mpsc::Sender<StepNotification>,
        done: oneshot::Sender<bool>,
    ) {
        // Declared before the lease so it drops after it.
        let _done = DoneSignal(Some(done));
        let run_id = Uuid::now_v7();

        let lease = match self.registry.begin_run(name) {
            Ok(lease) => lease,
            Err(err) => {
                tracing::warn!(workflow = name, %run_id, error = %err, "workflow run rejected");
                emit(&notifications, StepNotification::rejected(run_id, name, err)).await;
                return;
            }
        };

        let span = tracing::info_span!("chain_run", workflow = name, run_id = %run_id);
        let run = Run {
            engine: self,
            run_id,
            workflow: name,
            total_steps: lease.steps().len(),
            ctx: &ctx,
            notifications: &notifications,
        };
        run.drive(lease.steps()).instrument(span).await;
    }

    /// Spawn [`run`](Self::run) on its own task and return the `done` receiver.
    pub fn spawn_run(
        self: &Arc<Self>,
        name: &str,
        ctx: Arc<ExecutionContext>,
        notifications: mpsc::Sender<StepNotification>,
    ) -> (JoinHandle<()>, oneshot::Receiver<bool>) {
        let (done_tx, done_rx) = oneshot::channel();
        let engine = Arc::clone(self);
        let name = name.to_string();
        let handle = tokio::spawn(async move {
            engine.run(&name, ctx, notifications, done_tx).await;
        });
        (handle, done_rx)
    }
}

/// State of one run, borrowed from the caller of `ChainEngine::run`.
struct Run<'a> {
    engine: &'a ChainEngine,
    run_id: Uuid,
    workflow: &'a str,
    total_steps: usize,
    ctx: &'a Arc<ExecutionContext>,
    notifications: &'a mpsc::Sender<StepNotification>,
}

impl Run<'_> {
    async fn drive(&self, steps: &[Step]) {
        tracing::info!(steps = self.total_steps, "workflow run started");

        let mut failed_at = None;
        for (index, step) in steps.iter().enumerate() {
            let Some(up) = &step.up else { continue };
            if !self.perform(up, index + 1, Phase::Forward).await {
                failed_at = Some(index);
                break;
            }
        }

        let Some(failed_at) = failed_at else {
            tracing::info!("workflow run completed");
            return;
        };

        tracing::warn!(step = failed_at + 1, "forward pass stopped, rolling back");
        let mut compensation_failures = 0usize;
        for index in (0..failed_at).rev() {
            let Some(down) = &steps[index].down else { continue };
            if !self.perform(down, index + 1, Phase::Rollback).await {
                compensation_failures += 1;
            }
        }

        if compensation_failures > 0 {
            tracing::warn!(compensation_failures, "workflow rolled back with failures");
        } else {
            tracing::info!("workflow rolled back");
        }
    }

    /// Run one action and report it. Returns whether it succeeded.
    async fn perform(&self, action: &Action, step_number: usize, phase: Phase) -> bool {
        let base = || {
            StepNotification::new(
                self.run_id,
                self.workflow,
                step_number,
                self.total_steps,
                phase,
            )
        };

        if self.engine.announce_steps {
            emit(self.notifications, base()).await;
        }

        let outcome = self.engine.runner.execute(action, self.ctx).await;
        match &outcome {
            Ok(_) => tracing::debug!(step = step_number, %phase, "step succeeded"),
            Err(err) => tracing::warn!(
                step = step_number,
                %phase,
                status = %err.status(),
                error = %err,
                "step did not succeed"
            ),
        }

        let notification = base().finished(outcome);
        let succeeded = notification.is_success();
        emit(self.notifications, notification).await;
        succeeded
    }
}

/// Deliver one notification, waiting for the consumer. A dropped receiver
/// is tolerated so the run can still restore its state.
async fn emit(notifications: &mpsc::Sender<StepNotification>, notification: StepNotification) {
    if notifications.send(notification).await.is_err() {
        tracing::debug!("notification receiver dropped, discarding notification");
    }
}

/// Sends `true` on `done` when dropped.
struct DoneSignal(Option<oneshot::Sender<bool>>);

impl Drop for DoneSignal {
    fn drop(&mut self) {
        if let Some(done) = self.0.take() {
            let _ = done.send(true);
        }
    }
}
