//! Progress notifications emitted by a run.

use chainer_types::step::{Phase, StepReport, StepStatus, progress_label};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::ChainError;

/// One progress event of a run.
///
/// Immutable once sent. `step_number` is the step's fixed 1-based position
/// in the workflow, so forward and rollback notifications for the same step
/// share it.
#[derive(Debug)]
pub struct StepNotification {
    pub run_id: Uuid,
    pub workflow: String,
    pub step_number: usize,
    pub total_steps: usize,
    pub phase: Phase,
    pub status: StepStatus,
    pub message: String,
    pub error: Option<ChainError>,
    pub emitted_at: DateTime<Utc>,
}

impl StepNotification {
    pub(crate) fn new(
        run_id: Uuid,
        workflow: &str,
        step_number: usize,
        total_steps: usize,
        phase: Phase,
    ) -> Self {
        Self {
            run_id,
            workflow: workflow.to_string(),
            step_number,
            total_steps,
            phase,
            status: StepStatus::InProgress,
            message: String::new(),
            error: None,
            emitted_at: Utc::now(),
        }
    }

    /// Build the notification for a finished action.
    pub(crate) fn finished(mut self, outcome: Result<String, ChainError>) -> Self {
        match outcome {
            Ok(message) => {
                self.status = StepStatus::Succeeded;
                self.message = message;
            }
            Err(err) => {
                self.status = err.status();
                self.error = Some(err);
            }
        }
        self
    }

    /// Run-level failure not tied to a step (unknown or busy workflow).
    pub(crate) fn rejected(run_id: Uuid, workflow: &str, err: ChainError) -> Self {
        Self::new(run_id, workflow, 0, 0, Phase::Forward).finished(Err(err))
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Succeeded
    }

    pub fn label(&self) -> &'static str {
        progress_label(self.phase, self.status)
    }

    /// Serializable snapshot, with the error flattened to its message.
    pub fn to_report(&self) -> StepReport {
        StepReport {
            run_id: self.run_id,
            workflow: self.workflow.clone(),
            step_number: self.step_number,
            total_steps: self.total_steps,
            phase: self.phase,
            status: self.status,
            message: self.message.clone(),
            error: self.error.as_ref().map(ToString::to_string),
            emitted_at: self.emitted_at,
        }
    }
}
