//! Step progress types shared between the engine and its consumers.
//!
//! `Phase` and `StepStatus` describe where a step notification sits in a run.
//! `StepReport` is the serializable snapshot of a notification that outer
//! layers (push channels, CLI output) render without depending on the engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Which pass of a run a step notification belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Up actions, executed in step order.
    Forward,
    /// Down actions, executed in reverse step order after a forward failure.
    Rollback,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Forward => "forward",
            Phase::Rollback => "rollback",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StepStatus
// ---------------------------------------------------------------------------

/// Outcome of a single action within a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The action is about to run (only emitted when announcements are enabled).
    InProgress,
    Succeeded,
    Failed,
    /// The action was aborted by a cancel signal or a deadline.
    Canceled,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::InProgress => "in_progress",
            StepStatus::Succeeded => "succeeded",
            StepStatus::Failed => "failed",
            StepStatus::Canceled => "canceled",
        }
    }

    /// Whether this status ends the action (anything but `InProgress`).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepStatus::InProgress)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-width progress label for a phase/status pair.
///
/// Forward steps read as `Process`, rollback steps as `Rewind`, so a log of
/// labels lines up column-wise.
pub fn progress_label(phase: Phase, status: StepStatus) -> &'static str {
    match (phase, status) {
        (Phase::Forward, StepStatus::InProgress) => "Process: In progress...",
        (Phase::Forward, StepStatus::Succeeded) => "Process: ===== OK =====",
        (Phase::Forward, StepStatus::Failed) => "Process: ===== KO =====",
        (Phase::Forward, StepStatus::Canceled) => "Process: == Canceled ==",
        (Phase::Rollback, StepStatus::InProgress) => "Rewind : In progress...",
        (Phase::Rollback, StepStatus::Succeeded) => "Rewind : ===== OK =====",
        (Phase::Rollback, StepStatus::Failed) => "Rewind : ===== KO =====",
        (Phase::Rollback, StepStatus::Canceled) => "Rewind : == Canceled ==",
    }
}

// ---------------------------------------------------------------------------
// StepReport
// ---------------------------------------------------------------------------

/// Serializable snapshot of one step notification.
///
/// Errors are flattened to their display string so the report is `Clone`
/// and can cross process boundaries as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub run_id: Uuid,
    pub workflow: String,
    /// 1-based position of the step in the workflow. Zero when the run never
    /// reached a step (e.g. unknown workflow).
    pub step_number: usize,
    pub total_steps: usize,
    pub phase: Phase,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub emitted_at: DateTime<Utc>,
}

impl StepReport {
    pub fn label(&self) -> &'static str {
        progress_label(self.phase, self.status)
    }
}
