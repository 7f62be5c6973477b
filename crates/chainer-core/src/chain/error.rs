//! Error taxonomy of the chain engine.

use chainer_types::step::StepStatus;

/// Errors produced by registry operations and by step execution.
///
/// Step-level errors never abort the engine; they travel inside a
/// `StepNotification` and drive the forward -> rollback transition.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("workflow name is empty")]
    EmptyWorkflowName,

    /// Add, remove or run attempted while a run of the workflow is in progress.
    #[error("workflow '{0}' is busy: a run is in progress")]
    WorkflowBusy(String),

    #[error("workflow '{0}' does not exist")]
    WorkflowNotFound(String),

    /// A step was aborted by a cancel signal or a deadline. `reason` holds
    /// what the action reported when it stopped.
    #[error("operation has been canceled, reason: {:?}", display_reason(.reason))]
    OperationCanceled { reason: String },

    /// The action's task panicked instead of returning.
    #[error("action panicked: {0}")]
    ActionPanicked(String),

    /// Opaque error returned by an up/down action, kept verbatim.
    #[error(transparent)]
    Action(#[from] anyhow::Error),
}

fn display_reason(reason: &str) -> &str {
    if reason.is_empty() { "unknown" } else { reason }
}

impl ChainError {
    pub fn canceled(reason: impl Into<String>) -> Self {
        ChainError::OperationCanceled {
            reason: reason.into(),
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, ChainError::OperationCanceled { .. })
    }

    /// Notification status for a step that ended with this error.
    pub fn status(&self) -> StepStatus {
        if self.is_canceled() {
            StepStatus::Canceled
        } else {
            StepStatus::Failed
        }
    }
}
