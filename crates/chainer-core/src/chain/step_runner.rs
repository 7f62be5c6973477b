//! Cancelable execution of a single action.
//!
//! `StepRunner::execute` runs an action exactly once. Two nested layers can
//! stop it early, both built on [`first_to_finish`]:
//!
//! - **outer layer** -- races the action against the context's cancel
//!   channel and the configured deadline. When either fires it cancels the
//!   inner token, drains the inner layer and reports `OperationCanceled`
//!   with whatever the action returned as the reason.
//! - **inner layer** -- races the action's own task against its
//!   `CancellationToken`. Once the token fires, a message-only completion is
//!   turned into an error carrying that message; a real error passes through.
//!
//! With neither a cancel channel nor a deadline the action is awaited inline
//! with a token that never fires.

use std::sync::Arc;
use std::time::Duration;

use chainer_types::config::EngineConfig;
use tokio_util::sync::CancellationToken;

use super::action::Action;
use super::context::{Canceler, ExecutionContext};
use super::error::ChainError;
use super::race::{Finish, first_to_finish, join_failure_detail};

/// What stopped an action early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// A message arrived on the context's cancel channel.
    Signal,
    /// The per-action deadline elapsed.
    Deadline(Duration),
}

/// Executes actions under the engine's cancellation policy.
#[derive(Debug, Clone, Default)]
pub struct StepRunner {
    step_timeout: Option<Duration>,
}

impl StepRunner {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            step_timeout: config.step_timeout(),
        }
    }

    pub fn with_timeout(step_timeout: Option<Duration>) -> Self {
        Self { step_timeout }
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout
    }

    /// Run `action` once and return its message, or the error that ended it.
    pub async fn execute(
        &self,
        action: &Action,
        ctx: &Arc<ExecutionContext>,
    ) -> Result<String, ChainError> {
        if ctx.canceler().is_none() && self.step_timeout.is_none() {
            return action
                .call(CancellationToken::new(), Arc::clone(ctx))
                .await
                .map_err(ChainError::from);
        }
        self.run_interruptible(action, ctx).await
    }

    /// Outer layer: external cancel signal or deadline.
    async fn run_interruptible(
        &self,
        action: &Action,
        ctx: &Arc<ExecutionContext>,
    ) -> Result<String, ChainError> {
        let token = CancellationToken::new();
        let inner = run_with_token(action.clone(), token.clone(), Arc::clone(ctx));
        let interrupt = next_interrupt(ctx.canceler(), self.step_timeout);

        let finish = first_to_finish(inner, interrupt, |cause| {
            tracing::debug!(?cause, "interrupting action");
            token.cancel();
        })
        .await
        .map_err(|e| ChainError::ActionPanicked(join_failure_detail(e)))?;

        match finish {
            Finish::Completed(result) => result,
            Finish::Interrupted { cause, result } => {
                let partial = match result {
                    Ok(message) => message,
                    Err(err) => err.to_string(),
                };
                Err(ChainError::canceled(cancel_reason(cause, partial)))
            }
        }
    }
}

/// Inner layer: the action's task against its cancellation token.
async fn run_with_token(
    action: Action,
    token: CancellationToken,
    ctx: Arc<ExecutionContext>,
) -> Result<String, ChainError> {
    let work = action.call(token.clone(), ctx);
    let finish = first_to_finish(work, token.cancelled(), |_| {})
        .await
        .map_err(|e| ChainError::ActionPanicked(join_failure_detail(e)))?;

    match finish {
        Finish::Completed(result) => result.map_err(ChainError::from),
        // Returning a message after being asked to stop is not a success.
        Finish::Interrupted {
            result: Ok(message),
            ..
        } => Err(ChainError::Action(anyhow::anyhow!(message))),
        Finish::Interrupted {
            result: Err(err), ..
        } => Err(ChainError::Action(err)),
    }
}

/// Resolves on the first cancel signal or when the deadline elapses.
/// Missing sources never resolve.
async fn next_interrupt(canceler: Option<&Canceler>, deadline: Option<Duration>) -> Interrupt {
    let signaled = async {
        match canceler {
            Some(canceler) => canceler.signaled().await,
            None => std::future::pending().await,
        }
    };
    let expired = async {
        match deadline {
            Some(limit) => {
                tokio::time::sleep(limit).await;
                limit
            }
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        () = signaled => Interrupt::Signal,
        limit = expired => Interrupt::Deadline(limit),
    }
}

fn cancel_reason(cause: Interrupt, partial: String) -> String {
    match cause {
        Interrupt::Signal => partial,
        Interrupt::Deadline(_) if partial.is_empty() => "timeout".to_string(),
        Interrupt::Deadline(_) => format!("timeout: {partial}"),
    }
}
