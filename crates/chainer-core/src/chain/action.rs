//! Actions and steps.
//!
//! An `Action` is a type-erased async callable. It receives a cancellation
//! token and the shared `ExecutionContext`, and resolves to a human-readable
//! message or an error. A `Step` pairs an optional forward ("up") action with
//! an optional compensating ("down") action; an absent action is skipped.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::context::ExecutionContext;

/// Boxed future returned by an action.
pub type ActionFuture = Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'static>>;

type ActionFn = dyn Fn(CancellationToken, Arc<ExecutionContext>) -> ActionFuture + Send + Sync;

/// A forward or compensating operation.
///
/// Cloning is cheap (`Arc`). Implementations should pass the token to their
/// own IO and return promptly once it fires; the engine waits for the
/// returned future either way.
#[derive(Clone)]
pub struct Action {
    inner: Arc<ActionFn>,
}

impl Action {
    /// Wrap an async closure.
    ///
    /// ```
    /// use chainer_core::chain::Action;
    ///
    /// let up = Action::new(|_token, ctx| async move {
    ///     ctx.data.insert("image", serde_json::json!("nginx:1.27"));
    ///     Ok("image pulled".to_string())
    /// });
    /// # let _ = up;
    /// ```
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(CancellationToken, Arc<ExecutionContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
    {
        let erased = move |token: CancellationToken, ctx: Arc<ExecutionContext>| -> ActionFuture {
            Box::pin(f(token, ctx))
        };
        Self {
            inner: Arc::new(erased),
        }
    }

    /// Start the action. The future owns everything it needs, so it can be
    /// spawned onto its own task.
    pub fn call(&self, token: CancellationToken, ctx: Arc<ExecutionContext>) -> ActionFuture {
        (self.inner)(token, ctx)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").finish_non_exhaustive()
    }
}

/// One link of a workflow: an up action and the down action that undoes it.
#[derive(Debug, Clone, Default)]
pub struct Step {
    pub up: Option<Action>,
    pub down: Option<Action>,
}

impl Step {
    pub fn new(up: Action, down: Action) -> Self {
        Self {
            up: Some(up),
            down: Some(down),
        }
    }

    /// A step with nothing to compensate.
    pub fn up_only(up: Action) -> Self {
        Self {
            up: Some(up),
            down: None,
        }
    }

    /// A step that only acts during rollback.
    pub fn down_only(down: Action) -> Self {
        Self {
            up: None,
            down: Some(down),
        }
    }

    /// A placeholder step; contributes no notification in either phase.
    pub fn empty() -> Self {
        Self::default()
    }
}
