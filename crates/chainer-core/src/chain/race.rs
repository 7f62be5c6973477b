//! First-to-finish race between a spawned task and an interrupt source.
//!
//! Both cancellation layers of the step runner are built on
//! [`first_to_finish`]. Whichever side wins, the spawned task is awaited to
//! completion before the race returns, so no work outlives its caller. If the
//! race future itself is dropped mid-flight, the task is aborted.

use std::future::Future;

use tokio::task::JoinError;
use tokio_util::task::AbortOnDropHandle;

/// How a raced task ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Finish<T, C> {
    /// The task finished before the interrupt fired.
    Completed(T),
    /// The interrupt fired first; `result` is what the task returned after
    /// being drained.
    Interrupted { cause: C, result: T },
}

impl<T, C> Finish<T, C> {
    pub fn into_result(self) -> T {
        match self {
            Finish::Completed(result) | Finish::Interrupted { result, .. } => result,
        }
    }

    pub fn was_interrupted(&self) -> bool {
        matches!(self, Finish::Interrupted { .. })
    }
}

/// Spawn `work` and race it against `interrupt`.
///
/// When `interrupt` resolves first, `on_interrupt` runs (typically to tell the
/// task to stop) and the task is then drained. Completion wins ties.
///
/// Returns the task's `JoinError` if it panicked or was aborted.
pub async fn first_to_finish<W, I, C, H>(
    work: W,
    interrupt: I,
    on_interrupt: H,
) -> Result<Finish<W::Output, C>, JoinError>
where
    W: Future + Send + 'static,
    W::Output: Send + 'static,
    I: Future<Output = C>,
    H: FnOnce(&C),
{
    let mut task = AbortOnDropHandle::new(tokio::spawn(work));

    tokio::select! {
        biased;
        joined = &mut task => joined.map(Finish::Completed),
        cause = interrupt => {
            on_interrupt(&cause);
            let result = task.await?;
            Ok(Finish::Interrupted { cause, result })
        }
    }
}

/// Human-readable detail for a task that did not return normally.
pub fn join_failure_detail(err: JoinError) -> String {
    if err.is_panic() {
        let payload = err.into_panic();
        if let Some(msg) = payload.downcast_ref::<&str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "non-string panic payload".to_string()
        }
    } else {
        "task was aborted".to_string()
    }
}
