//! Per-run execution context.
//!
//! `ExecutionContext` bundles what every step of one run shares: the
//! `StepData` bag, an optional cancel channel, and an opaque reference to the
//! domain entity the run acts on. It is handed to actions as
//! `Arc<ExecutionContext>` and lives for the duration of one run.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use super::data::StepData;

// ---------------------------------------------------------------------------
// Cancel channel
// ---------------------------------------------------------------------------

/// Caller-side trigger for cancelling the in-flight step.
///
/// Each successful `cancel` aborts at most one step. A signal sent while no
/// step is running is held until the next step starts.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: mpsc::Sender<()>,
}

impl CancelHandle {
    /// Request cancellation, waiting if a previous signal is still pending.
    ///
    /// Returns `false` if the receiving side is gone (the context was dropped).
    pub async fn cancel(&self) -> bool {
        self.tx.send(()).await.is_ok()
    }

    /// Request cancellation without waiting. Returns `false` if a signal is
    /// already pending or the receiving side is gone.
    pub fn try_cancel(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

/// Engine-side receiver of cancel signals.
///
/// Re-armable: unlike a `CancellationToken`, consuming one signal leaves the
/// channel ready for the next step.
pub struct Canceler {
    rx: Mutex<mpsc::Receiver<()>>,
}

impl Canceler {
    /// Create a connected handle/receiver pair. One signal may be pending
    /// at a time.
    pub fn channel() -> (CancelHandle, Canceler) {
        let (tx, rx) = mpsc::channel(1);
        (
            CancelHandle { tx },
            Canceler {
                rx: Mutex::new(rx),
            },
        )
    }

    /// Resolve when a cancel signal arrives.
    ///
    /// If every `CancelHandle` has been dropped no signal can ever arrive, so
    /// this future never resolves rather than reporting a spurious cancel.
    /// Cancel-safe: dropping the future before it resolves consumes nothing.
    pub async fn signaled(&self) {
        let mut rx = self.rx.lock().await;
        if rx.recv().await.is_none() {
            drop(rx);
            std::future::pending::<()>().await;
        }
    }
}

impl fmt::Debug for Canceler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canceler").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ExecutionContext
// ---------------------------------------------------------------------------

/// Opaque domain object a run acts on (a container, a deployment, ...).
pub type Entity = Arc<dyn Any + Send + Sync>;

/// State shared by every step of one run.
#[derive(Default)]
pub struct ExecutionContext {
    /// Free-form data steps read and write. Never inspected by the engine.
    pub data: StepData,
    canceler: Option<Canceler>,
    entity: Option<Entity>,
}

impl ExecutionContext {
    /// A context with no cancel channel and no entity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a cancel channel; returns the caller-side handle.
    pub fn cancelable(mut self) -> (Self, CancelHandle) {
        let (handle, canceler) = Canceler::channel();
        self.canceler = Some(canceler);
        (self, handle)
    }

    pub fn with_canceler(mut self, canceler: Canceler) -> Self {
        self.canceler = Some(canceler);
        self
    }

    pub fn with_entity<T: Any + Send + Sync>(mut self, entity: T) -> Self {
        self.entity = Some(Arc::new(entity));
        self
    }

    pub fn with_data(mut self, data: StepData) -> Self {
        self.data = data;
        self
    }

    pub fn canceler(&self) -> Option<&Canceler> {
        self.canceler.as_ref()
    }

    /// The entity downcast to `T`, or `None` if absent or of another type.
    pub fn entity<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.entity.as_deref()?.downcast_ref::<T>()
    }

    /// The raw entity handle, for passing it on to other components.
    pub fn entity_handle(&self) -> Option<Entity> {
        self.entity.clone()
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("data", &self.data)
            .field("cancelable", &self.canceler.is_some())
            .field("has_entity", &self.entity.is_some())
            .finish()
    }
}
