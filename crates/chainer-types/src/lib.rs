//! Shared domain types for the chainer saga engine.
//!
//! Step phases and statuses, the serializable `StepReport` emitted to
//! outer layers, and the engine configuration.
//!
//! Zero runtime dependencies -- only serde, uuid, chrono.

pub mod config;
pub mod step;
