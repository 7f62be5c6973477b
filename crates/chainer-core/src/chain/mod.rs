//! Saga chain engine.
//!
//! - `action` -- `Action` callables and the `Step` up/down pair
//! - `data` -- concurrent key/value bag shared by the steps of a run
//! - `context` -- `ExecutionContext`, the cancel channel and the opaque entity
//! - `error` -- `ChainError` taxonomy
//! - `race` -- first-to-finish combinator that always drains the raced task
//! - `step_runner` -- two-layer cancelable execution of one action
//! - `registry` -- concurrency-safe workflow registry with busy tracking
//! - `notification` -- `StepNotification` emitted for every executed action
//! - `engine` -- `ChainEngine`: registration plus the forward/rollback runner

pub mod action;
pub mod context;
pub mod data;
pub mod engine;
pub mod error;
pub mod notification;
pub mod race;
pub mod registry;
pub mod step_runner;

pub use action::{Action, ActionFuture, Step};
pub use context::{CancelHandle, Canceler, ExecutionContext};
pub use data::StepData;
pub use engine::ChainEngine;
pub use error::ChainError;
pub use notification::StepNotification;
