//! Span and field names recorded by the chain engine.
//!
//! The engine's `tracing` macros spell these names as literals; the
//! constants exist for filters, exporters and log consumers.

/// Span wrapping one workflow run.
pub const SPAN_CHAIN_RUN: &str = "chain_run";

/// Target prefix of every engine event.
pub const ENGINE_TARGET: &str = "chainer_core";

// --- Span fields ---

/// Workflow name.
pub const WORKFLOW: &str = "workflow";

/// Time-sortable id of one run (UUID v7).
pub const RUN_ID: &str = "run_id";

// --- Event fields ---

/// 1-based step position within the workflow.
pub const STEP: &str = "step";

/// `forward` or `rollback`.
pub const PHASE: &str = "phase";

/// Step outcome (`succeeded`, `failed`, `canceled`).
pub const STATUS: &str = "status";

pub const ERROR: &str = "error";

/// `EnvFilter` directive enabling engine events at `level`, but only inside
/// run spans.
///
/// ```
/// use chainer_observe::chain_attrs::run_directive;
/// assert_eq!(run_directive("debug"), "chainer_core[chain_run]=debug");
/// ```
pub fn run_directive(level: &str) -> String {
    format!("{ENGINE_TARGET}[{SPAN_CHAIN_RUN}]={level}")
}
