//! Observability for chainer: subscriber setup and span field names.

pub mod chain_attrs;
pub mod tracing_setup;
