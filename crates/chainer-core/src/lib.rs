//! Chained step execution engine for chainer.
//!
//! A workflow is a named, ordered list of steps, each pairing a forward
//! ("up") action with a compensating ("down") action. Running a workflow
//! executes the up actions in order; the first failure stops the forward
//! pass and the down actions of every step that already succeeded run in
//! reverse. Progress is reported step by step on a caller-owned channel.
//!
//! This crate depends only on `chainer-types` -- never on `chainer-infra`
//! or any IO crate.

pub mod chain;
