//! Infrastructure adapters for chainer.

pub mod config;
