//! Builders to construct a scheduler from configuration and hooks.

pub mod batcher_builder;

pub use batcher_builder::BatcherBuilder;
