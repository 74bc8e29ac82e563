//! Core batching scheduler: intake, timer bank, admission, dispatch.

pub mod batcher;
pub mod error;
pub mod worker;

pub use batcher::{Batcher, Spawn};
pub use error::{AppResult, SchedulerError};
pub use worker::BatchWorker;
