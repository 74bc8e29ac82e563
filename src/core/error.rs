//! Error types for scheduler construction.
//!
//! Scheduling operations themselves never fail: degenerate configuration
//! falls back to defaults, `push` is infallible, and worker outcomes are
//! forwarded verbatim without interpretation. Errors only arise when wiring
//! the scheduler to a runtime or parsing configuration.

use thiserror::Error;

/// Errors produced while constructing a scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// No ambient tokio runtime was available to spawn scheduler tasks on.
    #[error("no tokio runtime available: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
    /// Configuration could not be parsed.
    #[error("config parse error: {0}")]
    Config(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
