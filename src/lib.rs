//! # Microbatch
//!
//! A time- and capacity-bounded micro-batching scheduler for async workloads.
//!
//! This library accepts a continuous stream of discrete work items, groups
//! them into bounded-size batches, and dispatches each batch to an async
//! worker under a configurable concurrency limit. A per-window deadline timer
//! guarantees that no item waits longer than `delay` before a partial batch is
//! force-flushed.
//!
//! ## Core Problem Solved
//!
//! Many backends amortize per-call overhead across batches (bulk inserts,
//! bulk indexing, bulk push delivery), but callers produce items one at a
//! time. Batching by size alone stalls on low traffic; batching by time alone
//! wastes throughput under load. The scheduler arbitrates three competing
//! pressures:
//!
//! - **Capacity**: flush a window as soon as it reaches `capacity` items
//! - **Urgency**: flush a partial window once its deadline timer fires
//! - **Concurrency**: never run more than `concurrency` worker invocations,
//!   queueing excess demand in strict FIFO order
//!
//! ## Key Features
//!
//! - **FIFO Guarantees**: batches always take the oldest pending items first,
//!   whether triggered by capacity or urgency
//! - **Per-Window Deadline Timers**: one timer per `capacity`-sized window of
//!   pending items, cancelled the moment its window is dispatched
//! - **Lifecycle Hooks**: `empty` (queue transitioned to empty) and `drain`
//!   (queue empty and no workers in flight)
//! - **Result Fan-Out**: one worker result is broadcast to every item of the
//!   batch through per-item callbacks
//!
//! ## Example
//!
//! ```rust,ignore
//! use microbatch::builders::BatcherBuilder;
//! use std::time::Duration;
//!
//! let batcher = BatcherBuilder::new(|batch: Vec<String>| async move {
//!     index_documents(batch).await
//! })
//! .capacity(100)
//! .concurrency(4)
//! .delay(Duration::from_millis(50))
//! .build()?;
//!
//! batcher.push("doc-1".to_string());
//! batcher.push_all(vec!["doc-2".to_string(), "doc-3".to_string()]);
//! ```
//!
//! For complete examples, see:
//! - `tests/batch_flow_test.rs` - Full integration tests
//! - `README.md` - Comprehensive documentation

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core batching scheduler: intake, timer bank, admission, dispatch.
pub mod core;
/// Configuration model for capacity, concurrency, and flush delay.
pub mod config;
/// Builders to construct a scheduler from configuration and hooks.
pub mod builders;
/// Runtime adapters for spawning scheduler tasks.
pub mod runtime;
/// Shared utilities.
pub mod util;
