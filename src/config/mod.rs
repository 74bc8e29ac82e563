//! Configuration model for capacity, concurrency, and flush delay.

pub mod batch;

pub use batch::BatchConfig;
