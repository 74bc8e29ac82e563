//! Runtime adapters for spawning scheduler tasks.

pub mod tokio_spawner;

pub use tokio_spawner::TokioSpawner;
