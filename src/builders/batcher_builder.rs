//! Fluent builder wiring configuration, hooks, worker, and spawner.

use std::marker::PhantomData;
use std::time::Duration;

use crate::config::BatchConfig;
use crate::core::batcher::{Batcher, Hook, Spawn};
use crate::core::{BatchWorker, SchedulerError};
use crate::runtime::TokioSpawner;

/// Builder for a [`Batcher`].
///
/// The original construction surface of this kind of scheduler tends to grow
/// positional-argument overloads; here there is exactly one path: a worker,
/// an explicit [`BatchConfig`] (or the fluent setters), and optional
/// lifecycle hooks.
///
/// # Example
///
/// ```rust,ignore
/// use microbatch::builders::BatcherBuilder;
/// use std::time::Duration;
///
/// let batcher = BatcherBuilder::new(|batch: Vec<Event>| async move {
///     store.write_all(batch).await
/// })
/// .capacity(100)
/// .concurrency(4)
/// .delay(Duration::from_millis(50))
/// .on_drain(|| tracing::info!("event queue drained"))
/// .build()?;
/// ```
pub struct BatcherBuilder<P, R, W> {
    config: BatchConfig,
    worker: W,
    on_empty: Option<Hook>,
    on_drain: Option<Hook>,
    _marker: PhantomData<fn() -> (P, R)>,
}

impl<P, R, W> BatcherBuilder<P, R, W>
where
    P: Send + 'static,
    R: Clone + Send + 'static,
    W: BatchWorker<P, R>,
{
    /// Start a builder around the given batch worker.
    pub fn new(worker: W) -> Self {
        Self {
            config: BatchConfig::new(),
            worker,
            on_empty: None,
            on_drain: None,
            _marker: PhantomData,
        }
    }

    /// Replace the whole configuration at once.
    #[must_use]
    pub fn config(mut self, config: BatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the maximum batch size.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Set the maximum number of simultaneous worker invocations.
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set the maximum wait before a partial window is flushed.
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.config = self.config.with_delay(delay);
        self
    }

    /// Hook fired each time the pending queue transitions to empty.
    ///
    /// Fires synchronously within the dispatch that removed the last item;
    /// workers may still be running.
    #[must_use]
    pub fn on_empty<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_empty = Some(Box::new(hook));
        self
    }

    /// Hook fired each time the scheduler becomes fully idle: pending queue
    /// empty and no worker in flight.
    #[must_use]
    pub fn on_drain<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_drain = Some(Box::new(hook));
        self
    }

    /// Build the scheduler on the ambient tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Runtime`] when called outside a tokio
    /// runtime context.
    pub fn build(self) -> Result<Batcher<P, R, W>, SchedulerError> {
        let spawner = TokioSpawner::current()?;
        Ok(self.build_with_spawner(spawner))
    }

    /// Build the scheduler with an explicit [`Spawn`] implementation.
    pub fn build_with_spawner<S>(self, spawner: S) -> Batcher<P, R, W, S>
    where
        S: Spawn,
    {
        Batcher::with_hooks(
            self.config,
            self.worker,
            spawner,
            self.on_empty,
            self.on_drain,
        )
    }
}
