//! Batch worker trait and closure adapter.

use std::future::Future;

use async_trait::async_trait;

/// Abstraction for processing one dispatched batch.
///
/// The worker receives the ordered payloads of a batch and produces a single
/// result. The scheduler does not interpret the result as success or failure;
/// it is broadcast as-is to every item callback of the batch. Completion is
/// signalled by the returned future resolving; a worker whose future never
/// resolves permanently occupies one concurrency slot.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use microbatch::core::BatchWorker;
///
/// struct BulkIndexer { endpoint: String }
///
/// #[async_trait]
/// impl BatchWorker<String, usize> for BulkIndexer {
///     async fn run(&self, batch: Vec<String>) -> usize {
///         index_documents(&self.endpoint, &batch).await;
///         batch.len()
///     }
/// }
/// ```
#[async_trait]
pub trait BatchWorker<P, R>: Send + Sync + 'static
where
    P: Send + 'static,
    R: Send + 'static,
{
    /// Process one batch of payloads, in dispatch order, and return a result.
    async fn run(&self, batch: Vec<P>) -> R;
}

/// Blanket implementation so plain async closures can serve as workers.
#[async_trait]
impl<P, R, F, Fut> BatchWorker<P, R> for F
where
    P: Send + 'static,
    R: Send + 'static,
    F: Fn(Vec<P>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    async fn run(&self, batch: Vec<P>) -> R {
        (self)(batch).await
    }
}
