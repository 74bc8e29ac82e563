//! Batching scheduler with per-window deadline timers and bounded concurrency.
//!
//! All queue, timer-bank, and counter mutation happens in run-to-completion
//! critical sections behind a single `parking_lot::Mutex`. The admission loop
//! computes its full set of dispatches under the lock, then launches workers
//! and user hooks outside it, so a hook or worker can safely call back into
//! the scheduler.
//!
//! # Design
//!
//! - **Timer bank**: one deadline timer per `capacity`-sized window of pending
//!   items. A fired timer raises one unit of urgency instead of dispatching
//!   directly; its bank entry is consumed by the dispatch that covers its
//!   window. Firing re-checks bank membership under the lock, so a timer whose
//!   window was already dispatched can never raise stale urgency.
//! - **Admission loop**: while worker slots are free, outstanding urgency is
//!   serviced first (a fired timer is a promise already broken), then
//!   capacity-driven dispatch, then stop.
//! - **Deferred re-entry**: `push` schedules admission on a fresh task rather
//!   than running it on the caller's stack.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::config::BatchConfig;
use crate::core::worker::BatchWorker;
use crate::runtime::TokioSpawner;

/// Abstraction for spawning scheduler tasks on a runtime.
pub trait Spawn: Send + Sync + 'static {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Lifecycle hook invoked with no arguments.
pub(crate) type Hook = Box<dyn Fn() + Send + Sync + 'static>;

/// Per-item completion callback, shared by all items of one push call.
type ItemCallback<R> = Arc<dyn Fn(R) + Send + Sync + 'static>;

/// A queued work item: payload plus optional completion callback.
struct Item<P, R> {
    payload: P,
    callback: Option<ItemCallback<R>>,
}

/// One armed deadline timer covering a window of pending items.
///
/// Dropping the entry drops the cancel sender, which stops the timer task if
/// it has not fired yet.
struct TimerEntry {
    id: u64,
    _cancel: oneshot::Sender<()>,
}

/// Mutable scheduler state, guarded by one mutex.
struct State<P, R> {
    pending: VecDeque<Item<P, R>>,
    timers: VecDeque<TimerEntry>,
    urging: usize,
    active: usize,
}

/// A batch removed from the queue, ready to hand to the worker.
struct Dispatch<P, R> {
    batch: Vec<Item<P, R>>,
    emptied: bool,
}

struct Shared<P, R, W, S> {
    config: BatchConfig,
    worker: W,
    spawner: S,
    on_empty: Option<Hook>,
    on_drain: Option<Hook>,
    timer_seq: AtomicU64,
    state: Mutex<State<P, R>>,
}

impl<P, R, W, S> Shared<P, R, W, S>
where
    P: Send + 'static,
    R: Clone + Send + 'static,
    W: BatchWorker<P, R>,
    S: Spawn,
{
    /// Grow the timer bank until every window of pending items is covered.
    ///
    /// Invariant on exit: `timers.len() == ceil(pending.len() / capacity)`.
    fn arm_timers(this: &Arc<Self>, state: &mut State<P, R>) {
        while state.pending.len().div_ceil(this.config.capacity) > state.timers.len() {
            let id = this.timer_seq.fetch_add(1, Ordering::Relaxed);
            let (cancel, cancelled) = oneshot::channel::<()>();
            state.timers.push_back(TimerEntry { id, _cancel: cancel });

            let shared = Arc::clone(this);
            let delay = this.config.delay();
            this.spawner.spawn(async move {
                tokio::select! {
                    () = tokio::time::sleep(delay) => Self::deadline_elapsed(&shared, id),
                    _ = cancelled => {}
                }
            });
            trace!(timer = id, "armed window deadline timer");
        }
    }

    /// A window deadline elapsed: raise urgency and run the admission loop.
    ///
    /// The membership check makes cancellation race-free: if the window was
    /// already dispatched, its entry is gone and the firing is discarded.
    fn deadline_elapsed(this: &Arc<Self>, id: u64) {
        let ready = {
            let mut state = this.state.lock();
            if !state.timers.iter().any(|t| t.id == id) {
                return;
            }
            trace!(timer = id, pending = state.pending.len(), "window deadline fired");
            state.urging += 1;
            Self::admit(this, &mut state)
        };
        Self::launch(this, ready);
    }

    /// The admission loop: start as many dispatches as free worker slots and
    /// current demand allow, urgency before capacity.
    fn admit(this: &Arc<Self>, state: &mut State<P, R>) -> Vec<Dispatch<P, R>> {
        let mut ready = Vec::new();
        while state.active < this.config.concurrency {
            if state.urging > 0 {
                state.urging -= 1;
                ready.push(Self::take_batch(this, state));
            } else if state.pending.len() >= this.config.capacity {
                ready.push(Self::take_batch(this, state));
            } else {
                break;
            }
        }
        ready
    }

    /// Remove up to `capacity` items from the front of the queue and consume
    /// the timer that covered them.
    fn take_batch(this: &Arc<Self>, state: &mut State<P, R>) -> Dispatch<P, R> {
        state.active += 1;
        // The oldest outstanding entry covered the window being dispatched;
        // dropping it cancels the timer if it has not fired yet.
        drop(state.timers.pop_front());

        let take = state.pending.len().min(this.config.capacity);
        let batch: Vec<_> = state.pending.drain(..take).collect();
        let emptied = !batch.is_empty() && state.pending.is_empty();
        debug!(
            batch = batch.len(),
            active = state.active,
            pending = state.pending.len(),
            "dispatching batch"
        );
        Dispatch { batch, emptied }
    }

    /// Hand prepared batches to the worker, outside the state lock.
    ///
    /// On completion the worker result is broadcast to every item callback of
    /// the batch, the worker slot is released, `drain` fires if the scheduler
    /// became idle, and the admission loop runs again.
    fn launch(this: &Arc<Self>, dispatches: Vec<Dispatch<P, R>>) {
        for dispatch in dispatches {
            if dispatch.emptied {
                if let Some(hook) = &this.on_empty {
                    hook();
                }
            }

            let mut payloads = Vec::with_capacity(dispatch.batch.len());
            let mut callbacks = Vec::new();
            for item in dispatch.batch {
                payloads.push(item.payload);
                if let Some(callback) = item.callback {
                    callbacks.push(callback);
                }
            }

            let shared = Arc::clone(this);
            this.spawner.spawn(async move {
                let result = shared.worker.run(payloads).await;
                for callback in &callbacks {
                    callback(result.clone());
                }

                let (drained, ready) = {
                    let mut state = shared.state.lock();
                    state.active -= 1;
                    let drained = state.pending.is_empty() && state.active == 0;
                    let ready = Self::admit(&shared, &mut state);
                    (drained, ready)
                };
                if drained {
                    if let Some(hook) = &shared.on_drain {
                        hook();
                    }
                }
                Self::launch(&shared, ready);
            });
        }
    }
}

/// Time- and capacity-bounded micro-batching scheduler.
///
/// Items pushed to the scheduler are appended to a FIFO pending queue and
/// dispatched to the worker in batches of up to `capacity`, with at most
/// `concurrency` batches in flight. Every window of pending items is covered
/// by a deadline timer, so a partial window is force-flushed once it has
/// waited `delay`.
///
/// The scheduler is cheap to clone; clones share the same queue and counters.
///
/// # Example
///
/// ```rust,ignore
/// use microbatch::config::BatchConfig;
/// use microbatch::core::Batcher;
/// use microbatch::runtime::TokioSpawner;
///
/// let batcher = Batcher::new(
///     BatchConfig::new().with_capacity(50).with_concurrency(2),
///     |batch: Vec<Event>| async move { store.write_all(batch).await },
///     TokioSpawner::new(tokio::runtime::Handle::current()),
/// );
/// batcher.push(event);
/// ```
pub struct Batcher<P, R, W, S = TokioSpawner> {
    shared: Arc<Shared<P, R, W, S>>,
}

impl<P, R, W, S> Clone for Batcher<P, R, W, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<P, R, W, S> Batcher<P, R, W, S>
where
    P: Send + 'static,
    R: Clone + Send + 'static,
    W: BatchWorker<P, R>,
    S: Spawn,
{
    /// Create a new scheduler from configuration, worker, and spawner.
    ///
    /// Degenerate configuration values (zero capacity or concurrency) fall
    /// back to their defaults; construction never fails.
    pub fn new(config: BatchConfig, worker: W, spawner: S) -> Self {
        Self::with_hooks(config, worker, spawner, None, None)
    }

    pub(crate) fn with_hooks(
        config: BatchConfig,
        worker: W,
        spawner: S,
        on_empty: Option<Hook>,
        on_drain: Option<Hook>,
    ) -> Self {
        let config = config.normalized();
        Self {
            shared: Arc::new(Shared {
                config,
                worker,
                spawner,
                on_empty,
                on_drain,
                timer_seq: AtomicU64::new(0),
                state: Mutex::new(State {
                    pending: VecDeque::new(),
                    timers: VecDeque::new(),
                    urging: 0,
                    active: 0,
                }),
            }),
        }
    }

    /// Push a single item with no completion callback.
    pub fn push(&self, payload: P) -> &Self {
        self.push_inner(std::iter::once(payload), None)
    }

    /// Push a single item; `callback` receives the worker result for the
    /// batch this item ends up in.
    pub fn push_with<C>(&self, payload: P, callback: C) -> &Self
    where
        C: Fn(R) + Send + Sync + 'static,
    {
        self.push_inner(std::iter::once(payload), Some(Arc::new(callback)))
    }

    /// Push a bundle of items. All items are appended contiguously, in order.
    pub fn push_all<I>(&self, payloads: I) -> &Self
    where
        I: IntoIterator<Item = P>,
    {
        self.push_inner(payloads, None)
    }

    /// Push a bundle of items with a shared completion callback.
    ///
    /// The callback is applied to every item of this call; it is invoked once
    /// per item with the result of whichever batch carried that item.
    pub fn push_all_with<I, C>(&self, payloads: I, callback: C) -> &Self
    where
        I: IntoIterator<Item = P>,
        C: Fn(R) + Send + Sync + 'static,
    {
        self.push_inner(payloads, Some(Arc::new(callback)))
    }

    fn push_inner<I>(&self, payloads: I, callback: Option<ItemCallback<R>>) -> &Self
    where
        I: IntoIterator<Item = P>,
    {
        {
            let mut state = self.shared.state.lock();
            for payload in payloads {
                state.pending.push_back(Item {
                    payload,
                    callback: callback.clone(),
                });
            }
            Shared::arm_timers(&self.shared, &mut state);
            trace!(
                pending = state.pending.len(),
                timers = state.timers.len(),
                "accepted items"
            );
        }

        // Admission runs on a fresh task so push never recurses into dispatch
        // on the caller's stack.
        let shared = Arc::clone(&self.shared);
        self.shared.spawner.spawn(async move {
            let ready = {
                let mut state = shared.state.lock();
                Shared::admit(&shared, &mut state)
            };
            Shared::launch(&shared, ready);
        });
        self
    }

    /// Run the admission loop now.
    ///
    /// With `urgent`, one unit of urgency is raised first, forcing the oldest
    /// window out regardless of whether it reached capacity. Exposed so tests
    /// and advanced callers can intercept scheduling decisions.
    pub fn may_process(&self, urgent: bool) {
        let ready = {
            let mut state = self.shared.state.lock();
            if urgent {
                state.urging += 1;
            }
            Shared::admit(&self.shared, &mut state)
        };
        Shared::launch(&self.shared, ready);
    }

    /// Signal that the oldest window must flush regardless of capacity.
    ///
    /// Equivalent to a deadline timer firing.
    pub fn should_process(&self) {
        self.may_process(true);
    }

    /// Force a single dispatch, bypassing the admission loop.
    ///
    /// Consumes the oldest timer-bank entry and up to `capacity` items; the
    /// concurrency limit is not consulted. Exposed for tests and advanced
    /// callers.
    pub fn process(&self) {
        let dispatch = {
            let mut state = self.shared.state.lock();
            Shared::take_batch(&self.shared, &mut state)
        };
        Shared::launch(&self.shared, vec![dispatch]);
    }

    /// Number of pending items not yet absorbed into an in-flight batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    /// Whether the pending queue is empty. Workers may still be active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().pending.is_empty()
    }

    /// Whether the scheduler is fully idle: nothing pending, nothing running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        let state = self.shared.state.lock();
        state.pending.is_empty() && state.active == 0
    }

    /// Whether any batch is currently being processed by the worker.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().active > 0
    }

    /// Number of armed deadline timers.
    ///
    /// Tracks `ceil(len() / capacity)` whenever intake and dispatch have
    /// settled.
    #[must_use]
    pub fn armed_timers(&self) -> usize {
        self.shared.state.lock().timers.len()
    }
}
