//! Sharded worker pool with per-session affinity.
//!
//! Each shard owns a FIFO queue and one worker task. Events for a session
//! always land on the same shard, giving per-session total order without a
//! global lock. Queue overflow drops the session's oldest events: the
//! newest are the ones real-time decisions need.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use pulseiq_events::counters;
use pulseiq_identifiers::SessionId;
use pulseiq_models::TelemetryEvent;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;
use crate::pipeline::process_event;
use crate::sweeper;

/// Inflight work is flushed for this long on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct ShardQueueState {
    queue: VecDeque<TelemetryEvent>,
    pending_per_session: HashMap<SessionId, usize>,
}

#[derive(Debug, Default)]
struct ShardQueue {
    state: std::sync::Mutex<ShardQueueState>,
    notify: Notify,
}

impl ShardQueue {
    /// Enqueue with drop-oldest backpressure per session.
    fn push(&self, event: TelemetryEvent, max_per_session: usize) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let pending = state
            .pending_per_session
            .get(&event.session_id)
            .copied()
            .unwrap_or(0);
        if pending >= max_per_session {
            if let Some(oldest) = state
                .queue
                .iter()
                .position(|queued| queued.session_id == event.session_id)
            {
                state.queue.remove(oldest);
                counters::QUEUE_DROPS.increment();
            }
        } else {
            *state
                .pending_per_session
                .entry(event.session_id.clone())
                .or_insert(0) += 1;
        }

        state.queue.push_back(event);
        drop(state);
        self.notify.notify_one();
    }

    fn pop(&self) -> Option<TelemetryEvent> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let event = state.queue.pop_front()?;
        if let Some(count) = state.pending_per_session.get_mut(&event.session_id) {
            *count -= 1;
            if *count == 0 {
                state.pending_per_session.remove(&event.session_id);
            }
        }
        Some(event)
    }

    fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .queue
            .len()
    }
}

#[derive(Debug)]
pub struct ShardPool {
    queues: Vec<Arc<ShardQueue>>,
    max_per_session: usize,
    ctx: Arc<AppContext>,
}

impl ShardPool {
    fn new(ctx: Arc<AppContext>) -> Self {
        let shard_count = ctx.store().shard_count();
        Self {
            queues: (0..shard_count).map(|_| Arc::new(ShardQueue::default())).collect(),
            max_per_session: ctx.config().max_session_queue,
            ctx,
        }
    }

    /// Route one event to its owning shard.
    pub fn dispatch(&self, event: TelemetryEvent) {
        let shard = self.ctx.store().shard_index(&event.session_id);
        self.queues[shard].push(event, self.max_per_session);
    }

    pub fn queued_events(&self) -> usize {
        self.queues.iter().map(|queue| queue.len()).sum()
    }

    fn spawn_worker(
        &self,
        shard: usize,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let queue = Arc::clone(&self.queues[shard]);
        let ctx = Arc::clone(&self.ctx);

        tokio::spawn(async move {
            loop {
                while let Some(event) = queue.pop() {
                    // A panicking event must not take the shard down with
                    // it; the worker logs and moves to the next event.
                    let result = std::panic::AssertUnwindSafe(process_event(&ctx, event))
                        .catch_unwind()
                        .await;
                    if result.is_err() {
                        tracing::error!(shard, "worker recovered from panic");
                    }
                }

                if shutdown.is_cancelled() {
                    break;
                }
                tokio::select! {
                    () = queue.notify.notified() => {},
                    () = shutdown.cancelled() => {},
                }
            }

            // Flush whatever arrived before the cancellation, bounded by
            // the shutdown grace.
            let deadline = tokio::time::Instant::now() + SHUTDOWN_GRACE;
            while let Some(event) = queue.pop() {
                if tokio::time::Instant::now() >= deadline {
                    tracing::warn!(shard, remaining = queue.len(), "shutdown grace expired");
                    break;
                }
                let _ = std::panic::AssertUnwindSafe(process_event(&ctx, event))
                    .catch_unwind()
                    .await;
            }
            tracing::debug!(shard, "worker stopped");
        })
    }
}

/// Everything `start` spawned, for orderly shutdown.
#[derive(Debug)]
pub struct RuntimeHandles {
    pub pool: Arc<ShardPool>,
    pub tasks: Vec<JoinHandle<()>>,
}

/// Spawn the shard workers, the expiry sweeper, and the outcome recorder.
pub fn start(ctx: Arc<AppContext>, shutdown: CancellationToken) -> RuntimeHandles {
    let pool = Arc::new(ShardPool::new(Arc::clone(&ctx)));

    let mut tasks: Vec<JoinHandle<()>> = (0..pool.queues.len())
        .map(|shard| pool.spawn_worker(shard, shutdown.clone()))
        .collect();

    tasks.push(sweeper::spawn(Arc::clone(&ctx), shutdown.clone()));
    tasks.push(
        Arc::clone(ctx.recorder()).spawn(ctx.bus().subscribe_lifecycle(), shutdown),
    );

    RuntimeHandles { pool, tasks }
}
