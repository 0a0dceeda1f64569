//! Lock-free process-wide counters, surfaced by `/metrics/counters` and the
//! health endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Events dropped because a session's pending queue exceeded its cap.
pub static QUEUE_DROPS: Counter = Counter::new();
/// Wire events with a type outside the closed set.
pub static UNKNOWN_EVENT_TYPES: Counter = Counter::new();
/// Duplicate events suppressed at the ingest boundary.
pub static DUPLICATE_EVENTS: Counter = Counter::new();
/// Bus publishes dropped (no subscribers or send failure).
pub static BUS_PUBLISH_DROPS: Counter = Counter::new();
/// Identity fetches that failed or timed out (fail-open to anonymous).
pub static IDENTITY_FAILURES: Counter = Counter::new();
/// Outcome writes abandoned after max retries.
pub static OUTCOME_WRITE_DROPS: Counter = Counter::new();
/// Dashboard clients disconnected for exceeding the send-buffer cap.
pub static SLOW_CLIENT_DISCONNECTS: Counter = Counter::new();
/// Intervention commands acknowledged with `delivered=false`.
pub static UNDELIVERED_INTERVENTIONS: Counter = Counter::new();
/// Classify→decide paths that overran the 50 ms budget.
pub static PIPELINE_BUDGET_OVERRUNS: Counter = Counter::new();
/// Sessions evicted by the idle sweeper.
pub static IDLE_EVICTIONS: Counter = Counter::new();

/// Snapshot of every counter, for the metrics endpoint.
pub fn snapshot() -> serde_json::Value {
    serde_json::json!({
        "queue_drops": QUEUE_DROPS.get(),
        "unknown_event_types": UNKNOWN_EVENT_TYPES.get(),
        "duplicate_events": DUPLICATE_EVENTS.get(),
        "bus_publish_drops": BUS_PUBLISH_DROPS.get(),
        "identity_failures": IDENTITY_FAILURES.get(),
        "outcome_write_drops": OUTCOME_WRITE_DROPS.get(),
        "slow_client_disconnects": SLOW_CLIENT_DISCONNECTS.get(),
        "undelivered_interventions": UNDELIVERED_INTERVENTIONS.get(),
        "pipeline_budget_overruns": PIPELINE_BUDGET_OVERRUNS.get(),
        "idle_evictions": IDLE_EVICTIONS.get(),
    })
}
