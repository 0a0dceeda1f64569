//! The recorder task: consumes `sessions.lifecycle` and dual-writes each
//! terminal outcome.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pulseiq_events::counters;
use pulseiq_models::{SessionLifecycleEvent, SessionOutcome};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cold::ColdLogWriter;
use crate::error::Result;
use crate::hot::HotSnapshotStore;

/// Anything that can persist an outcome. The cold log is the production
/// sink; tests substitute failure-injecting doubles.
#[async_trait]
pub trait OutcomeSink: Send + Sync {
    async fn write(&self, outcome: &SessionOutcome) -> Result<()>;
}

#[async_trait]
impl OutcomeSink for ColdLogWriter {
    async fn write(&self, outcome: &SessionOutcome) -> Result<()> {
        self.append(outcome).await
    }
}

/// Exponential backoff: 100 ms doubling to a 30 s cap, five attempts total.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(100),
            cap: Duration::from_secs(30),
            attempts: 5,
        }
    }
}

impl RetryPolicy {
    fn delay(&self, attempt: usize) -> Duration {
        let exp = self.base.saturating_mul(1_u32 << attempt.min(16) as u32);
        exp.min(self.cap)
    }
}

pub struct OutcomeRecorder {
    hot: Arc<HotSnapshotStore>,
    sink: Arc<dyn OutcomeSink>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for OutcomeRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomeRecorder")
            .field("hot_entries", &self.hot.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl OutcomeRecorder {
    pub fn new(hot: Arc<HotSnapshotStore>, sink: Arc<dyn OutcomeSink>) -> Self {
        Self {
            hot,
            sink,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Dual-write one outcome. The hot upsert is in-memory and cannot fail;
    /// the cold write retries, then drops with a counter.
    pub async fn record(&self, outcome: SessionOutcome) {
        self.hot.upsert(outcome.clone());

        for attempt in 0..self.policy.attempts {
            match self.sink.write(&outcome).await {
                Ok(()) => return,
                Err(error) => {
                    if attempt + 1 == self.policy.attempts {
                        counters::OUTCOME_WRITE_DROPS.increment();
                        tracing::warn!(
                            session_id = %outcome.session_id,
                            error = %error,
                            attempts = self.policy.attempts,
                            "outcome write dropped after retries"
                        );
                        return;
                    }
                    tokio::time::sleep(self.policy.delay(attempt)).await;
                },
            }
        }
    }

    /// Spawn the consumer loop over `sessions.lifecycle`. Runs until the
    /// token is cancelled or the bus closes.
    pub fn spawn(
        self: Arc<Self>,
        mut lifecycle: broadcast::Receiver<SessionLifecycleEvent>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    event = lifecycle.recv() => match event {
                        Ok(SessionLifecycleEvent::Terminated { outcome, .. }) => {
                            self.record(*outcome).await;
                        },
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            counters::OUTCOME_WRITE_DROPS.add(missed);
                            tracing::warn!(missed, "outcome recorder lagged behind lifecycle bus");
                        },
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            tracing::info!("outcome recorder stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use pulseiq_identifiers::{SessionId, TenantId};
    use pulseiq_models::FinalOutcome;

    use super::*;
    use crate::error::OutcomeError;

    fn outcome(session: &str) -> SessionOutcome {
        SessionOutcome {
            session_id: SessionId::new(session),
            tenant_id: TenantId::new("t1"),
            emotion_path: Vec::new(),
            final_outcome: FinalOutcome::IdleTimeout,
            peak_emotion: None,
            peak_confidence: 0,
            intervention_type: None,
            intervention_ack: None,
            duration_ms: 5_000,
            ended_at: Utc::now(),
        }
    }

    struct FlakySink {
        failures_remaining: AtomicUsize,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl OutcomeSink for FlakySink {
        async fn write(&self, _outcome: &SessionOutcome) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let remaining = self.failures_remaining.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
                return Err(OutcomeError::Io(std::io::Error::other("disk on fire")));
            }
            Ok(())
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            base: Duration::from_millis(1),
            cap: Duration::from_millis(4),
            attempts: 5,
        }
    }

    #[tokio::test]
    async fn record_upserts_hot_and_writes_cold() {
        let hot = Arc::new(HotSnapshotStore::new());
        let sink = Arc::new(FlakySink {
            failures_remaining: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        });
        let recorder =
            OutcomeRecorder::new(Arc::clone(&hot), Arc::clone(&sink) as Arc<dyn OutcomeSink>);

        recorder.record(outcome("s1")).await;

        assert!(hot.get(&SessionId::new("s1")).is_some());
        assert_eq!(sink.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let hot = Arc::new(HotSnapshotStore::new());
        let sink = Arc::new(FlakySink {
            failures_remaining: AtomicUsize::new(2),
            writes: AtomicUsize::new(0),
        });
        let recorder =
            OutcomeRecorder::new(Arc::clone(&hot), Arc::clone(&sink) as Arc<dyn OutcomeSink>)
                .with_policy(fast_policy());

        recorder.record(outcome("s1")).await;
        assert_eq!(sink.writes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failure_drops_after_max_attempts() {
        let hot = Arc::new(HotSnapshotStore::new());
        let sink = Arc::new(FlakySink {
            failures_remaining: AtomicUsize::new(usize::MAX),
            writes: AtomicUsize::new(0),
        });
        let recorder =
            OutcomeRecorder::new(Arc::clone(&hot), Arc::clone(&sink) as Arc<dyn OutcomeSink>)
                .with_policy(fast_policy());

        let drops_before = counters::OUTCOME_WRITE_DROPS.get();
        recorder.record(outcome("s1")).await;

        assert_eq!(sink.writes.load(Ordering::SeqCst), 5);
        assert_eq!(counters::OUTCOME_WRITE_DROPS.get(), drops_before + 1);
        // The hot snapshot survives even when the cold write drops.
        assert!(hot.get(&SessionId::new("s1")).is_some());
    }

    #[tokio::test]
    async fn backoff_delays_are_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(10), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn recorder_consumes_terminated_lifecycle_events() {
        let hot = Arc::new(HotSnapshotStore::new());
        let sink = Arc::new(FlakySink {
            failures_remaining: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        });
        let recorder = Arc::new(OutcomeRecorder::new(
            Arc::clone(&hot),
            Arc::clone(&sink) as Arc<dyn OutcomeSink>,
        ));

        let (tx, rx) = broadcast::channel(16);
        let shutdown = CancellationToken::new();
        let handle = recorder.spawn(rx, shutdown.clone());

        tx.send(SessionLifecycleEvent::Terminated {
            outcome: Box::new(outcome("s1")),
            ts: Utc::now(),
        })
        .expect("send");

        // Give the consumer a moment, then stop it.
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
        handle.await.expect("join");

        assert!(hot.get(&SessionId::new("s1")).is_some());
    }
}
