//! Dashboard fan-out hub.
//!
//! Each dashboard WebSocket registers one connection with a server-side
//! filter. Publishing walks the registered connections, applies each filter,
//! and enqueues the serialized frame. A connection whose un-flushed bytes
//! would exceed [`MAX_BUFFERED_BYTES`] is disconnected on the spot; slow
//! consumers never backpressure the classifier path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use pulseiq_identifiers::{ConnectionId, TenantId};
use pulseiq_models::{EmotionSample, ServerFrame, SubscriptionFilter};
use tokio::sync::mpsc;

use crate::counters;

/// Hard cap on bytes buffered toward one dashboard client.
pub const MAX_BUFFERED_BYTES: usize = 1024 * 1024;

#[derive(Debug)]
struct Connection {
    sender: mpsc::UnboundedSender<String>,
    filter: SubscriptionFilter,
    buffered: Arc<AtomicUsize>,
}

/// Handle returned to the WebSocket writer task.
#[derive(Debug)]
pub struct HubConnection {
    pub receiver: mpsc::UnboundedReceiver<String>,
    /// Decrement by the frame's length after each successful socket write.
    pub buffered: Arc<AtomicUsize>,
}

#[derive(Debug, Default)]
pub struct DashboardHub {
    connections: DashMap<ConnectionId, Connection>,
}

impl DashboardHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection; an existing registration under the same id is
    /// replaced.
    pub fn register(&self, conn_id: &ConnectionId, filter: SubscriptionFilter) -> HubConnection {
        let (sender, receiver) = mpsc::unbounded_channel();
        let buffered = Arc::new(AtomicUsize::new(0));
        self.connections.insert(
            conn_id.clone(),
            Connection {
                sender,
                filter,
                buffered: Arc::clone(&buffered),
            },
        );
        HubConnection { receiver, buffered }
    }

    pub fn unregister(&self, conn_id: &ConnectionId) {
        self.connections.remove(conn_id);
    }

    /// Replace a connection's filter; takes effect on the next publish.
    pub fn update_filter(&self, conn_id: &ConnectionId, filter: SubscriptionFilter) {
        if let Some(mut connection) = self.connections.get_mut(conn_id) {
            connection.filter = filter;
        }
    }

    /// Fan an emotion sample out to every matching connection. Returns the
    /// number of connections the frame was enqueued for.
    pub fn publish(&self, tenant: &TenantId, sample: &EmotionSample) -> usize {
        let frame = ServerFrame::EmotionalState {
            data: sample.clone(),
        };
        let Ok(serialized) = serde_json::to_string(&frame) else {
            return 0;
        };

        let mut delivered = 0;
        let mut evicted: Vec<ConnectionId> = Vec::new();

        for entry in self.connections.iter() {
            if !entry.filter.matches(tenant, sample) {
                continue;
            }
            let pending = entry.buffered.load(Ordering::Relaxed);
            if pending + serialized.len() > MAX_BUFFERED_BYTES {
                evicted.push(entry.key().clone());
                continue;
            }
            entry.buffered.fetch_add(serialized.len(), Ordering::Relaxed);
            if entry.sender.send(serialized.clone()).is_err() {
                evicted.push(entry.key().clone());
                continue;
            }
            delivered += 1;
        }

        for conn_id in evicted {
            if self.connections.remove(&conn_id).is_some() {
                counters::SLOW_CLIENT_DISCONNECTS.increment();
                tracing::warn!(conn_id = %conn_id, "dashboard client evicted");
            }
        }

        delivered
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use pulseiq_identifiers::SessionId;
    use pulseiq_models::{Emotion, Section, SessionPhysics};

    use super::*;

    fn sample(emotion: Emotion, confidence: u8) -> EmotionSample {
        EmotionSample {
            session_id: SessionId::new("s1"),
            ts: Utc::now(),
            emotion,
            confidence,
            section: Section::Pricing,
            scores: BTreeMap::new(),
            physics: SessionPhysics::default(),
            dollar_impact: 0.0,
        }
    }

    #[tokio::test]
    async fn publish_respects_filters() {
        let hub = DashboardHub::new();
        let rage_conn = ConnectionId::generate();
        let all_conn = ConnectionId::generate();

        let mut rage_rx = hub.register(
            &rage_conn,
            SubscriptionFilter {
                emotions: Some(vec![Emotion::Rage]),
                ..SubscriptionFilter::default()
            },
        );
        let mut all_rx = hub.register(&all_conn, SubscriptionFilter::default());

        let delivered = hub.publish(&TenantId::new("acme"), &sample(Emotion::Browsing, 55));
        assert_eq!(delivered, 1);

        let frame = all_rx.receiver.try_recv().expect("frame for unfiltered");
        assert!(frame.contains("browsing"));
        assert!(rage_rx.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn replacing_a_registration_drops_the_old_channel() {
        let hub = DashboardHub::new();
        let conn = ConnectionId::generate();
        let mut first = hub.register(&conn, SubscriptionFilter::default());
        let _second = hub.register(&conn, SubscriptionFilter::default());

        assert_eq!(hub.connection_count(), 1);
        // The first receiver's sender side is gone.
        assert!(matches!(
            first.receiver.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn over_buffered_connection_is_evicted() {
        let hub = DashboardHub::new();
        let conn = ConnectionId::generate();
        let sub = hub.register(&conn, SubscriptionFilter::default());

        // Simulate a stalled writer: pretend a megabyte is already queued.
        sub.buffered.store(MAX_BUFFERED_BYTES, Ordering::Relaxed);

        let delivered = hub.publish(&TenantId::new("acme"), &sample(Emotion::Rage, 95));
        assert_eq!(delivered, 0);
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn filter_update_takes_effect_for_subsequent_publishes() {
        let hub = DashboardHub::new();
        let conn = ConnectionId::generate();
        let mut sub = hub.register(&conn, SubscriptionFilter::default());

        hub.update_filter(
            &conn,
            SubscriptionFilter {
                min_confidence: Some(90),
                ..SubscriptionFilter::default()
            },
        );

        hub.publish(&TenantId::new("acme"), &sample(Emotion::Browsing, 55));
        assert!(sub.receiver.try_recv().is_err());

        hub.publish(&TenantId::new("acme"), &sample(Emotion::Rage, 95));
        assert!(sub.receiver.try_recv().is_ok());
    }
}
