//! In-process bus with three typed subjects.
//!
//! Delivery is at-most-once and best-effort: subscribers that fall behind
//! the replay window lose the oldest messages, and publishing to a subject
//! with no live subscribers is counted, not queued.

use pulseiq_models::{EmotionSample, InterventionCommand, SessionLifecycleEvent};
use tokio::sync::broadcast;

use crate::counters;

/// Messages retained per subject for slow subscribers.
pub const REPLAY_WINDOW: usize = 1_024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    EmotionsState,
    InterventionsCommand,
    SessionsLifecycle,
}

impl Subject {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmotionsState => "emotions.state",
            Self::InterventionsCommand => "interventions.command",
            Self::SessionsLifecycle => "sessions.lifecycle",
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("no subscribers on {0}")]
    NoSubscribers(Subject),
}

#[derive(Debug)]
pub struct EventBus {
    emotions: broadcast::Sender<EmotionSample>,
    interventions: broadcast::Sender<InterventionCommand>,
    lifecycle: broadcast::Sender<SessionLifecycleEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (emotions, _) = broadcast::channel(REPLAY_WINDOW);
        let (interventions, _) = broadcast::channel(REPLAY_WINDOW);
        let (lifecycle, _) = broadcast::channel(REPLAY_WINDOW);
        Self {
            emotions,
            interventions,
            lifecycle,
        }
    }

    /// Publish on `emotions.state`. A send with zero receivers is normal at
    /// startup; it is counted and dropped.
    pub fn publish_emotion(&self, sample: EmotionSample) {
        if self.emotions.send(sample).is_err() {
            counters::BUS_PUBLISH_DROPS.increment();
            tracing::trace!(subject = %Subject::EmotionsState, "publish dropped, no subscribers");
        }
    }

    pub fn publish_intervention(&self, command: InterventionCommand) {
        if self.interventions.send(command).is_err() {
            counters::BUS_PUBLISH_DROPS.increment();
            tracing::trace!(
                subject = %Subject::InterventionsCommand,
                "publish dropped, no subscribers"
            );
        }
    }

    pub fn publish_lifecycle(&self, event: SessionLifecycleEvent) {
        if self.lifecycle.send(event).is_err() {
            counters::BUS_PUBLISH_DROPS.increment();
            tracing::trace!(
                subject = %Subject::SessionsLifecycle,
                "publish dropped, no subscribers"
            );
        }
    }

    pub fn subscribe_emotions(&self) -> broadcast::Receiver<EmotionSample> {
        self.emotions.subscribe()
    }

    pub fn subscribe_interventions(&self) -> broadcast::Receiver<InterventionCommand> {
        self.interventions.subscribe()
    }

    pub fn subscribe_lifecycle(&self) -> broadcast::Receiver<SessionLifecycleEvent> {
        self.lifecycle.subscribe()
    }

    pub fn emotion_subscriber_count(&self) -> usize {
        self.emotions.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use pulseiq_identifiers::SessionId;
    use pulseiq_models::{Emotion, Section, SessionPhysics};

    use super::*;

    fn sample(id: &str) -> EmotionSample {
        EmotionSample {
            session_id: SessionId::new(id),
            ts: Utc::now(),
            emotion: Emotion::Browsing,
            confidence: 55,
            section: Section::Hero,
            scores: BTreeMap::new(),
            physics: SessionPhysics::default(),
            dollar_impact: 0.0,
        }
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber_in_order() {
        let bus = EventBus::new();
        let mut rx_a = bus.subscribe_emotions();
        let mut rx_b = bus.subscribe_emotions();

        bus.publish_emotion(sample("s1"));
        bus.publish_emotion(sample("s2"));

        assert_eq!(rx_a.recv().await.expect("recv").session_id.as_str(), "s1");
        assert_eq!(rx_a.recv().await.expect("recv").session_id.as_str(), "s2");
        assert_eq!(rx_b.recv().await.expect("recv").session_id.as_str(), "s1");
    }

    #[tokio::test]
    async fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish_emotion(sample("s1"));
        assert_eq!(bus.emotion_subscriber_count(), 0);
    }

    #[tokio::test]
    async fn lagging_subscriber_loses_oldest_messages_only() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe_emotions();

        for i in 0..(REPLAY_WINDOW + 8) {
            bus.publish_emotion(sample(&format!("s{i}")));
        }

        // The first recv reports the lag, subsequent reads resume from the
        // oldest retained message.
        match rx.recv().await {
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => assert_eq!(n, 8),
            other => panic!("expected lag, got {other:?}"),
        }
        let next = rx.recv().await.expect("recv after lag");
        assert_eq!(next.session_id.as_str(), "s8");
    }
}
