//! Sharded session store: the single owner of mutable session state.
//!
//! `xxh64(session_id) % shards` picks the owning shard. The runtime routes
//! every event for a session through one shard worker, so a shard's map is
//! only ever mutated by its owner; the locks below exist for cross-shard
//! readers (snapshots, sweeps) and are never held across an await point.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use pulseiq_identifiers::{CorrelationId, SessionId, TenantId};
use pulseiq_models::{
    EmotionSample, EventType, FinalOutcome, InterventionRecord, SessionOutcome, SessionPhysics,
    SessionState, TelemetryEvent,
};
use xxhash_rust::xxh64::xxh64;

use crate::error::{Result, SessionError};
use crate::physics::PhysicsEngine;

/// Bounded per-session event history.
pub const EVENT_HISTORY_LEN: usize = 50;
/// Bounded per-session emotion history.
pub const EMOTION_HISTORY_LEN: usize = 50;
/// Duplicate deliveries inside this window collapse to one event.
pub const DEDUP_WINDOW_MS: i64 = 50;
/// Trailing-event grace once a session enters `closing`.
const CLOSING_GRACE_MS: i64 = 3_000;

#[derive(Debug)]
struct SessionRecord {
    tenant_id: TenantId,
    state: SessionState,
    physics: SessionPhysics,
    events: VecDeque<TelemetryEvent>,
    emotions: VecDeque<EmotionSample>,
    interventions: Vec<InterventionRecord>,
    created_at: DateTime<Utc>,
    last_event_ts: DateTime<Utc>,
    closing_deadline: Option<DateTime<Utc>>,
    terminal_event: Option<EventType>,
}

impl SessionRecord {
    fn new(event: &TelemetryEvent) -> Self {
        Self {
            tenant_id: event.tenant_id.clone(),
            state: SessionState::New,
            physics: SessionPhysics::default(),
            events: VecDeque::with_capacity(EVENT_HISTORY_LEN),
            emotions: VecDeque::with_capacity(EMOTION_HISTORY_LEN),
            interventions: Vec::new(),
            created_at: event.ts,
            last_event_ts: event.ts,
            closing_deadline: None,
            terminal_event: None,
        }
    }

    fn outcome(&self, session_id: &SessionId, final_outcome: FinalOutcome) -> SessionOutcome {
        let peak = self
            .emotions
            .iter()
            .max_by_key(|sample| sample.confidence);
        let last_intervention = self.interventions.last();
        SessionOutcome {
            session_id: session_id.clone(),
            tenant_id: self.tenant_id.clone(),
            emotion_path: self.emotions.iter().map(|s| s.emotion).collect(),
            final_outcome,
            peak_emotion: peak.map(|s| s.emotion),
            peak_confidence: peak.map_or(0, |s| s.confidence),
            intervention_type: last_intervention.map(|r| r.intervention_type),
            intervention_ack: last_intervention.and_then(|r| r.acknowledged),
            duration_ms: (self.last_event_ts - self.created_at)
                .num_milliseconds()
                .max(0),
            ended_at: Utc::now(),
        }
    }
}

/// Read-only view handed to the classifier and the intervention engine.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub tenant_id: TenantId,
    pub state: SessionState,
    pub physics: SessionPhysics,
    pub session_age_ms: i64,
    pub recent_emotions: Vec<EmotionSample>,
    /// Types of the most recent events, newest last.
    pub recent_event_types: Vec<EventType>,
}

/// What happened when an event was folded into the store.
#[derive(Debug, Clone)]
pub struct AppendOutcome {
    pub created: bool,
    pub duplicate: bool,
    pub state_change: Option<(SessionState, SessionState)>,
    pub snapshot: SessionSnapshot,
}

/// A session removed by the sweeper or the closing grace, with its terminal
/// outcome ready for the recorder.
#[derive(Debug, Clone)]
pub struct TerminatedSession {
    pub session_id: SessionId,
    pub tenant_id: TenantId,
    pub outcome: SessionOutcome,
}

#[derive(Debug)]
pub struct SessionStore {
    shards: Vec<RwLock<HashMap<SessionId, SessionRecord>>>,
    idle_after: Duration,
}

impl SessionStore {
    pub fn new(shard_count: usize, idle_after_ms: i64) -> Self {
        let shards = (0..shard_count.max(1))
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Self {
            shards,
            idle_after: Duration::milliseconds(idle_after_ms.max(1)),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Stable shard assignment for a session.
    pub fn shard_index(&self, session_id: &SessionId) -> usize {
        (xxh64(session_id.as_str().as_bytes(), 0) % self.shards.len() as u64) as usize
    }

    fn shard(&self, session_id: &SessionId) -> &RwLock<HashMap<SessionId, SessionRecord>> {
        &self.shards[self.shard_index(session_id)]
    }

    /// Fold one normalized event into the session, creating it on first
    /// contact. Returns the resulting snapshot plus lifecycle facts the
    /// caller publishes.
    pub fn append_event(&self, event: &TelemetryEvent) -> AppendOutcome {
        let mut shard = self
            .shard(&event.session_id)
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let (created, record) = match shard.entry(event.session_id.clone()) {
            std::collections::hash_map::Entry::Occupied(entry) => (false, entry.into_mut()),
            std::collections::hash_map::Entry::Vacant(entry) => {
                (true, entry.insert(SessionRecord::new(event)))
            },
        };

        // Duplicate delivery: same type/target within the dedup window.
        if !created {
            if let Some(last) = record.events.back() {
                let delta = (event.ts - last.ts).num_milliseconds().abs();
                if last.dedup_key() == event.dedup_key() && delta <= DEDUP_WINDOW_MS {
                    let snapshot = Self::snapshot_record(&event.session_id, record);
                    return AppendOutcome {
                        created: false,
                        duplicate: true,
                        state_change: None,
                        snapshot,
                    };
                }
            }
        }

        let prev_state = record.state;
        let next_state = prev_state.on_event(event.event_type);
        record.state = next_state;
        if next_state == SessionState::Closing && record.closing_deadline.is_none() {
            record.closing_deadline = Some(event.ts + Duration::milliseconds(CLOSING_GRACE_MS));
            record.terminal_event = Some(event.event_type);
        }

        record.physics = PhysicsEngine::update(&record.physics, event);
        record.last_event_ts = event.ts;

        if record.events.len() == EVENT_HISTORY_LEN {
            record.events.pop_front();
        }
        record.events.push_back(event.clone());

        let state_change = (prev_state != next_state).then_some((prev_state, next_state));
        let snapshot = Self::snapshot_record(&event.session_id, record);

        AppendOutcome {
            created,
            duplicate: false,
            state_change,
            snapshot,
        }
    }

    fn snapshot_record(session_id: &SessionId, record: &SessionRecord) -> SessionSnapshot {
        SessionSnapshot {
            session_id: session_id.clone(),
            tenant_id: record.tenant_id.clone(),
            state: record.state,
            physics: record.physics.clone(),
            session_age_ms: (record.last_event_ts - record.created_at)
                .num_milliseconds()
                .max(0),
            recent_emotions: record.emotions.iter().cloned().collect(),
            recent_event_types: record
                .events
                .iter()
                .rev()
                .take(5)
                .map(|e| e.event_type)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect(),
        }
    }

    pub fn snapshot(&self, session_id: &SessionId) -> Option<SessionSnapshot> {
        let shard = self
            .shard(session_id)
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        shard
            .get(session_id)
            .map(|record| Self::snapshot_record(session_id, record))
    }

    /// Append an accepted emotion sample to the session's bounded ring.
    pub fn record_emotion(&self, session_id: &SessionId, sample: EmotionSample) -> Result<()> {
        let mut shard = self
            .shard(session_id)
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let record = shard
            .get_mut(session_id)
            .ok_or_else(|| SessionError::UnknownSession(session_id.clone()))?;
        if record.emotions.len() == EMOTION_HISTORY_LEN {
            record.emotions.pop_front();
        }
        record.emotions.push_back(sample);
        Ok(())
    }

    pub fn record_intervention(
        &self,
        session_id: &SessionId,
        intervention: InterventionRecord,
    ) -> Result<()> {
        let mut shard = self
            .shard(session_id)
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let record = shard
            .get_mut(session_id)
            .ok_or_else(|| SessionError::UnknownSession(session_id.clone()))?;
        record.interventions.push(intervention);
        Ok(())
    }

    /// Mark the latest matching intervention acknowledged by the client SDK.
    pub fn ack_intervention(
        &self,
        session_id: &SessionId,
        correlation_id: &CorrelationId,
    ) -> Result<bool> {
        let mut shard = self
            .shard(session_id)
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let record = shard
            .get_mut(session_id)
            .ok_or_else(|| SessionError::UnknownSession(session_id.clone()))?;
        for intervention in record.interventions.iter_mut().rev() {
            if &intervention.correlation_id == correlation_id {
                intervention.acknowledged = Some(true);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Evict sessions idle past the configured horizon, emitting
    /// `idle_timeout` outcomes.
    pub fn expire_idle(&self, now: DateTime<Utc>) -> Vec<TerminatedSession> {
        let cutoff = now - self.idle_after;
        let mut expired = Vec::new();
        for shard in &self.shards {
            let mut map = shard
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let idle: Vec<SessionId> = map
                .iter()
                .filter(|(_, record)| record.last_event_ts < cutoff)
                .map(|(id, _)| id.clone())
                .collect();
            for session_id in idle {
                if let Some(record) = map.remove(&session_id) {
                    expired.push(TerminatedSession {
                        tenant_id: record.tenant_id.clone(),
                        outcome: record.outcome(&session_id, FinalOutcome::IdleTimeout),
                        session_id,
                    });
                }
            }
        }
        expired
    }

    /// Terminate sessions whose closing grace window has elapsed.
    pub fn finalize_closing(&self, now: DateTime<Utc>) -> Vec<TerminatedSession> {
        let mut terminated = Vec::new();
        for shard in &self.shards {
            let mut map = shard
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let due: Vec<SessionId> = map
                .iter()
                .filter(|(_, record)| {
                    record.state == SessionState::Closing
                        && record.closing_deadline.is_some_and(|deadline| deadline <= now)
                })
                .map(|(id, _)| id.clone())
                .collect();
            for session_id in due {
                if let Some(record) = map.remove(&session_id) {
                    let final_outcome = match record.terminal_event {
                        Some(EventType::FormSubmit) => FinalOutcome::Conversion,
                        _ => FinalOutcome::Abandonment,
                    };
                    terminated.push(TerminatedSession {
                        tenant_id: record.tenant_id.clone(),
                        outcome: record.outcome(&session_id, final_outcome),
                        session_id,
                    });
                }
            }
        }
        terminated
    }

    pub fn active_sessions(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .read()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .len()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::BTreeMap;

    use chrono::TimeZone;
    use pulseiq_models::{Emotion, InterventionType, Motion, Priority, Section};

    use super::*;

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    fn event(session: &str, ms: i64, event_type: EventType) -> TelemetryEvent {
        TelemetryEvent {
            session_id: SessionId::new(session),
            tenant_id: TenantId::new("t1"),
            ts: ts(ms),
            event_type,
            target: None,
            context: None,
            section: None,
            motion: Some(Motion {
                x: (ms % 700) as f64,
                y: (ms % 500) as f64,
                scroll_y: 0.0,
            }),
            interactions: None,
            duration_ms: None,
        }
    }

    fn sample(session: &str, ms: i64, emotion: Emotion, confidence: u8) -> EmotionSample {
        EmotionSample {
            session_id: SessionId::new(session),
            ts: ts(ms),
            emotion,
            confidence,
            section: Section::Pricing,
            scores: BTreeMap::new(),
            physics: SessionPhysics::default(),
            dollar_impact: 0.0,
        }
    }

    #[test]
    fn first_event_creates_and_activates_the_session() {
        let store = SessionStore::new(4, 1_800_000);
        let outcome = store.append_event(&event("s1", 0, EventType::MouseMove));
        assert!(outcome.created);
        assert_eq!(
            outcome.state_change,
            Some((SessionState::New, SessionState::Active))
        );
        assert_eq!(outcome.snapshot.state, SessionState::Active);
        assert_eq!(store.active_sessions(), 1);
    }

    #[test]
    fn shard_assignment_is_stable() {
        let store = SessionStore::new(32, 1_800_000);
        let id = SessionId::new("stable-session");
        assert_eq!(store.shard_index(&id), store.shard_index(&id));
        assert!(store.shard_index(&id) < 32);
    }

    #[test]
    fn event_history_is_bounded_at_fifty() {
        let store = SessionStore::new(2, 1_800_000);
        for i in 0..120 {
            store.append_event(&event("s1", i * 100, EventType::MouseMove));
        }
        let snapshot = store.snapshot(&SessionId::new("s1")).expect("session");
        assert_eq!(snapshot.recent_event_types.len(), 5);
        // The ring itself is bounded; verify through the public surface by
        // confirming the session is still healthy after 120 events.
        assert_eq!(store.active_sessions(), 1);
    }

    #[test]
    fn emotion_history_is_bounded_at_fifty() {
        let store = SessionStore::new(2, 1_800_000);
        store.append_event(&event("s1", 0, EventType::MouseMove));
        for i in 0..75 {
            store
                .record_emotion(
                    &SessionId::new("s1"),
                    sample("s1", i * 100, Emotion::Browsing, 55),
                )
                .expect("record");
        }
        let snapshot = store.snapshot(&SessionId::new("s1")).expect("session");
        assert_eq!(snapshot.recent_emotions.len(), EMOTION_HISTORY_LEN);
    }

    #[test]
    fn duplicate_within_window_is_collapsed() {
        let store = SessionStore::new(2, 1_800_000);
        let mut click = event("s1", 1_000, EventType::Click);
        click.target = Some("#buy".to_string());
        click.motion = None;
        store.append_event(&click);

        let mut replay = click.clone();
        replay.ts = ts(1_030);
        let outcome = store.append_event(&replay);
        assert!(outcome.duplicate);

        let mut later = click;
        later.ts = ts(1_200);
        let outcome = store.append_event(&later);
        assert!(!outcome.duplicate);
    }

    #[test]
    fn idle_sessions_are_evicted_with_idle_timeout_outcome() {
        let store = SessionStore::new(2, 60_000);
        store.append_event(&event("old", 0, EventType::MouseMove));
        store.append_event(&event("fresh", 120_000, EventType::MouseMove));

        let expired = store.expire_idle(ts(130_000));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].session_id.as_str(), "old");
        assert_eq!(expired[0].outcome.final_outcome, FinalOutcome::IdleTimeout);
        assert_eq!(store.active_sessions(), 1);
    }

    #[test]
    fn closing_sessions_terminate_after_grace() {
        let store = SessionStore::new(2, 1_800_000);
        store.append_event(&event("s1", 0, EventType::MouseMove));
        store.append_event(&event("s1", 500, EventType::SessionEnd));

        // Inside the grace window nothing happens.
        assert!(store.finalize_closing(ts(2_000)).is_empty());

        let terminated = store.finalize_closing(ts(4_000));
        assert_eq!(terminated.len(), 1);
        assert_eq!(
            terminated[0].outcome.final_outcome,
            FinalOutcome::Abandonment
        );
    }

    #[test]
    fn form_submit_close_records_a_conversion() {
        let store = SessionStore::new(2, 1_800_000);
        store.append_event(&event("s1", 0, EventType::MouseMove));
        store.append_event(&event("s1", 500, EventType::FormSubmit));

        let terminated = store.finalize_closing(ts(10_000));
        assert_eq!(terminated.len(), 1);
        assert_eq!(
            terminated[0].outcome.final_outcome,
            FinalOutcome::Conversion
        );
    }

    #[test]
    fn outcome_carries_peak_emotion_and_intervention_ack() {
        let store = SessionStore::new(2, 60_000);
        let id = SessionId::new("s1");
        store.append_event(&event("s1", 0, EventType::MouseMove));
        store
            .record_emotion(&id, sample("s1", 100, Emotion::Browsing, 55))
            .expect("record");
        store
            .record_emotion(&id, sample("s1", 200, Emotion::StickerShock, 92))
            .expect("record");

        let correlation_id = CorrelationId::generate();
        store
            .record_intervention(
                &id,
                InterventionRecord {
                    session_id: id.clone(),
                    pattern_type: None,
                    intervention_type: InterventionType::ValueProposition,
                    priority: Priority::High,
                    issued_at: ts(300),
                    cooled_until: ts(60_300),
                    acknowledged: None,
                    correlation_id: correlation_id.clone(),
                },
            )
            .expect("record");
        assert!(store.ack_intervention(&id, &correlation_id).expect("ack"));

        let expired = store.expire_idle(ts(120_000));
        let outcome = &expired[0].outcome;
        assert_eq!(outcome.peak_emotion, Some(Emotion::StickerShock));
        assert_eq!(outcome.peak_confidence, 92);
        assert_eq!(
            outcome.intervention_type,
            Some(InterventionType::ValueProposition)
        );
        assert_eq!(outcome.intervention_ack, Some(true));
        assert_eq!(outcome.emotion_path.len(), 2);
    }

    #[test]
    fn emotion_for_unknown_session_is_an_error() {
        let store = SessionStore::new(2, 60_000);
        let result = store.record_emotion(
            &SessionId::new("ghost"),
            sample("ghost", 0, Emotion::Rage, 95),
        );
        assert!(matches!(result, Err(SessionError::UnknownSession(_))));
    }
}
