//! The intervention engine.
//!
//! Holds cooldown and budget state per session and nothing else. Decisions
//! are CPU-only; dispatch is the caller's problem and cooldowns arm whether
//! or not delivery succeeds, so a flapping socket cannot cause thrash.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use pulseiq_emotion::PatternHit;
use pulseiq_identifiers::{CorrelationId, SessionId};
use pulseiq_models::{
    Emotion, EmotionSample, InterventionCommand, InterventionConfig, InterventionRecord,
    InterventionType, PatternType, Priority, SessionState,
};

/// Confidence floor for single-emotion (pattern-less) triggers.
const EMOTION_TRIGGER_CONFIDENCE: u8 = 85;

/// Command TTLs by priority.
const CRITICAL_TTL_MS: u64 = 30_000;
const HIGH_TTL_MS: u64 = 15_000;

/// High-confidence emotions that warrant an intervention on their own,
/// without waiting for a multi-step pattern.
pub fn emotion_trigger(emotion: Emotion, confidence: u8) -> Option<(InterventionType, Priority)> {
    if confidence < EMOTION_TRIGGER_CONFIDENCE {
        return None;
    }
    match emotion {
        Emotion::Rage => Some((InterventionType::HelpOffer, Priority::High)),
        Emotion::StickerShock => Some((InterventionType::ValueProposition, Priority::High)),
        Emotion::PriceParalysis => Some((InterventionType::TierRecommendation, Priority::High)),
        Emotion::AbandonmentRisk => Some((InterventionType::ValueProposition, Priority::High)),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct SessionInterventionState {
    last_by_type: HashMap<InterventionType, DateTime<Utc>>,
    dispatches: VecDeque<DateTime<Utc>>,
    in_flight: Option<InterventionRecord>,
}

/// Everything the engine looks at for one decision.
#[derive(Debug)]
pub struct DecideInput<'a> {
    pub session_id: &'a SessionId,
    pub session_state: SessionState,
    pub now: DateTime<Utc>,
    pub ltv_usd: f64,
    pub patterns: &'a [PatternHit],
    pub sample: &'a EmotionSample,
}

#[derive(Debug, Clone)]
struct Candidate {
    pattern: Option<PatternType>,
    intervention: InterventionType,
    priority: Priority,
    weight: f64,
    triggered_at: DateTime<Utc>,
    hint: &'static str,
}

#[derive(Debug)]
pub struct InterventionEngine {
    config: InterventionConfig,
    sessions: DashMap<SessionId, SessionInterventionState>,
}

impl InterventionEngine {
    pub fn new(config: InterventionConfig) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
        }
    }

    /// Decide for one emotion sample. Returns the command to dispatch plus
    /// the record the session store should keep; `None` means every gate
    /// did not clear.
    pub fn decide(&self, input: &DecideInput<'_>) -> Option<(InterventionCommand, InterventionRecord)> {
        if !input.session_state.allows_interventions() {
            return None;
        }

        let candidates = Self::candidates(input);
        if candidates.is_empty() {
            return None;
        }

        let mut state = self.sessions.entry(input.session_id.clone()).or_default();
        state.expire(input.now, self.config.budget_window_secs);

        if state.in_flight.is_some() {
            return None;
        }
        if state.dispatches.len() >= self.config.budget_max {
            tracing::debug!(session_id = %input.session_id, "intervention budget exhausted");
            return None;
        }

        let winner = candidates
            .into_iter()
            .filter(|candidate| self.ltv_gate(candidate, input.ltv_usd))
            .filter(|candidate| self.type_cooldown_clear(&state, candidate, input.now))
            .max_by(|a, b| {
                a.priority
                    .cmp(&b.priority)
                    .then_with(|| a.weight.total_cmp(&b.weight))
                    .then_with(|| a.triggered_at.cmp(&b.triggered_at))
            })?;

        let cooldown = self.cooldown_for(winner.priority);
        let correlation_id = CorrelationId::generate();

        let command = InterventionCommand {
            session_id: input.session_id.clone(),
            intervention_type: winner.intervention,
            payload_hint: winner.hint.to_string(),
            priority: winner.priority,
            ttl_ms: if winner.priority == Priority::Critical {
                CRITICAL_TTL_MS
            } else {
                HIGH_TTL_MS
            },
            correlation_id: correlation_id.clone(),
            issued_at: input.now,
        };

        let record = InterventionRecord {
            session_id: input.session_id.clone(),
            pattern_type: winner.pattern,
            intervention_type: winner.intervention,
            priority: winner.priority,
            issued_at: input.now,
            cooled_until: input.now + cooldown,
            acknowledged: None,
            correlation_id,
        };

        state
            .last_by_type
            .insert(winner.intervention, input.now);
        state.dispatches.push_back(input.now);
        state.in_flight = Some(record.clone());

        Some((command, record))
    }

    fn candidates(input: &DecideInput<'_>) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = input
            .patterns
            .iter()
            .filter(|hit| hit.pattern.priority().is_actionable())
            .map(|hit| Candidate {
                pattern: Some(hit.pattern),
                intervention: hit.pattern.intervention(),
                priority: hit.pattern.priority(),
                weight: hit.dollar_weight,
                triggered_at: hit.triggered_at,
                hint: hit.pattern.as_str(),
            })
            .collect();

        if let Some((intervention, priority)) =
            emotion_trigger(input.sample.emotion, input.sample.confidence)
        {
            candidates.push(Candidate {
                pattern: None,
                intervention,
                priority,
                weight: input.sample.dollar_impact.abs(),
                triggered_at: input.sample.ts,
                hint: input.sample.emotion.as_str(),
            });
        }

        candidates
    }

    /// Critical patterns bypass the LTV gate entirely; high candidates need
    /// a known-valuable visitor.
    fn ltv_gate(&self, candidate: &Candidate, ltv_usd: f64) -> bool {
        match candidate.priority {
            Priority::Critical => true,
            Priority::High => ltv_usd >= self.config.ltv_high_usd,
            Priority::Low | Priority::Medium => false,
        }
    }

    fn type_cooldown_clear(
        &self,
        state: &SessionInterventionState,
        candidate: &Candidate,
        now: DateTime<Utc>,
    ) -> bool {
        state
            .last_by_type
            .get(&candidate.intervention)
            .is_none_or(|last| now - *last >= self.cooldown_for(candidate.priority))
    }

    fn cooldown_for(&self, priority: Priority) -> Duration {
        if priority == Priority::Critical {
            Duration::seconds(self.config.critical_cooldown_secs)
        } else {
            Duration::seconds(self.config.type_cooldown_secs)
        }
    }

    /// Client SDK acknowledged the intervention.
    pub fn ack(&self, session_id: &SessionId, correlation_id: &CorrelationId) -> bool {
        if let Some(mut state) = self.sessions.get_mut(session_id) {
            if let Some(record) = state.in_flight.as_mut() {
                if &record.correlation_id == correlation_id {
                    record.acknowledged = Some(true);
                    return true;
                }
            }
        }
        false
    }

    /// Drop all engine state for a terminated session.
    pub fn clear_session(&self, session_id: &SessionId) {
        self.sessions.remove(session_id);
    }

    /// Number of sessions with live engine state, for health reporting.
    pub fn tracked_sessions(&self) -> usize {
        self.sessions.len()
    }
}

impl SessionInterventionState {
    /// Expire the in-flight record past its cooldown and roll the budget
    /// window forward.
    fn expire(&mut self, now: DateTime<Utc>, budget_window_secs: i64) {
        if self
            .in_flight
            .as_ref()
            .is_some_and(|record| record.cooled_until <= now)
        {
            self.in_flight = None;
        }
        let cutoff = now - Duration::seconds(budget_window_secs);
        while self.dispatches.front().is_some_and(|ts| *ts < cutoff) {
            self.dispatches.pop_front();
        }
    }
}
