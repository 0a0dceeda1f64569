//! Session lifecycle states and the terminal outcome record.

use chrono::{DateTime, Utc};
use pulseiq_identifiers::{SessionId, TenantId};
use serde::{Deserialize, Serialize};

use crate::emotion::Emotion;
use crate::intervention::InterventionType;
use crate::telemetry::EventType;

/// Session lifecycle: `new → active → (muted ⇄ active) → closing → terminated`.
///
/// Transitions are driven exclusively by events from the ingest path or the
/// expiry sweeper; no other component moves a session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    New,
    Active,
    Muted,
    Closing,
    Terminated,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Active => "active",
            Self::Muted => "muted",
            Self::Closing => "closing",
            Self::Terminated => "terminated",
        }
    }

    /// Interventions are gated off everywhere except `active`.
    pub const fn allows_interventions(self) -> bool {
        matches!(self, Self::Active)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Next state after observing an ingest-path event. Identity transition
    /// when the event doesn't move the machine.
    pub const fn on_event(self, event_type: EventType) -> Self {
        match (self, event_type) {
            (Self::Terminated, _) => Self::Terminated,
            (_, EventType::SessionEnd | EventType::FormSubmit) => Self::Closing,
            (Self::New, _) => Self::Active,
            (Self::Active, EventType::Mute) => Self::Muted,
            (Self::Muted, EventType::Unmute) => Self::Active,
            (state, _) => state,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalOutcome {
    Conversion,
    Abandonment,
    IdleTimeout,
}

impl FinalOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conversion => "conversion",
            Self::Abandonment => "abandonment",
            Self::IdleTimeout => "idle_timeout",
        }
    }
}

impl std::fmt::Display for FinalOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal record for one session, dual-written by the outcome recorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub session_id: SessionId,
    pub tenant_id: TenantId,
    /// Ordered emotion labels over the session's life (bounded upstream).
    pub emotion_path: Vec<Emotion>,
    pub final_outcome: FinalOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_emotion: Option<Emotion>,
    pub peak_confidence: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervention_type: Option<InterventionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervention_ack: Option<bool>,
    pub duration_ms: i64,
    pub ended_at: DateTime<Utc>,
}

/// Messages on the `sessions.lifecycle` bus subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionLifecycleEvent {
    Created {
        session_id: SessionId,
        tenant_id: TenantId,
        ts: DateTime<Utc>,
    },
    StateChanged {
        session_id: SessionId,
        from: SessionState,
        to: SessionState,
        ts: DateTime<Utc>,
    },
    /// Terminal: carries the full outcome record so the recorder can
    /// dual-write without re-deriving session state.
    Terminated {
        outcome: Box<SessionOutcome>,
        ts: DateTime<Utc>,
    },
}

impl SessionLifecycleEvent {
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::Created { session_id, .. } | Self::StateChanged { session_id, .. } => session_id,
            Self::Terminated { outcome, .. } => &outcome.session_id,
        }
    }
}
