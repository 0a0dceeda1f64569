//! Wire frames for the dashboard and session WebSocket channels.

use pulseiq_identifiers::{CorrelationId, TenantId};
use serde::{Deserialize, Serialize};

use crate::emotion::{Emotion, EmotionSample};
use crate::intervention::InterventionCommand;

/// Frames a dashboard or browser client may send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Dashboard subscription; later frames replace the active filter.
    Subscribe {
        #[serde(default)]
        tenant: Option<TenantId>,
        #[serde(default)]
        emotion_filter: Option<Vec<Emotion>>,
        #[serde(default)]
        min_confidence: Option<u8>,
        #[serde(default)]
        priority_only: Option<bool>,
    },
    Ping,
    /// Browser SDK confirms it showed an intervention.
    Ack { correlation_id: CorrelationId },
}

/// Frames the server pushes to streaming clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    EmotionalState { data: EmotionSample },
    Intervention {
        intervention_type: crate::intervention::InterventionType,
        payload_hint: String,
        priority: crate::intervention::Priority,
        ttl_ms: u64,
        correlation_id: CorrelationId,
    },
    Pong,
}

impl From<&InterventionCommand> for ServerFrame {
    fn from(command: &InterventionCommand) -> Self {
        Self::Intervention {
            intervention_type: command.intervention_type,
            payload_hint: command.payload_hint.clone(),
            priority: command.priority,
            ttl_ms: command.ttl_ms,
            correlation_id: command.correlation_id.clone(),
        }
    }
}

/// Server-side filter state for one dashboard connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub tenant: Option<TenantId>,
    pub emotions: Option<Vec<Emotion>>,
    pub min_confidence: Option<u8>,
    pub priority_only: bool,
}

/// Confidence at or above which a sample counts as "priority" for
/// `priority_only` subscribers.
const PRIORITY_CONFIDENCE: u8 = 85;

impl SubscriptionFilter {
    pub fn from_subscribe(frame: &ClientFrame) -> Option<Self> {
        if let ClientFrame::Subscribe {
            tenant,
            emotion_filter,
            min_confidence,
            priority_only,
        } = frame
        {
            Some(Self {
                tenant: tenant.clone(),
                emotions: emotion_filter.clone(),
                min_confidence: *min_confidence,
                priority_only: priority_only.unwrap_or(false),
            })
        } else {
            None
        }
    }

    pub fn matches(&self, tenant: &TenantId, sample: &EmotionSample) -> bool {
        if let Some(ref wanted) = self.tenant {
            if wanted != tenant {
                return false;
            }
        }
        if let Some(ref emotions) = self.emotions {
            if !emotions.contains(&sample.emotion) {
                return false;
            }
        }
        if let Some(min) = self.min_confidence {
            if sample.confidence < min {
                return false;
            }
        }
        if self.priority_only && sample.confidence < PRIORITY_CONFIDENCE {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use pulseiq_identifiers::SessionId;

    use super::*;
    use crate::physics::{Section, SessionPhysics};

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

    #[test]
    fn subscribe_frame_parses_from_wire_json() {
        let frame: ClientFrame = serde_json::from_str(
            r#"{"type":"subscribe","tenant":"acme","emotion_filter":["rage"],"min_confidence":80}"#,
        )
        .expect("deserialize");
        let filter = SubscriptionFilter::from_subscribe(&frame).expect("subscribe frame");
        assert_eq!(filter.tenant, Some(TenantId::new("acme")));
        assert_eq!(filter.emotions, Some(vec![Emotion::Rage]));
        assert_eq!(filter.min_confidence, Some(80));
        assert!(!filter.priority_only);
    }

    #[test]
    fn filter_rejects_other_tenants_and_low_confidence() {
        let filter = SubscriptionFilter {
            tenant: Some(TenantId::new("acme")),
            emotions: None,
            min_confidence: Some(90),
            priority_only: false,
        };
        assert!(filter.matches(&TenantId::new("acme"), &sample(Emotion::Rage, 95)));
        assert!(!filter.matches(&TenantId::new("globex"), &sample(Emotion::Rage, 95)));
        assert!(!filter.matches(&TenantId::new("acme"), &sample(Emotion::Rage, 80)));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = SubscriptionFilter::default();
        assert!(filter.matches(&TenantId::new("any"), &sample(Emotion::Browsing, 10)));
    }

    #[test]
    fn pong_frame_serializes_with_type_tag() {
        let json = serde_json::to_string(&ServerFrame::Pong).expect("serialize");
        assert_eq!(json, r#"{"type":"pong"}"#);
    }
}
