//! Windowed multi-step pattern recognition over the recent emotion path.

use chrono::{DateTime, Utc};
use pulseiq_models::{Emotion, EmotionSample, EventType, PatternType};

/// Patterns look at the last K emotions of a session.
pub const PATTERN_WINDOW: usize = 10;
/// `pricing_analysis_paralysis` wants no click among the last N events.
const RECENT_EVENT_WINDOW: usize = 5;

/// One fired pattern, ready for the intervention engine.
#[derive(Debug, Clone)]
pub struct PatternHit {
    pub pattern: PatternType,
    /// Largest |dollar impact| among the window samples that contributed.
    pub dollar_weight: f64,
    /// Timestamp of the newest contributing sample.
    pub triggered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PatternDetector;

const FEAR_SPIRAL: &[Emotion] = &[
    Emotion::FinancialAnxiety,
    Emotion::StickerShock,
    Emotion::PurchaseDeliberation,
    Emotion::PriceParalysis,
];

const TRUST_SIGNALS: &[Emotion] = &[
    Emotion::TrustHesitation,
    Emotion::SeekingValidation,
    Emotion::ReferenceChecking,
    Emotion::ExploringElsewhere,
];

const CART_FOLLOWUPS: &[Emotion] = &[
    Emotion::Distracted,
    Emotion::ComparisonShopping,
    Emotion::AbandonmentIntent,
];

const REMORSE_ANXIETY: &[Emotion] = &[
    Emotion::CommitmentAnxiety,
    Emotion::CheckoutHesitation,
    Emotion::FinancialAnxiety,
];

const REMORSE_INTENT: &[Emotion] = &[Emotion::StrongPurchaseIntent, Emotion::CheckoutIntent];

const FRUSTRATION: &[Emotion] = &[Emotion::Rage, Emotion::Frustration];

impl PatternDetector {
    pub const fn new() -> Self {
        Self
    }

    /// Evaluate every pattern against the session's recent emotion history
    /// (newest last) and the types of its most recent events.
    pub fn detect(
        emotion_history: &[EmotionSample],
        recent_event_types: &[EventType],
    ) -> Vec<PatternHit> {
        let start = emotion_history.len().saturating_sub(PATTERN_WINDOW);
        let window = &emotion_history[start..];
        if window.is_empty() {
            return Vec::new();
        }

        let mut hits = Vec::new();

        if let Some(hit) = Self::cart_abandonment(window) {
            hits.push(hit);
        }
        if let Some(hit) = Self::count_pattern(
            window,
            FEAR_SPIRAL,
            2,
            PatternType::FinancialFearSpiral,
        ) {
            hits.push(hit);
        }
        if let Some(hit) =
            Self::count_pattern(window, TRUST_SIGNALS, 3, PatternType::TrustCrisis)
        {
            hits.push(hit);
        }
        if let Some(hit) = Self::pre_purchase_remorse(window) {
            hits.push(hit);
        }
        if let Some(hit) = Self::pricing_paralysis(window, recent_event_types) {
            hits.push(hit);
        }
        if let Some(hit) = Self::count_pattern(
            window,
            FRUSTRATION,
            3,
            PatternType::RepeatedFrustration,
        ) {
            hits.push(hit);
        }

        hits
    }

    fn hit_from(samples: &[&EmotionSample], pattern: PatternType) -> Option<PatternHit> {
        let newest = samples.iter().map(|s| s.ts).max()?;
        let weight = samples
            .iter()
            .map(|s| s.dollar_impact.abs())
            .fold(0.0_f64, f64::max);
        Some(PatternHit {
            pattern,
            dollar_weight: weight,
            triggered_at: newest,
        })
    }

    fn count_pattern(
        window: &[EmotionSample],
        set: &[Emotion],
        minimum: usize,
        pattern: PatternType,
    ) -> Option<PatternHit> {
        let matching: Vec<&EmotionSample> = window
            .iter()
            .filter(|s| set.contains(&s.emotion))
            .collect();
        if matching.len() >= minimum {
            Self::hit_from(&matching, pattern)
        } else {
            None
        }
    }

    /// `cart_hesitation` followed (strictly later) by a distraction signal.
    fn cart_abandonment(window: &[EmotionSample]) -> Option<PatternHit> {
        let hesitation_at = window
            .iter()
            .position(|s| s.emotion == Emotion::CartHesitation)?;
        let followups: Vec<&EmotionSample> = window[hesitation_at + 1..]
            .iter()
            .filter(|s| CART_FOLLOWUPS.contains(&s.emotion))
            .collect();
        if followups.is_empty() {
            return None;
        }
        let mut contributing = vec![&window[hesitation_at]];
        contributing.extend(followups);
        Self::hit_from(&contributing, PatternType::CartAbandonmentImminent)
    }

    fn pre_purchase_remorse(window: &[EmotionSample]) -> Option<PatternHit> {
        let anxious: Vec<&EmotionSample> = window
            .iter()
            .filter(|s| REMORSE_ANXIETY.contains(&s.emotion))
            .collect();
        let intent: Vec<&EmotionSample> = window
            .iter()
            .filter(|s| REMORSE_INTENT.contains(&s.emotion))
            .collect();
        if anxious.is_empty() || intent.is_empty() {
            return None;
        }
        let mut contributing = anxious;
        contributing.extend(intent);
        Self::hit_from(&contributing, PatternType::PrePurchaseRemorse)
    }

    fn pricing_paralysis(
        window: &[EmotionSample],
        recent_event_types: &[EventType],
    ) -> Option<PatternHit> {
        let comparing: Vec<&EmotionSample> = window
            .iter()
            .filter(|s| s.emotion == Emotion::TierComparison)
            .collect();
        if comparing.is_empty() {
            return None;
        }
        let recent_start = recent_event_types.len().saturating_sub(RECENT_EVENT_WINDOW);
        let clicked = recent_event_types[recent_start..]
            .iter()
            .any(|t| *t == EventType::Click);
        if clicked {
            return None;
        }
        Self::hit_from(&comparing, PatternType::PricingAnalysisParalysis)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::TimeZone;
    use pulseiq_identifiers::SessionId;
    use pulseiq_models::{Priority, Section, SessionPhysics};

    use super::*;

    fn sample(index: i64, emotion: Emotion) -> EmotionSample {
        EmotionSample {
            session_id: SessionId::new("s1"),
            ts: Utc
                .timestamp_millis_opt(1_700_000_000_000 + index * 1_000)
                .single()
                .expect("valid timestamp"),
            emotion,
            confidence: 80,
            section: Section::Cart,
            scores: BTreeMap::new(),
            physics: SessionPhysics::default(),
            dollar_impact: -100.0 * index as f64,
        }
    }

    fn path(emotions: &[Emotion]) -> Vec<EmotionSample> {
        emotions
            .iter()
            .enumerate()
            .map(|(i, e)| sample(i as i64, *e))
            .collect()
    }

    fn patterns_of(hits: &[PatternHit]) -> Vec<PatternType> {
        hits.iter().map(|h| h.pattern).collect()
    }

    #[test]
    fn cart_abandonment_needs_hesitation_then_distraction() {
        // The S3 path: cart_hesitation → cart_review → distracted.
        let history = path(&[
            Emotion::CartHesitation,
            Emotion::CartReview,
            Emotion::Distracted,
        ]);
        let hits = PatternDetector::detect(&history, &[]);
        assert!(patterns_of(&hits).contains(&PatternType::CartAbandonmentImminent));
        assert_eq!(
            hits[0].pattern.priority(),
            Priority::Critical
        );
    }

    #[test]
    fn distraction_before_hesitation_does_not_fire() {
        let history = path(&[Emotion::Distracted, Emotion::CartHesitation]);
        let hits = PatternDetector::detect(&history, &[]);
        assert!(!patterns_of(&hits).contains(&PatternType::CartAbandonmentImminent));
    }

    #[test]
    fn financial_fear_spiral_needs_two_signals() {
        let one = path(&[Emotion::StickerShock, Emotion::Browsing]);
        assert!(PatternDetector::detect(&one, &[]).is_empty());

        let two = path(&[Emotion::StickerShock, Emotion::PriceParalysis]);
        let hits = PatternDetector::detect(&two, &[]);
        assert!(patterns_of(&hits).contains(&PatternType::FinancialFearSpiral));
    }

    #[test]
    fn trust_crisis_needs_three_signals() {
        let history = path(&[
            Emotion::TrustHesitation,
            Emotion::SeekingValidation,
            Emotion::ReferenceChecking,
        ]);
        let hits = PatternDetector::detect(&history, &[]);
        assert!(patterns_of(&hits).contains(&PatternType::TrustCrisis));
    }

    #[test]
    fn pre_purchase_remorse_pairs_anxiety_with_intent() {
        let history = path(&[Emotion::CheckoutIntent, Emotion::CommitmentAnxiety]);
        let hits = PatternDetector::detect(&history, &[]);
        assert!(patterns_of(&hits).contains(&PatternType::PrePurchaseRemorse));

        let intent_only = path(&[Emotion::CheckoutIntent, Emotion::CheckoutIntent]);
        assert!(PatternDetector::detect(&intent_only, &[]).is_empty());
    }

    #[test]
    fn pricing_paralysis_requires_click_silence() {
        let history = path(&[Emotion::TierComparison]);

        let no_clicks = [EventType::MouseMove, EventType::HoverEnd];
        let hits = PatternDetector::detect(&history, &no_clicks);
        assert!(patterns_of(&hits).contains(&PatternType::PricingAnalysisParalysis));

        let with_click = [EventType::MouseMove, EventType::Click];
        let hits = PatternDetector::detect(&history, &with_click);
        assert!(!patterns_of(&hits).contains(&PatternType::PricingAnalysisParalysis));
    }

    #[test]
    fn repeated_frustration_needs_three_emissions() {
        let two = path(&[Emotion::Rage, Emotion::Rage]);
        assert!(PatternDetector::detect(&two, &[]).is_empty());

        let three = path(&[Emotion::Rage, Emotion::Frustration, Emotion::Rage]);
        let hits = PatternDetector::detect(&three, &[]);
        assert!(patterns_of(&hits).contains(&PatternType::RepeatedFrustration));
    }

    #[test]
    fn detection_only_sees_the_last_ten_emotions() {
        // Hesitation is pushed outside the window by ten fillers.
        let mut emotions = vec![Emotion::CartHesitation];
        emotions.extend([Emotion::Browsing; 10]);
        emotions.push(Emotion::Distracted);
        let history = path(&emotions);

        let hits = PatternDetector::detect(&history, &[]);
        assert!(!patterns_of(&hits).contains(&PatternType::CartAbandonmentImminent));
    }

    #[test]
    fn hit_carries_weight_and_recency() {
        let history = path(&[Emotion::StickerShock, Emotion::PriceParalysis]);
        let hits = PatternDetector::detect(&history, &[]);
        let hit = &hits[0];
        // |−100| vs |−0| → the larger magnitude wins.
        assert_eq!(hit.dollar_weight, 100.0);
        assert_eq!(hit.triggered_at, history[1].ts);
    }
}
