//! The three-tier emotion classifier.
//!
//! Tier 1: universal physics overrides, independent of section.
//! Tier 2: early-session dampener, no price opinions before the visitor
//!         has seen a price.
//! Tier 3: fixed section rule table, first match wins.
//!
//! The classifier is a pure function of (physics, event, context); cooldown
//! suppression is evaluated against the session's accepted emotion history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pulseiq_models::{
    ClassifierConfig, Emotion, EmotionSample, EventType, Section, SessionPhysics, TelemetryEvent,
};

/// Tier-1 physics thresholds.
pub mod overrides {
    pub const RAGE_VELOCITY: f64 = 800.0;
    pub const RAGE_ACCELERATION: f64 = 500.0;
    pub const RAGE_CONFIDENCE: u8 = 95;

    pub const ABANDONMENT_LAST_VELOCITY: f64 = 1_000.0;
    pub const ABANDONMENT_CONFIDENCE: u8 = 90;

    pub const CONFUSION_DIRECTION_CHANGES: u32 = 3;
    pub const CONFUSION_ENTROPY: f64 = 0.7;
    pub const CONFUSION_CONFIDENCE: u8 = 80;
}

/// Tier-2 dampener parameters that are not configuration.
mod dampener {
    use pulseiq_models::Emotion;

    pub const EXPLORING_CONFIDENCE: u8 = 60;
    pub const BROWSING_CONFIDENCE: u8 = 55;
    pub const DAMP_CAP: u8 = 40;
    pub const DAMP_SUBTRACT: u8 = 20;

    /// Emotions damped in the 5–15 s band.
    pub const DAMPED: &[Emotion] = &[
        Emotion::PurchaseIntent,
        Emotion::StickerShock,
        Emotion::TierComparison,
        Emotion::PriceConsideration,
        Emotion::StrongPurchaseIntent,
    ];
}

/// One classifier emission before cooldown filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finding {
    pub emotion: Emotion,
    pub confidence: u8,
}

/// Everything the classifier may look at for one event.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyInput<'a> {
    pub event: &'a TelemetryEvent,
    pub physics: &'a SessionPhysics,
    pub session_age_ms: i64,
}

/// Context handed to section-rule predicates.
struct RuleCtx<'a> {
    event: &'a TelemetryEvent,
    physics: &'a SessionPhysics,
    duration_ms: i64,
}

#[derive(Clone, Copy)]
enum Trigger {
    On(EventType),
    Any,
}

struct SectionRule {
    section: Section,
    trigger: Trigger,
    predicate: fn(&RuleCtx<'_>) -> bool,
    emotion: Emotion,
    confidence: u8,
}

fn always(_ctx: &RuleCtx<'_>) -> bool {
    true
}

fn hover_intent(ctx: &RuleCtx<'_>) -> bool {
    (1_200..=2_500).contains(&ctx.duration_ms)
}

fn hover_deliberation(ctx: &RuleCtx<'_>) -> bool {
    ctx.duration_ms > 2_500 && ctx.duration_ms <= 6_000
}

fn hover_paralysis(ctx: &RuleCtx<'_>) -> bool {
    ctx.duration_ms > 6_000
}

fn recoil(ctx: &RuleCtx<'_>) -> bool {
    ctx.physics.mouse_recoil && ctx.physics.velocity > 600.0
}

fn slow_read(ctx: &RuleCtx<'_>) -> bool {
    ctx.physics.slow_read
}

fn comparing_tiers(ctx: &RuleCtx<'_>) -> bool {
    ctx.physics.oscillating
}

fn hero_bounce(ctx: &RuleCtx<'_>) -> bool {
    ctx.physics.time_in_section_ms < 2_000 && ctx.physics.velocity > 700.0
}

fn demo_delight(ctx: &RuleCtx<'_>) -> bool {
    ctx.physics.interaction_count > 5 && ctx.physics.positive_acceleration
}

fn long_hover(ctx: &RuleCtx<'_>) -> bool {
    ctx.duration_ms > 3_000
}

fn medium_hover(ctx: &RuleCtx<'_>) -> bool {
    ctx.duration_ms > 1_500
}

fn long_field_blur(ctx: &RuleCtx<'_>) -> bool {
    ctx.duration_ms > 4_000
}

/// The section table, fixed at implementation time. Order matters: first
/// match wins within the matching section.
static SECTION_RULES: &[SectionRule] = &[
    // Pricing.
    SectionRule {
        section: Section::Pricing,
        trigger: Trigger::Any,
        predicate: recoil,
        emotion: Emotion::StickerShock,
        confidence: 92,
    },
    SectionRule {
        section: Section::Pricing,
        trigger: Trigger::On(EventType::HoverEnd),
        predicate: hover_paralysis,
        emotion: Emotion::PriceParalysis,
        confidence: 93,
    },
    SectionRule {
        section: Section::Pricing,
        trigger: Trigger::On(EventType::HoverEnd),
        predicate: hover_deliberation,
        emotion: Emotion::PurchaseDeliberation,
        confidence: 80,
    },
    SectionRule {
        section: Section::Pricing,
        trigger: Trigger::On(EventType::HoverEnd),
        predicate: hover_intent,
        emotion: Emotion::PurchaseIntent,
        confidence: 85,
    },
    SectionRule {
        section: Section::Pricing,
        trigger: Trigger::On(EventType::Click),
        predicate: always,
        emotion: Emotion::StrongPurchaseIntent,
        confidence: 88,
    },
    SectionRule {
        section: Section::Pricing,
        trigger: Trigger::On(EventType::TabSwitch),
        predicate: always,
        emotion: Emotion::ComparisonShopping,
        confidence: 78,
    },
    SectionRule {
        section: Section::Pricing,
        trigger: Trigger::On(EventType::TextSelection),
        predicate: always,
        emotion: Emotion::ReferenceChecking,
        confidence: 70,
    },
    SectionRule {
        section: Section::Pricing,
        trigger: Trigger::On(EventType::MouseExit),
        predicate: always,
        emotion: Emotion::ExploringElsewhere,
        confidence: 75,
    },
    SectionRule {
        section: Section::Pricing,
        trigger: Trigger::Any,
        predicate: comparing_tiers,
        emotion: Emotion::TierComparison,
        confidence: 82,
    },
    SectionRule {
        section: Section::Pricing,
        trigger: Trigger::On(EventType::MouseMove),
        predicate: slow_read,
        emotion: Emotion::PriceConsideration,
        confidence: 70,
    },
    // Hero.
    SectionRule {
        section: Section::Hero,
        trigger: Trigger::Any,
        predicate: hero_bounce,
        emotion: Emotion::ImmediateBounceRisk,
        confidence: 85,
    },
    SectionRule {
        section: Section::Hero,
        trigger: Trigger::On(EventType::MouseMove),
        predicate: slow_read,
        emotion: Emotion::EngagedReading,
        confidence: 70,
    },
    SectionRule {
        section: Section::Hero,
        trigger: Trigger::On(EventType::Click),
        predicate: always,
        emotion: Emotion::Curiosity,
        confidence: 70,
    },
    // Demo.
    SectionRule {
        section: Section::Demo,
        trigger: Trigger::Any,
        predicate: demo_delight,
        emotion: Emotion::Delight,
        confidence: 85,
    },
    SectionRule {
        section: Section::Demo,
        trigger: Trigger::On(EventType::HoverEnd),
        predicate: medium_hover,
        emotion: Emotion::EngagedReading,
        confidence: 75,
    },
    SectionRule {
        section: Section::Demo,
        trigger: Trigger::On(EventType::Click),
        predicate: always,
        emotion: Emotion::Curiosity,
        confidence: 72,
    },
    // Testimonials.
    SectionRule {
        section: Section::Testimonials,
        trigger: Trigger::On(EventType::TextSelection),
        predicate: always,
        emotion: Emotion::ReferenceChecking,
        confidence: 82,
    },
    SectionRule {
        section: Section::Testimonials,
        trigger: Trigger::On(EventType::MouseMove),
        predicate: slow_read,
        emotion: Emotion::SeekingValidation,
        confidence: 80,
    },
    SectionRule {
        section: Section::Testimonials,
        trigger: Trigger::On(EventType::TabSwitch),
        predicate: always,
        emotion: Emotion::ExploringElsewhere,
        confidence: 72,
    },
    // Contact.
    SectionRule {
        section: Section::Contact,
        trigger: Trigger::On(EventType::FormSubmit),
        predicate: always,
        emotion: Emotion::SubmissionConfidence,
        confidence: 95,
    },
    SectionRule {
        section: Section::Contact,
        trigger: Trigger::On(EventType::FieldBlur),
        predicate: long_field_blur,
        emotion: Emotion::Hesitation,
        confidence: 75,
    },
    SectionRule {
        section: Section::Contact,
        trigger: Trigger::On(EventType::FieldFocus),
        predicate: always,
        emotion: Emotion::Curiosity,
        confidence: 65,
    },
    // Cart.
    SectionRule {
        section: Section::Cart,
        trigger: Trigger::On(EventType::MouseExit),
        predicate: always,
        emotion: Emotion::AbandonmentIntent,
        confidence: 85,
    },
    SectionRule {
        section: Section::Cart,
        trigger: Trigger::On(EventType::HoverEnd),
        predicate: long_hover,
        emotion: Emotion::CartHesitation,
        confidence: 85,
    },
    SectionRule {
        section: Section::Cart,
        trigger: Trigger::On(EventType::TabSwitch),
        predicate: always,
        emotion: Emotion::ComparisonShopping,
        confidence: 80,
    },
    SectionRule {
        section: Section::Cart,
        trigger: Trigger::On(EventType::MouseMove),
        predicate: slow_read,
        emotion: Emotion::CartReview,
        confidence: 75,
    },
    // Checkout.
    SectionRule {
        section: Section::Checkout,
        trigger: Trigger::Any,
        predicate: recoil,
        emotion: Emotion::FinancialAnxiety,
        confidence: 85,
    },
    SectionRule {
        section: Section::Checkout,
        trigger: Trigger::On(EventType::FormSubmit),
        predicate: always,
        emotion: Emotion::StrongPurchaseIntent,
        confidence: 95,
    },
    SectionRule {
        section: Section::Checkout,
        trigger: Trigger::On(EventType::FieldFocus),
        predicate: always,
        emotion: Emotion::CheckoutIntent,
        confidence: 85,
    },
    SectionRule {
        section: Section::Checkout,
        trigger: Trigger::On(EventType::FieldBlur),
        predicate: long_field_blur,
        emotion: Emotion::CheckoutHesitation,
        confidence: 85,
    },
    SectionRule {
        section: Section::Checkout,
        trigger: Trigger::On(EventType::HoverEnd),
        predicate: long_hover,
        emotion: Emotion::CommitmentAnxiety,
        confidence: 80,
    },
    SectionRule {
        section: Section::Checkout,
        trigger: Trigger::On(EventType::TabSwitch),
        predicate: always,
        emotion: Emotion::Distracted,
        confidence: 75,
    },
    // Everything else.
    SectionRule {
        section: Section::Other,
        trigger: Trigger::On(EventType::TabSwitch),
        predicate: always,
        emotion: Emotion::Distracted,
        confidence: 72,
    },
    SectionRule {
        section: Section::Other,
        trigger: Trigger::On(EventType::MouseExit),
        predicate: always,
        emotion: Emotion::ExploringElsewhere,
        confidence: 70,
    },
    SectionRule {
        section: Section::Other,
        trigger: Trigger::On(EventType::MouseMove),
        predicate: slow_read,
        emotion: Emotion::SlowReading,
        confidence: 65,
    },
    SectionRule {
        section: Section::Other,
        trigger: Trigger::On(EventType::HoverEnd),
        predicate: long_hover,
        emotion: Emotion::Hesitation,
        confidence: 70,
    },
];

#[derive(Debug, Clone)]
pub struct EmotionClassifier {
    config: ClassifierConfig,
}

impl EmotionClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify one event. Pure: equal inputs yield equal outputs.
    pub fn classify(&self, input: &ClassifyInput<'_>) -> Option<Finding> {
        if let Some(finding) = Self::tier_one(input) {
            return Some(finding);
        }

        let raw = Self::tier_three(input)?;
        Some(self.dampen(raw, input))
    }

    fn tier_one(input: &ClassifyInput<'_>) -> Option<Finding> {
        let physics = input.physics;

        if input.event.event_type == EventType::RageClick
            || (physics.velocity > overrides::RAGE_VELOCITY
                && physics.acceleration > overrides::RAGE_ACCELERATION)
        {
            return Some(Finding {
                emotion: Emotion::Rage,
                confidence: overrides::RAGE_CONFIDENCE,
            });
        }

        if physics.mouse_gone && physics.last_velocity > overrides::ABANDONMENT_LAST_VELOCITY {
            return Some(Finding {
                emotion: Emotion::AbandonmentRisk,
                confidence: overrides::ABANDONMENT_CONFIDENCE,
            });
        }

        if physics.direction_changes >= overrides::CONFUSION_DIRECTION_CHANGES
            && physics.entropy > overrides::CONFUSION_ENTROPY
        {
            return Some(Finding {
                emotion: Emotion::Confusion,
                confidence: overrides::CONFUSION_CONFIDENCE,
            });
        }

        None
    }

    fn tier_three(input: &ClassifyInput<'_>) -> Option<Finding> {
        let ctx = RuleCtx {
            event: input.event,
            physics: input.physics,
            duration_ms: input.event.duration_ms.unwrap_or(0),
        };

        SECTION_RULES
            .iter()
            .filter(|rule| rule.section == input.physics.section)
            .find(|rule| {
                let triggered = match rule.trigger {
                    Trigger::On(event_type) => ctx.event.event_type == event_type,
                    Trigger::Any => true,
                };
                triggered && (rule.predicate)(&ctx)
            })
            .map(|rule| Finding {
                emotion: rule.emotion,
                confidence: rule.confidence,
            })
    }

    /// Tier 2: early-session handling of price-family emotions.
    fn dampen(&self, finding: Finding, input: &ClassifyInput<'_>) -> Finding {
        let age = input.session_age_ms;

        if age < self.config.early_exploring_ms && finding.emotion.is_price_related() {
            // Too early for price opinions: interactions read as exploring,
            // passive movement as browsing.
            return if input.event.event_type.category() == "interaction" {
                Finding {
                    emotion: Emotion::Exploring,
                    confidence: dampener::EXPLORING_CONFIDENCE,
                }
            } else {
                Finding {
                    emotion: Emotion::Browsing,
                    confidence: dampener::BROWSING_CONFIDENCE,
                }
            };
        }

        if age < self.config.early_damp_ms && dampener::DAMPED.contains(&finding.emotion) {
            let capped = finding.confidence.min(dampener::DAMP_CAP);
            let damped = capped.saturating_sub(dampener::DAMP_SUBTRACT);
            return Finding {
                emotion: finding.emotion,
                confidence: damped,
            };
        }

        finding
    }

    /// Cooldown gate: a finding inside its emotion's re-emission window is
    /// suppressed.
    pub fn passes_cooldown(
        &self,
        recent: &[EmotionSample],
        emotion: Emotion,
        now: DateTime<Utc>,
    ) -> bool {
        let cooldown_ms = self.config.cooldown_ms(emotion);
        !recent.iter().rev().any(|sample| {
            sample.emotion == emotion
                && (now - sample.ts).num_milliseconds() < cooldown_ms
        })
    }

    /// Full sample assembly for an accepted finding.
    pub fn build_sample(
        &self,
        input: &ClassifyInput<'_>,
        finding: Finding,
        ltv_usd: f64,
    ) -> EmotionSample {
        let mut scores = BTreeMap::new();
        scores.insert(finding.emotion, i32::from(finding.confidence));

        EmotionSample {
            session_id: input.event.session_id.clone(),
            ts: input.event.ts,
            emotion: finding.emotion,
            confidence: finding.confidence,
            section: input.physics.section,
            scores,
            physics: input.physics.clone(),
            dollar_impact: crate::impact::dollar_impact(
                input.physics.section,
                finding.emotion,
                finding.confidence,
                ltv_usd,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pulseiq_identifiers::{SessionId, TenantId};
    use pulseiq_models::Motion;

    use super::*;

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms)
            .single()
            .expect("valid timestamp")
    }

    fn event(event_type: EventType, ms: i64) -> TelemetryEvent {
        TelemetryEvent {
            session_id: SessionId::new("s1"),
            tenant_id: TenantId::new("t1"),
            ts: ts(ms),
            event_type,
            target: None,
            context: None,
            section: None,
            motion: Some(Motion::default()),
            interactions: None,
            duration_ms: None,
        }
    }

    fn pricing_physics() -> SessionPhysics {
        SessionPhysics {
            section: Section::Pricing,
            ..SessionPhysics::default()
        }
    }

    fn classifier() -> EmotionClassifier {
        EmotionClassifier::new(ClassifierConfig::default())
    }

    fn classify(
        classifier: &EmotionClassifier,
        event: &TelemetryEvent,
        physics: &SessionPhysics,
        session_age_ms: i64,
    ) -> Option<Finding> {
        classifier.classify(&ClassifyInput {
            event,
            physics,
            session_age_ms,
        })
    }

    #[test]
    fn rage_override_fires_on_violent_motion() {
        let physics = SessionPhysics {
            velocity: 900.0,
            acceleration: 600.0,
            ..pricing_physics()
        };
        let finding = classify(&classifier(), &event(EventType::MouseMove, 60_000), &physics, 60_000)
            .expect("finding");
        assert_eq!(finding.emotion, Emotion::Rage);
        assert_eq!(finding.confidence, 95);
    }

    #[test]
    fn rage_click_event_is_rage_regardless_of_velocity() {
        let finding = classify(
            &classifier(),
            &event(EventType::RageClick, 60_000),
            &pricing_physics(),
            60_000,
        )
        .expect("finding");
        assert_eq!(finding.emotion, Emotion::Rage);
        assert_eq!(finding.confidence, 95);
    }

    #[test]
    fn abandonment_override_needs_mouse_gone_and_fast_exit() {
        let physics = SessionPhysics {
            mouse_gone: true,
            last_velocity: 1_200.0,
            ..SessionPhysics::default()
        };
        let finding = classify(&classifier(), &event(EventType::MouseExit, 60_000), &physics, 60_000)
            .expect("finding");
        assert_eq!(finding.emotion, Emotion::AbandonmentRisk);
        assert_eq!(finding.confidence, 90);
    }

    #[test]
    fn confusion_override_needs_direction_churn_and_entropy() {
        let physics = SessionPhysics {
            direction_changes: 4,
            entropy: 0.8,
            ..SessionPhysics::default()
        };
        let finding = classify(&classifier(), &event(EventType::MouseMove, 60_000), &physics, 60_000)
            .expect("finding");
        assert_eq!(finding.emotion, Emotion::Confusion);
        assert_eq!(finding.confidence, 80);
    }

    #[test]
    fn pricing_hover_in_intent_band_is_purchase_intent() {
        let mut hover = event(EventType::HoverEnd, 60_000);
        hover.duration_ms = Some(1_500);
        let finding = classify(&classifier(), &hover, &pricing_physics(), 60_000).expect("finding");
        assert_eq!(finding.emotion, Emotion::PurchaseIntent);
        assert_eq!(finding.confidence, 85);
    }

    #[test]
    fn pricing_hover_past_six_seconds_is_paralysis() {
        let mut hover = event(EventType::HoverEnd, 60_000);
        hover.duration_ms = Some(6_500);
        let finding = classify(&classifier(), &hover, &pricing_physics(), 60_000).expect("finding");
        assert_eq!(finding.emotion, Emotion::PriceParalysis);
        assert_eq!(finding.confidence, 93);
    }

    #[test]
    fn pricing_recoil_is_sticker_shock() {
        let physics = SessionPhysics {
            mouse_recoil: true,
            velocity: 700.0,
            ..pricing_physics()
        };
        let finding = classify(&classifier(), &event(EventType::MouseMove, 60_000), &physics, 60_000)
            .expect("finding");
        assert_eq!(finding.emotion, Emotion::StickerShock);
        assert_eq!(finding.confidence, 92);
    }

    #[test]
    fn demo_interactivity_with_approach_is_delight() {
        let physics = SessionPhysics {
            section: Section::Demo,
            interaction_count: 6,
            positive_acceleration: true,
            ..SessionPhysics::default()
        };
        let finding = classify(&classifier(), &event(EventType::Click, 60_000), &physics, 60_000)
            .expect("finding");
        assert_eq!(finding.emotion, Emotion::Delight);
        assert_eq!(finding.confidence, 85);
    }

    #[test]
    fn hero_fast_skim_is_bounce_risk() {
        let physics = SessionPhysics {
            section: Section::Hero,
            time_in_section_ms: 900,
            velocity: 800.0,
            ..SessionPhysics::default()
        };
        let finding = classify(&classifier(), &event(EventType::MouseMove, 60_000), &physics, 60_000)
            .expect("finding");
        assert_eq!(finding.emotion, Emotion::ImmediateBounceRisk);
    }

    #[test]
    fn contact_form_submit_is_submission_confidence() {
        let physics = SessionPhysics {
            section: Section::Contact,
            ..SessionPhysics::default()
        };
        let finding = classify(
            &classifier(),
            &event(EventType::FormSubmit, 60_000),
            &physics,
            60_000,
        )
        .expect("finding");
        assert_eq!(finding.emotion, Emotion::SubmissionConfidence);
        assert_eq!(finding.confidence, 95);
    }

    #[test]
    fn early_session_replaces_price_intent_with_exploring() {
        // The S4 scenario: hover on pricing at t=800 ms would read as
        // purchase_intent 85; the dampener yields exploring 60.
        let mut hover = event(EventType::HoverEnd, 800);
        hover.duration_ms = Some(1_500);
        let finding = classify(&classifier(), &hover, &pricing_physics(), 800).expect("finding");
        assert_eq!(finding.emotion, Emotion::Exploring);
        assert_eq!(finding.confidence, 60);
    }

    #[test]
    fn early_passive_movement_reads_as_browsing() {
        let physics = SessionPhysics {
            slow_read: true,
            ..pricing_physics()
        };
        let finding = classify(&classifier(), &event(EventType::MouseMove, 3_000), &physics, 3_000)
            .expect("finding");
        assert_eq!(finding.emotion, Emotion::Browsing);
        assert_eq!(finding.confidence, 55);
    }

    #[test]
    fn mid_early_band_caps_and_subtracts_confidence() {
        let mut hover = event(EventType::HoverEnd, 10_000);
        hover.duration_ms = Some(1_500);
        let finding = classify(&classifier(), &hover, &pricing_physics(), 10_000).expect("finding");
        assert_eq!(finding.emotion, Emotion::PurchaseIntent);
        // min(85, 40) − 20.
        assert_eq!(finding.confidence, 20);
    }

    #[test]
    fn tier_one_outranks_the_dampener() {
        // Rage at session age 1 s is still rage at 95.
        let physics = SessionPhysics {
            velocity: 900.0,
            acceleration: 600.0,
            ..pricing_physics()
        };
        let finding = classify(&classifier(), &event(EventType::MouseMove, 1_000), &physics, 1_000)
            .expect("finding");
        assert_eq!(finding.emotion, Emotion::Rage);
        assert_eq!(finding.confidence, 95);
    }

    #[test]
    fn quiet_event_yields_no_emotion() {
        let finding = classify(
            &classifier(),
            &event(EventType::MouseMove, 60_000),
            &pricing_physics(),
            60_000,
        );
        assert_eq!(finding, None);
    }

    #[test]
    fn classifier_is_pure() {
        let mut hover = event(EventType::HoverEnd, 60_000);
        hover.duration_ms = Some(1_500);
        let physics = pricing_physics();
        let c = classifier();
        let a = classify(&c, &hover, &physics, 60_000);
        let b = classify(&c, &hover, &physics, 60_000);
        assert_eq!(a, b);
    }

    #[test]
    fn cooldown_suppresses_re_emission_within_window() {
        let c = classifier();
        let input = ClassifyInput {
            event: &event(EventType::RageClick, 60_000),
            physics: &pricing_physics(),
            session_age_ms: 60_000,
        };
        let sample = c.build_sample(
            &input,
            Finding {
                emotion: Emotion::Rage,
                confidence: 95,
            },
            0.0,
        );
        let history = vec![sample];

        // Rage cooldown is 10 s: suppressed at +4 s, clear at +11 s.
        assert!(!c.passes_cooldown(&history, Emotion::Rage, ts(64_000)));
        assert!(c.passes_cooldown(&history, Emotion::Rage, ts(71_000)));
        // A different emotion is unaffected.
        assert!(c.passes_cooldown(&history, Emotion::Confusion, ts(64_000)));
    }

    #[test]
    fn build_sample_attaches_dollar_impact() {
        let c = classifier();
        let input = ClassifyInput {
            event: &event(EventType::MouseMove, 60_000),
            physics: &pricing_physics(),
            session_age_ms: 60_000,
        };
        let sample = c.build_sample(
            &input,
            Finding {
                emotion: Emotion::StickerShock,
                confidence: 92,
            },
            10_000.0,
        );
        // −0.7 × 10000 × 0.92.
        assert_eq!(sample.dollar_impact, -6_440.0);
        assert_eq!(sample.scores[&Emotion::StickerShock], 92);
    }
}
