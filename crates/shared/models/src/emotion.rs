//! The emotion vocabulary and the per-session emotion sample stream.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pulseiq_identifiers::SessionId;
use serde::{Deserialize, Serialize};

use crate::physics::{Section, SessionPhysics};

/// Closed emotion vocabulary. Confidence always travels beside the label;
/// a bare `Emotion` is meaningless to the intervention engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    // Universal / physics-driven.
    Rage,
    AbandonmentRisk,
    Confusion,
    Frustration,
    // Early-session family.
    Exploring,
    Browsing,
    Curiosity,
    // Pricing family.
    PurchaseIntent,
    StrongPurchaseIntent,
    PriceParalysis,
    StickerShock,
    TierComparison,
    PriceConsideration,
    FinancialAnxiety,
    PurchaseDeliberation,
    // Cart / checkout family.
    CartHesitation,
    CartReview,
    CheckoutIntent,
    CheckoutHesitation,
    CommitmentAnxiety,
    AbandonmentIntent,
    // Attention / trust.
    Distracted,
    ComparisonShopping,
    TrustHesitation,
    SeekingValidation,
    ReferenceChecking,
    ExploringElsewhere,
    // Engagement.
    Delight,
    ImmediateBounceRisk,
    SubmissionConfidence,
    SlowReading,
    EngagedReading,
    Hesitation,
    Idle,
}

impl Emotion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rage => "rage",
            Self::AbandonmentRisk => "abandonment_risk",
            Self::Confusion => "confusion",
            Self::Frustration => "frustration",
            Self::Exploring => "exploring",
            Self::Browsing => "browsing",
            Self::Curiosity => "curiosity",
            Self::PurchaseIntent => "purchase_intent",
            Self::StrongPurchaseIntent => "strong_purchase_intent",
            Self::PriceParalysis => "price_paralysis",
            Self::StickerShock => "sticker_shock",
            Self::TierComparison => "tier_comparison",
            Self::PriceConsideration => "price_consideration",
            Self::FinancialAnxiety => "financial_anxiety",
            Self::PurchaseDeliberation => "purchase_deliberation",
            Self::CartHesitation => "cart_hesitation",
            Self::CartReview => "cart_review",
            Self::CheckoutIntent => "checkout_intent",
            Self::CheckoutHesitation => "checkout_hesitation",
            Self::CommitmentAnxiety => "commitment_anxiety",
            Self::AbandonmentIntent => "abandonment_intent",
            Self::Distracted => "distracted",
            Self::ComparisonShopping => "comparison_shopping",
            Self::TrustHesitation => "trust_hesitation",
            Self::SeekingValidation => "seeking_validation",
            Self::ReferenceChecking => "reference_checking",
            Self::ExploringElsewhere => "exploring_elsewhere",
            Self::Delight => "delight",
            Self::ImmediateBounceRisk => "immediate_bounce_risk",
            Self::SubmissionConfidence => "submission_confidence",
            Self::SlowReading => "slow_reading",
            Self::EngagedReading => "engaged_reading",
            Self::Hesitation => "hesitation",
            Self::Idle => "idle",
        }
    }

    /// Price-related emotions are dampened or replaced early in a session,
    /// before the visitor can plausibly have price opinions.
    pub const fn is_price_related(self) -> bool {
        matches!(
            self,
            Self::PurchaseIntent
                | Self::StrongPurchaseIntent
                | Self::StickerShock
                | Self::TierComparison
                | Self::PriceConsideration
                | Self::PriceParalysis
        )
    }

    /// The only family the classifier may emit at session age zero.
    pub const fn is_early_session(self) -> bool {
        matches!(self, Self::Exploring | Self::Browsing | Self::Curiosity)
    }

    pub const fn is_negative(self) -> bool {
        matches!(
            self,
            Self::Rage
                | Self::AbandonmentRisk
                | Self::Confusion
                | Self::Frustration
                | Self::PriceParalysis
                | Self::StickerShock
                | Self::FinancialAnxiety
                | Self::CartHesitation
                | Self::CheckoutHesitation
                | Self::CommitmentAnxiety
                | Self::AbandonmentIntent
                | Self::Distracted
                | Self::TrustHesitation
                | Self::ImmediateBounceRisk
                | Self::Hesitation
        )
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One accepted classifier emission. Appended to the session's bounded
/// emotion ring and published on `emotions.state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionSample {
    pub session_id: SessionId,
    pub ts: DateTime<Utc>,
    pub emotion: Emotion,
    /// 0..=100.
    pub confidence: u8,
    pub section: Section,
    /// Raw per-emotion rule scores that produced this sample.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scores: BTreeMap<Emotion, i32>,
    pub physics: SessionPhysics,
    /// Signed dollar value: `impact_fraction × ltv × confidence/100`.
    pub dollar_impact: f64,
}
