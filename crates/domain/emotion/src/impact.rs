//! Monetary impact: a fixed lookup from (section, emotion) to a signed
//! fraction of the visitor's lifetime value.

use pulseiq_models::{Emotion, Section};

/// Signed impact fraction in [−1, +1]. Zero means the emotion carries no
/// revenue signal in that section.
pub fn impact_fraction(section: Section, emotion: Emotion) -> f64 {
    // Section-specific readings first; a sticker shock in pricing is worth
    // more signal than one anywhere else.
    match (section, emotion) {
        (Section::Pricing, Emotion::StickerShock) => -0.7,
        (Section::Pricing, Emotion::PriceParalysis) => -0.5,
        (Section::Pricing, Emotion::PurchaseIntent) => 0.5,
        (Section::Pricing, Emotion::StrongPurchaseIntent) => 0.8,
        (Section::Pricing, Emotion::TierComparison) => 0.2,
        (Section::Pricing, Emotion::PriceConsideration) => 0.3,
        (Section::Pricing, Emotion::PurchaseDeliberation) => 0.1,
        (Section::Pricing, Emotion::ComparisonShopping) => -0.3,

        (Section::Cart, Emotion::CartHesitation) => -0.4,
        (Section::Cart, Emotion::AbandonmentIntent) => -0.8,
        (Section::Cart, Emotion::CartReview) => 0.2,
        (Section::Cart, Emotion::ComparisonShopping) => -0.4,

        (Section::Checkout, Emotion::CheckoutIntent) => 0.9,
        (Section::Checkout, Emotion::StrongPurchaseIntent) => 0.9,
        (Section::Checkout, Emotion::CheckoutHesitation) => -0.6,
        (Section::Checkout, Emotion::FinancialAnxiety) => -0.7,
        (Section::Checkout, Emotion::CommitmentAnxiety) => -0.5,
        (Section::Checkout, Emotion::Distracted) => -0.4,

        (Section::Contact, Emotion::SubmissionConfidence) => 0.7,

        // Section-independent readings.
        (_, Emotion::Rage) => -0.6,
        (_, Emotion::AbandonmentRisk) => -0.8,
        (_, Emotion::Confusion) => -0.3,
        (_, Emotion::Frustration) => -0.4,
        (_, Emotion::Delight) => 0.4,
        (_, Emotion::ImmediateBounceRisk) => -0.5,
        (_, Emotion::ExploringElsewhere) => -0.2,

        _ => 0.0,
    }
}

/// Signed dollar value attached to an emotion sample:
/// `impact_fraction × ltv × confidence/100`.
pub fn dollar_impact(section: Section, emotion: Emotion, confidence: u8, ltv_usd: f64) -> f64 {
    impact_fraction(section, emotion) * ltv_usd * (f64::from(confidence) / 100.0)
}
