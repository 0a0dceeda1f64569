//! Intervention model: patterns, priorities, records, and the command sent
//! back to the originating browser.

use chrono::{DateTime, Utc};
use pulseiq_identifiers::{CorrelationId, SessionId};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Only high and critical findings may dispatch interventions.
    pub const fn is_actionable(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Multi-step behavioral patterns recognized over the recent emotion path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    CartAbandonmentImminent,
    FinancialFearSpiral,
    TrustCrisis,
    PrePurchaseRemorse,
    PricingAnalysisParalysis,
    RepeatedFrustration,
}

impl PatternType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CartAbandonmentImminent => "cart_abandonment_imminent",
            Self::FinancialFearSpiral => "financial_fear_spiral",
            Self::TrustCrisis => "trust_crisis",
            Self::PrePurchaseRemorse => "pre_purchase_remorse",
            Self::PricingAnalysisParalysis => "pricing_analysis_paralysis",
            Self::RepeatedFrustration => "repeated_frustration",
        }
    }

    pub const fn priority(self) -> Priority {
        match self {
            Self::CartAbandonmentImminent | Self::PrePurchaseRemorse => Priority::Critical,
            Self::FinancialFearSpiral
            | Self::TrustCrisis
            | Self::PricingAnalysisParalysis
            | Self::RepeatedFrustration => Priority::High,
        }
    }

    /// Each pattern maps to exactly one canonical UI treatment.
    pub const fn intervention(self) -> InterventionType {
        match self {
            Self::CartAbandonmentImminent => InterventionType::CartSaveModal,
            Self::FinancialFearSpiral => InterventionType::PaymentPlanOffer,
            Self::TrustCrisis => InterventionType::SocialProofToast,
            Self::PrePurchaseRemorse => InterventionType::ReassuranceBanner,
            Self::PricingAnalysisParalysis => InterventionType::TierRecommendation,
            Self::RepeatedFrustration => InterventionType::HelpOffer,
        }
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The UI treatment the client SDK is instructed to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionType {
    CartSaveModal,
    PaymentPlanOffer,
    SocialProofToast,
    ReassuranceBanner,
    TierRecommendation,
    HelpOffer,
    ValueProposition,
}

impl InterventionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CartSaveModal => "cart_save_modal",
            Self::PaymentPlanOffer => "payment_plan_offer",
            Self::SocialProofToast => "social_proof_toast",
            Self::ReassuranceBanner => "reassurance_banner",
            Self::TierRecommendation => "tier_recommendation",
            Self::HelpOffer => "help_offer",
            Self::ValueProposition => "value_proposition",
        }
    }
}

impl std::fmt::Display for InterventionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-session bookkeeping for one issued intervention. At most one record
/// per session is in flight at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionRecord {
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_type: Option<PatternType>,
    pub intervention_type: InterventionType,
    pub priority: Priority,
    pub issued_at: DateTime<Utc>,
    pub cooled_until: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged: Option<bool>,
    pub correlation_id: CorrelationId,
}

/// The command dispatched to the originating browser over its session
/// socket. Delivery is at-most-once and best-effort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionCommand {
    pub session_id: SessionId,
    pub intervention_type: InterventionType,
    /// Free-form hint the client SDK uses to render the treatment.
    pub payload_hint: String,
    pub priority: Priority,
    pub ttl_ms: u64,
    pub correlation_id: CorrelationId,
    pub issued_at: DateTime<Utc>,
}

/// What the fabric tells the engine about a targeted delivery attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAck {
    pub delivered: bool,
    pub correlation_id: CorrelationId,
}
