//! Resolved visitor identity. Anonymous is the common case and the fail-open
//! fallback when the identity view is slow or down.

use pulseiq_identifiers::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Lifetime value in USD; zero when unknown. Drives intervention
    /// priority thresholds.
    #[serde(default)]
    pub ltv_usd: f64,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub const fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_has_zero_ltv() {
        let identity = Identity::anonymous();
        assert!(identity.is_anonymous());
        assert_eq!(identity.ltv_usd, 0.0);
    }

    #[test]
    fn known_identity_deserializes_with_partial_fields() {
        let identity: Identity =
            serde_json::from_str(r#"{"user_id":"u-1","ltv_usd":12500.0}"#).expect("deserialize");
        assert!(!identity.is_anonymous());
        assert_eq!(identity.ltv_usd, 12500.0);
        assert_eq!(identity.email, None);
    }
}
