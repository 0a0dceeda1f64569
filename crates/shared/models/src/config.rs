//! Process configuration, loaded once from the environment at startup.
//!
//! Thresholds that came out of production tuning (early-session windows,
//! cooldowns, LTV gates) are configuration with defaults, not invariants.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::emotion::Emotion;

/// Exit codes for the `pulseiq` binary.
pub mod exit {
    pub const OK: i32 = 0;
    pub const INVALID_CONFIG: i32 = 64;
    pub const BUS_UNREACHABLE: i32 = 69;
    pub const IDENTITY_UNREACHABLE: i32 = 74;
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidVar { name: &'static str, value: String },

    #[error("{name} must be greater than zero")]
    MustBePositive { name: &'static str },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub listen_addr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_cert_path: Option<PathBuf>,
    /// External bus endpoint; when set it is probed at startup (exit 69 on
    /// failure). Transport itself is the in-process bus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bus_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_store_url: Option<String>,
    /// When true, an unreachable identity store at startup is fatal (74).
    pub identity_required: bool,
    pub outcome_log_dir: PathBuf,
    /// Per-tenant ingest budget, events per second.
    pub tenant_rate_limit: u32,
    pub session_idle_ms: i64,
    pub shards: usize,
    pub max_session_queue: usize,
    pub classifier: ClassifierConfig,
    pub intervention: InterventionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Below this session age, price emotions become exploring/browsing.
    pub early_exploring_ms: i64,
    /// Below this session age, price-emotion confidence is damped.
    pub early_damp_ms: i64,
    pub default_cooldown_ms: i64,
    pub rage_cooldown_ms: i64,
    pub purchase_intent_cooldown_ms: i64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            early_exploring_ms: 5_000,
            early_damp_ms: 15_000,
            default_cooldown_ms: 5_000,
            rage_cooldown_ms: 10_000,
            purchase_intent_cooldown_ms: 10_000,
        }
    }
}

impl ClassifierConfig {
    /// Per-emotion re-emission cooldown.
    pub const fn cooldown_ms(&self, emotion: Emotion) -> i64 {
        match emotion {
            Emotion::Rage => self.rage_cooldown_ms,
            Emotion::PurchaseIntent => self.purchase_intent_cooldown_ms,
            _ => self.default_cooldown_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionConfig {
    pub type_cooldown_secs: i64,
    pub critical_cooldown_secs: i64,
    /// Max interventions per session inside the budget window.
    pub budget_max: usize,
    pub budget_window_secs: i64,
    pub ltv_high_usd: f64,
    pub ltv_critical_usd: f64,
}

impl Default for InterventionConfig {
    fn default() -> Self {
        Self {
            type_cooldown_secs: 60,
            critical_cooldown_secs: 30,
            budget_max: 3,
            budget_window_secs: 600,
            ltv_high_usd: 1_000.0,
            ltv_critical_usd: 10_000.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8787".to_string(),
            tls_cert_path: None,
            bus_url: None,
            identity_store_url: None,
            identity_required: false,
            outcome_log_dir: PathBuf::from("./outcomes"),
            tenant_rate_limit: 200,
            session_idle_ms: 1_800_000,
            shards: 32,
            max_session_queue: 1_000,
            classifier: ClassifierConfig::default(),
            intervention: InterventionConfig::default(),
        }
    }
}

fn parse_env<T: FromStr>(name: &'static str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidVar {
                    name,
                    value: raw.clone(),
                })
        },
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load from the environment. `.env` is honored when present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Some(addr) = parse_env::<String>("LISTEN_ADDR")? {
            config.listen_addr = addr;
        }
        config.tls_cert_path = parse_env::<PathBuf>("TLS_CERT_PATH")?;
        config.bus_url = parse_env::<String>("BUS_URL")?;
        config.identity_store_url = parse_env::<String>("IDENTITY_STORE_URL")?;
        if let Some(required) = parse_env::<bool>("IDENTITY_REQUIRED")? {
            config.identity_required = required;
        }
        if let Some(dir) = parse_env::<PathBuf>("OUTCOME_LOG_BUCKET")? {
            config.outcome_log_dir = dir;
        }
        if let Some(limit) = parse_env::<u32>("TENANT_RATE_LIMIT")? {
            config.tenant_rate_limit = limit;
        }
        if let Some(idle) = parse_env::<i64>("SESSION_IDLE_MS")? {
            config.session_idle_ms = idle;
        }
        if let Some(shards) = parse_env::<usize>("SHARDS")? {
            config.shards = shards;
        }
        if let Some(queue) = parse_env::<usize>("MAX_SESSION_QUEUE")? {
            config.max_session_queue = queue;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.shards == 0 {
            return Err(ConfigError::MustBePositive { name: "SHARDS" });
        }
        if self.max_session_queue == 0 {
            return Err(ConfigError::MustBePositive {
                name: "MAX_SESSION_QUEUE",
            });
        }
        if self.session_idle_ms <= 0 {
            return Err(ConfigError::MustBePositive {
                name: "SESSION_IDLE_MS",
            });
        }
        if self.tenant_rate_limit == 0 {
            return Err(ConfigError::MustBePositive {
                name: "TENANT_RATE_LIMIT",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_contract() {
        let config = Config::default();
        assert_eq!(config.session_idle_ms, 1_800_000);
        assert_eq!(config.shards, 32);
        assert_eq!(config.max_session_queue, 1_000);
        assert_eq!(config.intervention.budget_max, 3);
        assert_eq!(config.intervention.type_cooldown_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_shards_fails_validation() {
        let config = Config {
            shards: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn cooldowns_differ_by_emotion() {
        let classifier = ClassifierConfig::default();
        assert_eq!(classifier.cooldown_ms(Emotion::Rage), 10_000);
        assert_eq!(classifier.cooldown_ms(Emotion::PurchaseIntent), 10_000);
        assert_eq!(classifier.cooldown_ms(Emotion::Confusion), 5_000);
    }
}
