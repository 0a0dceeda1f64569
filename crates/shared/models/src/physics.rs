//! Per-session kinematic state derived from consecutive pointer positions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Velocity-history ring length used for the entropy calculation.
pub const VELOCITY_HISTORY_LEN: usize = 10;

/// Semantic page region, supplied by the collector or inferred from the URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Hero,
    Demo,
    Pricing,
    Testimonials,
    Contact,
    Cart,
    Checkout,
    #[default]
    Other,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Demo => "demo",
            Self::Pricing => "pricing",
            Self::Testimonials => "testimonials",
            Self::Contact => "contact",
            Self::Cart => "cart",
            Self::Checkout => "checkout",
            Self::Other => "other",
        }
    }

    /// Map a collector-supplied label; anything unrecognized lands in
    /// `Other` rather than being rejected.
    pub fn from_label(label: &str) -> Self {
        match label {
            "hero" => Self::Hero,
            "demo" => Self::Demo,
            "pricing" => Self::Pricing,
            "testimonials" => Self::Testimonials,
            "contact" => Self::Contact,
            "cart" => Self::Cart,
            "checkout" => Self::Checkout,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable kinematic record for one session.
///
/// Owned exclusively by the Session Store; everything else sees clones.
/// All scalars are derived from two consecutive events' positions and the
/// elapsed wall time between them: never random, never interpolated across
/// session gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPhysics {
    // Last observed position.
    pub x: f64,
    pub y: f64,
    pub scroll_y: f64,
    /// False until the first positioned event; derivatives need two real
    /// observations.
    pub has_position: bool,

    // Derivative chain, px/s based.
    pub velocity: f64,
    pub acceleration: f64,
    pub jerk: f64,
    pub last_velocity: f64,

    /// Ring of the last [`VELOCITY_HISTORY_LEN`] velocities.
    pub velocity_history: Vec<f64>,
    /// Normalized variance of `velocity_history`, in [0, 1].
    pub entropy: f64,

    pub direction_changes: u32,
    pub back_forth_count: u32,

    // Sign memory for direction-change detection.
    pub last_dx_sign: i8,
    pub last_dy_sign: i8,

    // Behavioral flags.
    pub mouse_gone: bool,
    pub mouse_recoil: bool,
    pub slow_read: bool,
    pub positive_acceleration: bool,
    pub hovering_pricing: bool,
    pub oscillating: bool,
    pub auto_scroll: bool,

    // Counters.
    pub interaction_count: u32,
    pub hover_count: u32,
    pub hover_duration_ms: i64,
    pub time_in_section_ms: i64,

    pub section: Section,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_event_ts: Option<DateTime<Utc>>,
}

impl Default for SessionPhysics {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scroll_y: 0.0,
            has_position: false,
            velocity: 0.0,
            acceleration: 0.0,
            jerk: 0.0,
            last_velocity: 0.0,
            velocity_history: Vec::with_capacity(VELOCITY_HISTORY_LEN),
            entropy: 0.0,
            direction_changes: 0,
            back_forth_count: 0,
            last_dx_sign: 0,
            last_dy_sign: 0,
            mouse_gone: false,
            mouse_recoil: false,
            slow_read: false,
            positive_acceleration: false,
            hovering_pricing: false,
            oscillating: false,
            auto_scroll: false,
            interaction_count: 0,
            hover_count: 0,
            hover_duration_ms: 0,
            time_in_section_ms: 0,
            section: Section::Other,
            section_start_time: None,
            last_event_ts: None,
        }
    }
}

impl SessionPhysics {
    /// Zero out the derivative chain. Applied on session gaps (> 2 s) and
    /// on invariant violations (negative dt, NaN).
    pub fn reset_kinematics(&mut self) {
        self.velocity = 0.0;
        self.acceleration = 0.0;
        self.jerk = 0.0;
        self.last_velocity = 0.0;
        self.velocity_history.clear();
        self.entropy = 0.0;
    }
}
