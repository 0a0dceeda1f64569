//! Telemetry event model: the wire batch posted by the browser collector and
//! the normalized per-event form the pipeline consumes.

use chrono::{DateTime, Utc};
use pulseiq_identifiers::{SessionId, TenantId};
use serde::{Deserialize, Serialize};

/// Closed set of behavioral event types the pipeline understands.
///
/// Unknown strings are discarded at the ingest boundary with a counter and
/// never reach the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    MouseMove,
    Click,
    RageClick,
    HoverStart,
    HoverEnd,
    Scroll,
    TextSelection,
    TabSwitch,
    MouseExit,
    MouseReturn,
    FieldFocus,
    FieldBlur,
    ViewportBoundary,
    FormSubmit,
    SectionEnter,
    Mute,
    Unmute,
    SessionEnd,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MouseMove => "mouse_move",
            Self::Click => "click",
            Self::RageClick => "rage_click",
            Self::HoverStart => "hover_start",
            Self::HoverEnd => "hover_end",
            Self::Scroll => "scroll",
            Self::TextSelection => "text_selection",
            Self::TabSwitch => "tab_switch",
            Self::MouseExit => "mouse_exit",
            Self::MouseReturn => "mouse_return",
            Self::FieldFocus => "field_focus",
            Self::FieldBlur => "field_blur",
            Self::ViewportBoundary => "viewport_boundary",
            Self::FormSubmit => "form_submit",
            Self::SectionEnter => "section_enter",
            Self::Mute => "mute",
            Self::Unmute => "unmute",
            Self::SessionEnd => "session_end",
        }
    }

    /// Parse a wire `type` string. `None` means the type is outside the
    /// closed set and the event must be dropped at the boundary.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mouse_move" => Some(Self::MouseMove),
            "click" => Some(Self::Click),
            "rage_click" => Some(Self::RageClick),
            "hover_start" => Some(Self::HoverStart),
            "hover_end" => Some(Self::HoverEnd),
            "scroll" => Some(Self::Scroll),
            "text_selection" => Some(Self::TextSelection),
            "tab_switch" => Some(Self::TabSwitch),
            "mouse_exit" => Some(Self::MouseExit),
            "mouse_return" => Some(Self::MouseReturn),
            "field_focus" => Some(Self::FieldFocus),
            "field_blur" => Some(Self::FieldBlur),
            "viewport_boundary" => Some(Self::ViewportBoundary),
            "form_submit" => Some(Self::FormSubmit),
            "section_enter" => Some(Self::SectionEnter),
            "mute" => Some(Self::Mute),
            "unmute" => Some(Self::Unmute),
            "session_end" => Some(Self::SessionEnd),
            _ => None,
        }
    }

    pub const fn category(self) -> &'static str {
        match self {
            Self::MouseMove | Self::Scroll | Self::MouseExit | Self::MouseReturn
            | Self::ViewportBoundary => "motion",
            Self::Click | Self::RageClick | Self::HoverStart | Self::HoverEnd
            | Self::TextSelection => "interaction",
            Self::TabSwitch | Self::FieldFocus | Self::FieldBlur => "focus",
            Self::FormSubmit => "form",
            Self::SectionEnter | Self::Mute | Self::Unmute | Self::SessionEnd => "lifecycle",
        }
    }

    /// Terminal events move the session into `closing`.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::SessionEnd | Self::FormSubmit)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pointer position carried by motion events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub scroll_y: f64,
}

/// Aggregate interaction counters some collectors attach to events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interactions {
    #[serde(default)]
    pub clicks: u32,
    #[serde(default)]
    pub hovers: u32,
    #[serde(default)]
    pub scrolls: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// One raw event inside a telemetry batch, `data` still untyped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// The batch the browser collector posts to `/telemetry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryBatch {
    pub session_id: SessionId,
    pub tenant_id: TenantId,
    pub url: String,
    pub viewport: Viewport,
    pub events: Vec<WireEvent>,
}

/// A normalized event, ready for the per-session pipeline. Ordering is
/// defined only per `session_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub session_id: SessionId,
    pub tenant_id: TenantId,
    pub ts: DateTime<Utc>,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<crate::physics::Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion: Option<Motion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactions: Option<Interactions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
}

impl TelemetryEvent {
    /// Normalize one wire event. Returns `None` when the event type is
    /// unknown or the timestamp is out of range; callers count the drop.
    pub fn from_wire(
        session_id: &SessionId,
        tenant_id: &TenantId,
        wire: &WireEvent,
    ) -> Option<Self> {
        let event_type = EventType::parse(&wire.event_type)?;
        let ts = DateTime::from_timestamp_millis(wire.timestamp)?;
        let data = &wire.data;

        let get_f64 = |key: &str| data.get(key).and_then(serde_json::Value::as_f64);
        let get_i64 = |key: &str| data.get(key).and_then(serde_json::Value::as_i64);
        let get_u32 =
            |key: &str| data.get(key).and_then(serde_json::Value::as_u64).map(|v| v as u32);
        let get_str = |key: &str| {
            data.get(key)
                .and_then(serde_json::Value::as_str)
                .map(String::from)
        };

        let motion = match (get_f64("x"), get_f64("y")) {
            (None, None) => get_f64("scroll_y").map(|scroll_y| Motion {
                x: 0.0,
                y: 0.0,
                scroll_y,
            }),
            (x, y) => Some(Motion {
                x: x.unwrap_or(0.0),
                y: y.unwrap_or(0.0),
                scroll_y: get_f64("scroll_y").unwrap_or(0.0),
            }),
        };

        let interactions = if data.get("clicks").is_some()
            || data.get("hovers").is_some()
            || data.get("scrolls").is_some()
        {
            Some(Interactions {
                clicks: get_u32("clicks").unwrap_or(0),
                hovers: get_u32("hovers").unwrap_or(0),
                scrolls: get_u32("scrolls").unwrap_or(0),
            })
        } else {
            None
        };

        Some(Self {
            session_id: session_id.clone(),
            tenant_id: tenant_id.clone(),
            ts,
            event_type,
            target: get_str("target"),
            context: get_str("context"),
            section: get_str("section")
                .as_deref()
                .map(crate::physics::Section::from_label),
            motion,
            interactions,
            duration_ms: get_i64("duration_ms"),
        })
    }

    /// Key used for duplicate suppression: same type and target within the
    /// ingest dedup window count as a redelivery.
    pub fn dedup_key(&self) -> (EventType, Option<&str>) {
        (self.event_type, self.target.as_deref())
    }
}
