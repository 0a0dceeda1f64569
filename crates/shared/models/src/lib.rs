//! Shared data model for the PulseIQ pipeline.
//!
//! Domain crates own their logic; the types that cross crate boundaries live
//! here so no component needs a back-reference to another.

pub mod config;
pub mod emotion;
pub mod identity;
pub mod intervention;
pub mod outcome;
pub mod physics;
pub mod pulse;
pub mod streams;
pub mod telemetry;

pub use config::{ClassifierConfig, Config, ConfigError, InterventionConfig};
pub use emotion::{Emotion, EmotionSample};
pub use identity::Identity;
pub use intervention::{
    DeliveryAck, InterventionCommand, InterventionRecord, InterventionType, PatternType, Priority,
};
pub use outcome::{FinalOutcome, SessionLifecycleEvent, SessionOutcome, SessionState};
pub use physics::{Section, SessionPhysics, VELOCITY_HISTORY_LEN};
pub use pulse::PulseSnapshot;
pub use streams::{ClientFrame, ServerFrame, SubscriptionFilter};
pub use telemetry::{
    EventType, Interactions, Motion, TelemetryBatch, TelemetryEvent, Viewport, WireEvent,
};
