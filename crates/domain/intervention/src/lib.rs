//! Intervention decisions: whether, what, and how urgently to interrupt.

pub mod engine;

pub use engine::{emotion_trigger, DecideInput, InterventionEngine};
