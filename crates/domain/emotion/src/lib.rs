//! Emotion diagnosis: classifier, pattern detection, monetary impact, and
//! the rolling EVI statistic.
//!
//! Everything in this crate is CPU-only and deterministic: equal inputs
//! produce equal outputs, sample for sample.

pub mod classifier;
pub mod impact;
pub mod patterns;
pub mod pulse;

pub use classifier::{ClassifyInput, EmotionClassifier, Finding};
pub use impact::{dollar_impact, impact_fraction};
pub use patterns::{PatternDetector, PatternHit, PATTERN_WINDOW};
pub use pulse::PulseAggregator;
