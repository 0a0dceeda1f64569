//! Aggregated dashboard snapshot: the EVI statistic plus the current
//! emotion-proportion mix.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Snapshot served by `/pulse/snapshot` and streamed on `/pulse/stream`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseSnapshot {
    /// Emotional volatility index, bounded in [0, 100].
    pub evi: u32,
    /// Proportion of each emotion in the rolling window, values in [0, 1].
    pub emotions: BTreeMap<String, f64>,
    /// Number of samples behind this snapshot.
    pub sample: usize,
    /// Seconds since the Unix epoch.
    pub ts: i64,
}
