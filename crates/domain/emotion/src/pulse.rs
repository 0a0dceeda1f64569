//! Rolling emotional-volatility statistic for dashboards.
//!
//! EVI is the variance of emotion proportions over a rolling window, scaled
//! into [0, 100]. A stream stuck on one emotion scores 0; a stream split
//! across many emotions scores higher as the split grows more uneven over
//! time.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use pulseiq_models::{Emotion, PulseSnapshot};

/// Scale factor mapping proportion variance into roughly [0, 100] for the
/// vocabulary size in play.
const EVI_SCALE: f64 = 400.0;
/// Rolling window over which proportions are computed.
const WINDOW_SECS: i64 = 60;

#[derive(Debug)]
pub struct PulseAggregator {
    window: Duration,
    samples: VecDeque<(DateTime<Utc>, Emotion)>,
}

impl Default for PulseAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseAggregator {
    pub fn new() -> Self {
        Self {
            window: Duration::seconds(WINDOW_SECS),
            samples: VecDeque::new(),
        }
    }

    pub fn record(&mut self, ts: DateTime<Utc>, emotion: Emotion) {
        self.samples.push_back((ts, emotion));
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        while self
            .samples
            .front()
            .is_some_and(|(ts, _)| *ts < cutoff)
        {
            self.samples.pop_front();
        }
    }

    /// Current snapshot; prunes expired samples as a side effect.
    pub fn snapshot(&mut self, now: DateTime<Utc>) -> PulseSnapshot {
        self.prune(now);

        let total = self.samples.len();
        if total == 0 {
            return PulseSnapshot {
                evi: 0,
                emotions: BTreeMap::new(),
                sample: 0,
                ts: now.timestamp(),
            };
        }

        let mut counts: BTreeMap<Emotion, usize> = BTreeMap::new();
        for (_, emotion) in &self.samples {
            *counts.entry(*emotion).or_insert(0) += 1;
        }

        let proportions: Vec<f64> = counts
            .values()
            .map(|count| *count as f64 / total as f64)
            .collect();
        let mean = proportions.iter().sum::<f64>() / proportions.len() as f64;
        let variance = proportions
            .iter()
            .map(|p| (p - mean).powi(2))
            .sum::<f64>();

        let evi = (EVI_SCALE * variance).round().min(100.0).max(0.0) as u32;

        PulseSnapshot {
            evi,
            emotions: counts
                .into_iter()
                .map(|(emotion, count)| {
                    (emotion.as_str().to_string(), count as f64 / total as f64)
                })
                .collect(),
            sample: total,
            ts: now.timestamp(),
        }
    }
}
