//! Speed samples and the bounded speed history
//!
//! Samples are only recorded when the inter-fix displacement clears a
//! minimum-movement threshold, so GPS jitter at rest does not pollute the
//! average. The history keeps the most recent N samples, evicting the
//! oldest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One measured speed observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedSample {
    /// Measured speed in km/h
    pub speed_kmh: f64,
    /// When the observation was made
    pub recorded_at: DateTime<Utc>,
}

impl SpeedSample {
    /// Create a new sample
    #[must_use]
    pub const fn new(speed_kmh: f64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            speed_kmh,
            recorded_at,
        }
    }
}

const fn default_limit() -> usize {
    10
}

/// Bounded, ordered history of speed samples (oldest first)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedHistory {
    samples: VecDeque<SpeedSample>,
    #[serde(default = "default_limit")]
    limit: usize,
}

impl Default for SpeedHistory {
    fn default() -> Self {
        Self::with_limit(default_limit())
    }
}

impl SpeedHistory {
    /// Create an empty history bounded to `limit` samples
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(limit),
            limit: limit.max(1),
        }
    }

    /// Append a sample, evicting the oldest when over the bound
    pub fn push(&mut self, sample: SpeedSample) {
        if self.samples.len() >= self.limit {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Number of retained samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the history is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterate samples oldest-first
    pub fn iter(&self) -> impl Iterator<Item = &SpeedSample> {
        self.samples.iter()
    }

    /// Drop all samples
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Recency-weighted average speed in km/h
    ///
    /// Weights increase linearly with recency; samples older than
    /// `max_age_minutes` relative to `now` are excluded. Returns `None`
    /// when no sample qualifies.
    #[must_use]
    pub fn recency_weighted_average_kmh(
        &self,
        now: DateTime<Utc>,
        max_age_minutes: f64,
    ) -> Option<f64> {
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        let mut weight = 0.0;
        for sample in &self.samples {
            let age_minutes = (now - sample.recorded_at).num_milliseconds() as f64 / 60_000.0;
            if age_minutes > max_age_minutes {
                continue;
            }
            weight += 1.0;
            weighted_sum += sample.speed_kmh * weight;
            weight_total += weight;
        }
        if weight_total == 0.0 {
            None
        } else {
            Some(weighted_sum / weight_total)
        }
    }
}
