//! Position fix value object

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GeoLocation;

/// A single GPS position sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    /// Where the device was
    pub location: GeoLocation,
    /// Estimated horizontal accuracy in meters, when the receiver reports one
    pub accuracy_m: Option<f64>,
    /// When the fix was taken
    pub timestamp: DateTime<Utc>,
}

impl PositionFix {
    /// Create a new fix
    #[must_use]
    pub const fn new(
        location: GeoLocation,
        accuracy_m: Option<f64>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            location,
            accuracy_m,
            timestamp,
        }
    }

    /// Elapsed time since another fix, in seconds (negative if `other` is newer)
    #[must_use]
    pub fn seconds_since(&self, other: &Self) -> f64 {
        (self.timestamp - other.timestamp).num_milliseconds() as f64 / 1000.0
    }

    /// Displacement from another fix in kilometers
    #[must_use]
    pub fn displacement_km(&self, other: &Self) -> f64 {
        self.location.distance_km(&other.location)
    }
}
