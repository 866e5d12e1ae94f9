//! Routing request/response models

use serde::{Deserialize, Serialize};

/// One waypoint of a route request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl Waypoint {
    /// Create a waypoint
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// The best route's summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    /// Total distance in meters
    pub distance_m: f64,
    /// Total duration in seconds
    pub duration_s: f64,
    /// Per-segment speeds in m/s, when annotations were requested
    pub segment_speeds_ms: Vec<f64>,
}

impl RouteSummary {
    /// Total distance in kilometers
    #[must_use]
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }

    /// Total duration in minutes
    #[must_use]
    pub fn duration_minutes(&self) -> f64 {
        self.duration_s / 60.0
    }

    /// Per-segment speeds converted to km/h
    #[must_use]
    pub fn segment_speeds_kmh(&self) -> impl Iterator<Item = f64> + '_ {
        self.segment_speeds_ms.iter().map(|ms| ms * 3.6)
    }
}
