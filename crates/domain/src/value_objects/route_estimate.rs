//! Route estimate value object
//!
//! A per-leg routing result: total distance, expected duration, and an
//! optional classification of the route into road-type speed bands used by
//! the ETA estimator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GeoLocation;

/// Road classification derived from per-segment speed annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadType {
    /// Motorway-grade segments (> 100 km/h)
    Highway,
    /// Primary roads (> 80 km/h)
    Primary,
    /// Secondary roads (> 50 km/h)
    Secondary,
    /// Residential and urban streets
    Residential,
}

impl RoadType {
    /// Classify a segment by its annotated speed
    #[must_use]
    pub fn from_speed_kmh(speed_kmh: f64) -> Self {
        if speed_kmh > 100.0 {
            Self::Highway
        } else if speed_kmh > 80.0 {
            Self::Primary
        } else if speed_kmh > 50.0 {
            Self::Secondary
        } else {
            Self::Residential
        }
    }

    /// Expected free-flow speed for this road type, in km/h
    #[must_use]
    pub const fn expected_speed_kmh(&self) -> f64 {
        match self {
            Self::Highway => 120.0,
            Self::Primary => 90.0,
            Self::Secondary => 75.0,
            Self::Residential => 40.0,
        }
    }

    /// Get a human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Highway => "highway",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Residential => "residential",
        }
    }
}

impl std::fmt::Display for RoadType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per-road-type segment counts for one route
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadTypeHistogram {
    pub highway: u32,
    pub primary: u32,
    pub secondary: u32,
    pub residential: u32,
}

impl RoadTypeHistogram {
    /// Build a histogram from per-segment speeds in km/h
    #[must_use]
    pub fn from_segment_speeds_kmh(speeds: impl IntoIterator<Item = f64>) -> Self {
        let mut histogram = Self::default();
        for speed in speeds {
            histogram.add(RoadType::from_speed_kmh(speed));
        }
        histogram
    }

    /// Record one segment of the given type
    pub fn add(&mut self, road_type: RoadType) {
        match road_type {
            RoadType::Highway => self.highway += 1,
            RoadType::Primary => self.primary += 1,
            RoadType::Secondary => self.secondary += 1,
            RoadType::Residential => self.residential += 1,
        }
    }

    /// Number of segments of the given type
    #[must_use]
    pub const fn count(&self, road_type: RoadType) -> u32 {
        match road_type {
            RoadType::Highway => self.highway,
            RoadType::Primary => self.primary,
            RoadType::Secondary => self.secondary,
            RoadType::Residential => self.residential,
        }
    }

    /// Total number of classified segments
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.highway + self.primary + self.secondary + self.residential
    }

    /// Expected speed weighted by segment counts, `None` when empty
    #[must_use]
    pub fn weighted_expected_speed_kmh(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let weighted = [
            RoadType::Highway,
            RoadType::Primary,
            RoadType::Secondary,
            RoadType::Residential,
        ]
        .iter()
        .map(|t| f64::from(self.count(*t)) * t.expected_speed_kmh())
        .sum::<f64>();
        Some(weighted / f64::from(total))
    }
}

/// A routing result for a single leg
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    /// Total route distance in kilometers
    pub distance_km: f64,
    /// Expected travel time in minutes; `None` for straight-line fallbacks
    pub duration_minutes: Option<f64>,
    /// Average speed over the whole route in km/h, when duration is known
    pub average_speed_kmh: Option<f64>,
    /// Road-type classification, when the backend annotates segments
    pub road_types: Option<RoadTypeHistogram>,
    /// When this estimate was computed; estimates go stale as the vehicle moves
    pub computed_at: DateTime<Utc>,
}

impl RouteEstimate {
    /// Create an estimate from routed distance and duration
    #[must_use]
    pub fn routed(
        distance_km: f64,
        duration_minutes: f64,
        road_types: Option<RoadTypeHistogram>,
        computed_at: DateTime<Utc>,
    ) -> Self {
        let average_speed_kmh = if duration_minutes > 0.0 {
            Some(distance_km / (duration_minutes / 60.0))
        } else {
            None
        };
        Self {
            distance_km,
            duration_minutes: Some(duration_minutes),
            average_speed_kmh,
            road_types,
            computed_at,
        }
    }

    /// Straight-line fallback: great-circle distance, no duration
    #[must_use]
    pub fn straight_line(
        origin: &GeoLocation,
        destination: &GeoLocation,
        computed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            distance_km: origin.distance_km(destination),
            duration_minutes: None,
            average_speed_kmh: None,
            road_types: None,
            computed_at,
        }
    }

    /// Whether the estimate is younger than `max_age_minutes` at `now`
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age_minutes: f64) -> bool {
        let age_minutes = (now - self.computed_at).num_milliseconds() as f64 / 60_000.0;
        (0.0..=max_age_minutes).contains(&age_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid ts")
    }

    #[test]
    fn test_road_type_from_speed() {
        assert_eq!(RoadType::from_speed_kmh(130.0), RoadType::Highway);
        assert_eq!(RoadType::from_speed_kmh(100.0), RoadType::Primary);
        assert_eq!(RoadType::from_speed_kmh(81.0), RoadType::Primary);
        assert_eq!(RoadType::from_speed_kmh(80.0), RoadType::Secondary);
        assert_eq!(RoadType::from_speed_kmh(51.0), RoadType::Secondary);
        assert_eq!(RoadType::from_speed_kmh(50.0), RoadType::Residential);
        assert_eq!(RoadType::from_speed_kmh(30.0), RoadType::Residential);
    }

    #[test]
    fn test_expected_speeds() {
        assert!((RoadType::Highway.expected_speed_kmh() - 120.0).abs() < f64::EPSILON);
        assert!((RoadType::Primary.expected_speed_kmh() - 90.0).abs() < f64::EPSILON);
        assert!((RoadType::Secondary.expected_speed_kmh() - 75.0).abs() < f64::EPSILON);
        assert!((RoadType::Residential.expected_speed_kmh() - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_histogram_from_speeds() {
        let histogram =
            RoadTypeHistogram::from_segment_speeds_kmh([120.0, 110.0, 90.0, 60.0, 30.0]);
        assert_eq!(histogram.highway, 2);
        assert_eq!(histogram.primary, 1);
        assert_eq!(histogram.secondary, 1);
        assert_eq!(histogram.residential, 1);
        assert_eq!(histogram.total(), 5);
    }

    #[test]
    fn test_histogram_weighted_speed_empty() {
        assert!(RoadTypeHistogram::default().weighted_expected_speed_kmh().is_none());
    }

    #[test]
    fn test_histogram_weighted_speed() {
        // 3 highway + 1 residential: (3*120 + 40) / 4 = 100
        let histogram = RoadTypeHistogram {
            highway: 3,
            residential: 1,
            ..Default::default()
        };
        let speed = histogram.weighted_expected_speed_kmh().expect("non-empty");
        assert!((speed - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_routed_estimate_average_speed() {
        let estimate = RouteEstimate::routed(60.0, 45.0, None, now());
        assert!((estimate.average_speed_kmh.expect("duration given") - 80.0).abs() < 0.001);
    }

    #[test]
    fn test_routed_estimate_zero_duration() {
        let estimate = RouteEstimate::routed(0.0, 0.0, None, now());
        assert!(estimate.average_speed_kmh.is_none());
    }

    #[test]
    fn test_straight_line_has_no_duration() {
        let origin = GeoLocation::new_unchecked(52.0, 5.0);
        let destination = GeoLocation::new_unchecked(52.5, 5.0);
        let estimate = RouteEstimate::straight_line(&origin, &destination, now());
        assert!(estimate.duration_minutes.is_none());
        assert!(estimate.average_speed_kmh.is_none());
        assert!((estimate.distance_km - 55.6).abs() < 0.5);
    }

    #[test]
    fn test_freshness() {
        let estimate = RouteEstimate::routed(10.0, 12.0, None, now());
        assert!(estimate.is_fresh(now(), 10.0));
        assert!(estimate.is_fresh(now() + chrono::Duration::minutes(9), 10.0));
        assert!(!estimate.is_fresh(now() + chrono::Duration::minutes(11), 10.0));
        // An estimate "from the future" is not fresh either
        assert!(!estimate.is_fresh(now() - chrono::Duration::minutes(1), 10.0));
    }

    #[test]
    fn test_serialization_round_trip() {
        let estimate = RouteEstimate::routed(
            55.6,
            42.0,
            Some(RoadTypeHistogram::from_segment_speeds_kmh([120.0, 60.0])),
            now(),
        );
        let json = serde_json::to_string(&estimate).expect("serialize");
        let back: RouteEstimate = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, estimate);
    }
}
