//! Schema-versioned serialized trip state for the persistence port

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Trip;

/// Current snapshot schema version
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// The opaque blob handed to the trip store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSnapshot {
    /// Schema version; loaders discard snapshots with unknown versions
    pub schema_version: u32,
    /// When the snapshot was taken
    pub saved_at: DateTime<Utc>,
    /// The trip state at save time
    pub trip: Trip,
}

impl TripSnapshot {
    /// Snapshot a trip at `saved_at` under the current schema version
    #[must_use]
    pub fn new(trip: Trip, saved_at: DateTime<Utc>) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            saved_at,
            trip,
        }
    }

    /// Whether this snapshot uses the current schema version
    #[must_use]
    pub const fn is_current_version(&self) -> bool {
        self.schema_version == SNAPSHOT_SCHEMA_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{GeoLocation, GeocodedPlace, GeocodingSource, RouteEstimate};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid ts")
    }

    fn sample_trip() -> Trip {
        Trip::new(
            GeoLocation::new_unchecked(52.0, 5.0),
            GeocodedPlace::new(
                GeoLocation::new_unchecked(52.5, 5.0),
                "Destination",
                GeocodingSource::Nominatim,
            ),
            RouteEstimate::routed(55.6, 42.0, None, now()),
            now(),
        )
    }

    #[test]
    fn test_new_snapshot_is_current() {
        let snapshot = TripSnapshot::new(sample_trip(), now());
        assert!(snapshot.is_current_version());
        assert_eq!(snapshot.schema_version, SNAPSHOT_SCHEMA_VERSION);
    }

    #[test]
    fn test_foreign_version_detected() {
        let mut snapshot = TripSnapshot::new(sample_trip(), now());
        snapshot.schema_version = 99;
        assert!(!snapshot.is_current_version());
    }

    #[test]
    fn test_serialization_round_trip() {
        let snapshot = TripSnapshot::new(sample_trip(), now());
        let json = serde_json::to_string(&snapshot).expect("serialize");
        let back: TripSnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, snapshot);
    }
}
