//! Events emitted by the trip progress engine
//!
//! The engine emits plain data; all rendering lives in the presentation
//! layer.

use serde::{Deserialize, Serialize};

use crate::entities::Trip;

/// An estimated time remaining, pre-formatted for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtaReport {
    /// Minutes remaining
    pub minutes: f64,
    /// Banded display string ("almost there", "12 minutes", "2h 15m", ...)
    pub display: String,
}

/// Normalized position-source failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationErrorKind {
    /// The user denied location access; fatal until reset
    PermissionDenied,
    /// The source cannot produce a fix right now
    Unavailable,
    /// The source did not answer within its deadline
    Timeout,
}

impl LocationErrorKind {
    /// Whether further position requests are pointless this session
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }

    /// Get a human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "location permission denied",
            Self::Unavailable => "position unavailable",
            Self::Timeout => "position request timed out",
        }
    }
}

impl std::fmt::Display for LocationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Progress toward the destination, emitted once per accepted fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Percentage of the destination leg covered, clamped to [0, 100]
    pub progress_percent: f64,
    /// Kilometers covered so far
    pub distance_traveled_km: f64,
    /// Kilometers left to the destination
    pub remaining_distance_km: f64,
    /// The fixed route total
    pub total_distance_km: f64,
    /// Time remaining, when estimable
    pub eta: Option<EtaReport>,
}

/// Progress toward the intermediate stop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextStopProgress {
    /// Percentage of the stop leg covered, clamped to [0, 100]
    pub progress_percent: f64,
    /// Straight-line kilometers to the stop
    pub distance_to_stop_km: f64,
    /// Time remaining to the stop, when estimable
    pub eta: Option<EtaReport>,
    /// True once the vehicle is within the stop threshold (non-terminal)
    pub reached: bool,
}

/// Everything the engine tells the outside world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum TripEvent {
    /// Destination-leg progress
    ProgressUpdate(ProgressUpdate),
    /// Intermediate-stop progress
    NextStopProgress(NextStopProgress),
    /// The trip reached its destination; fired exactly once
    TripComplete(Box<Trip>),
    /// A position-source failure was observed
    LocationError(LocationErrorKind),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_kinds() {
        assert!(LocationErrorKind::PermissionDenied.is_fatal());
        assert!(!LocationErrorKind::Unavailable.is_fatal());
        assert!(!LocationErrorKind::Timeout.is_fatal());
    }

    #[test]
    fn test_event_serialization_tags() {
        let event = TripEvent::LocationError(LocationErrorKind::Timeout);
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("location_error"));
        assert!(json.contains("timeout"));
    }

    #[test]
    fn test_progress_update_round_trip() {
        let event = TripEvent::ProgressUpdate(ProgressUpdate {
            progress_percent: 42.5,
            distance_traveled_km: 23.6,
            remaining_distance_km: 32.0,
            total_distance_km: 55.6,
            eta: Some(EtaReport {
                minutes: 24.0,
                display: "24 minutes".to_string(),
            }),
        });
        let json = serde_json::to_string(&event).expect("serialize");
        let back: TripEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, event);
    }
}
