//! Trip entity - the central mutable state of a tracked trip

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{GeoLocation, GeocodedPlace, RouteEstimate, SpeedHistory};

/// Lifecycle status of a trip
///
/// The engine-level Idle state is the absence of a trip; a constructed trip
/// starts Active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    /// Position tracking is running
    Active,
    /// Tracking paused by the user; state retained
    Stopped,
    /// Arrival threshold reached; terminal until reset
    Completed,
}

impl TripStatus {
    /// Whether tracking is running
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Whether the trip reached its destination
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Get a human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Stopped => "Stopped",
            Self::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The intermediate-stop leg of a trip
///
/// Folding the stop place and its reference origin into one struct keeps the
/// invariant "a stop origin exists iff a stop exists" structural.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextStopLeg {
    /// The resolved stop
    pub place: GeocodedPlace,
    /// Reference point from which stop progress is measured: the trip origin
    /// when the stop was set at start, the position at update time otherwise
    pub leg_origin: GeoLocation,
    /// Route estimate for this leg, when routing succeeded
    pub route_estimate: Option<RouteEstimate>,
    /// True when the stop was added or changed after trip start
    pub set_mid_trip: bool,
}

impl NextStopLeg {
    /// Leg for a stop supplied with the initial trip request
    #[must_use]
    pub const fn at_start(
        place: GeocodedPlace,
        trip_origin: GeoLocation,
        route_estimate: Option<RouteEstimate>,
    ) -> Self {
        Self {
            place,
            leg_origin: trip_origin,
            route_estimate,
            set_mid_trip: false,
        }
    }

    /// Leg for a stop added or changed during an active trip
    #[must_use]
    pub const fn mid_trip(
        place: GeocodedPlace,
        position_at_update: GeoLocation,
        route_estimate: Option<RouteEstimate>,
    ) -> Self {
        Self {
            place,
            leg_origin: position_at_update,
            route_estimate,
            set_mid_trip: true,
        }
    }

    /// Total leg distance: routed when available, straight-line otherwise
    #[must_use]
    pub fn total_distance_km(&self) -> f64 {
        self.route_estimate.as_ref().map_or_else(
            || self.leg_origin.distance_km(&self.place.location),
            |estimate| estimate.distance_km,
        )
    }
}

/// The central trip state, owned exclusively by the progress engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Position at trip start; never mutated
    pub origin: GeoLocation,
    /// Resolved destination; never mutated
    pub destination: GeocodedPlace,
    /// Optional intermediate stop
    pub next_stop: Option<NextStopLeg>,
    /// When the trip started
    pub started_at: DateTime<Utc>,
    /// Route distance origin -> destination, the fixed percentage denominator
    pub total_distance_km: f64,
    /// Derived each position update; consumers clamp against the total
    pub distance_traveled_km: f64,
    /// Derived each position update
    pub remaining_distance_km: f64,
    /// Route estimate for the destination leg
    pub route_estimate: RouteEstimate,
    /// Bounded history of plausible measured speeds
    pub speed_history: SpeedHistory,
    /// Lifecycle status
    pub status: TripStatus,
}

impl Trip {
    /// Create an active trip from the start position, resolved destination,
    /// and the initial route estimate
    #[must_use]
    pub fn new(
        origin: GeoLocation,
        destination: GeocodedPlace,
        route_estimate: RouteEstimate,
        started_at: DateTime<Utc>,
    ) -> Self {
        let total_distance_km = route_estimate.distance_km;
        Self {
            origin,
            destination,
            next_stop: None,
            started_at,
            total_distance_km,
            distance_traveled_km: 0.0,
            remaining_distance_km: total_distance_km,
            route_estimate,
            speed_history: SpeedHistory::default(),
            status: TripStatus::Active,
        }
    }

    /// Attach an intermediate stop leg
    #[must_use]
    pub fn with_next_stop(mut self, leg: NextStopLeg) -> Self {
        self.next_stop = Some(leg);
        self
    }

    /// Whether tracking is running
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Minutes elapsed since trip start at `now`
    #[must_use]
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> f64 {
        ((now - self.started_at).num_milliseconds() as f64 / 60_000.0).max(0.0)
    }
}
