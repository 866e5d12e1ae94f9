//! Pure leg-progress math
//!
//! One distance strategy everywhere: remaining distance is measured
//! straight-line from the current position to the leg target, and traveled
//! distance and percentage are derived from it against the fixed route
//! total. Percentage and remaining distance can therefore never disagree.

use domain::entities::NextStopLeg;
use domain::value_objects::{GeoLocation, PositionFix};

/// Straight-line kilometers from `position` to `target`
#[must_use]
pub fn remaining_distance_km(position: &GeoLocation, target: &GeoLocation) -> f64 {
    position.distance_km(target)
}

/// Kilometers covered, derived from the remaining distance against the
/// fixed total, clamped to [0, total]
#[must_use]
pub fn distance_traveled_km(total_km: f64, remaining_km: f64) -> f64 {
    (total_km - remaining_km).clamp(0.0, total_km.max(0.0))
}

/// Leg progress in percent, clamped to [0, 100]
///
/// A non-positive total yields 0 rather than a division error.
#[must_use]
pub fn progress_percent(total_km: f64, remaining_km: f64) -> f64 {
    if total_km <= 0.0 {
        return 0.0;
    }
    ((total_km - remaining_km) / total_km * 100.0).clamp(0.0, 100.0)
}

/// Instantaneous speed between two fixes in km/h
///
/// Returns `None` when no time elapsed or the displacement stays under the
/// minimum-movement threshold (GPS jitter at rest).
#[must_use]
pub fn instantaneous_speed_kmh(
    previous: &PositionFix,
    current: &PositionFix,
    min_movement_km: f64,
) -> Option<f64> {
    let elapsed_s = current.seconds_since(previous);
    if elapsed_s <= 0.0 {
        return None;
    }
    let displacement_km = current.displacement_km(previous);
    if displacement_km <= min_movement_km {
        return None;
    }
    Some(displacement_km / (elapsed_s / 3600.0))
}

/// Progress along the intermediate-stop leg
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopLegProgress {
    /// Percent of the stop leg covered, clamped to [0, 100]
    pub percent: f64,
    /// Straight-line kilometers from the current position to the stop
    pub distance_to_stop_km: f64,
    /// Total length of the stop leg in kilometers
    pub leg_total_km: f64,
}

/// Compute progress along the stop leg from the leg origin
///
/// `position` is the current fix when one is available; without it the leg
/// renders 0% rather than erroring.
#[must_use]
pub fn next_stop_progress(leg: &NextStopLeg, position: Option<&GeoLocation>) -> StopLegProgress {
    let leg_total_km = leg.total_distance_km();
    let Some(position) = position else {
        return StopLegProgress {
            percent: 0.0,
            distance_to_stop_km: leg_total_km,
            leg_total_km,
        };
    };
    let traveled_km = leg.leg_origin.distance_km(position);
    let percent = if leg_total_km <= 0.0 {
        0.0
    } else {
        (traveled_km / leg_total_km * 100.0).clamp(0.0, 100.0)
    };
    StopLegProgress {
        percent,
        distance_to_stop_km: position.distance_km(&leg.place.location),
        leg_total_km,
    }
}
