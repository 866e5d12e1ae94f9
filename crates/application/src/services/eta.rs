//! Time-remaining estimation
//!
//! Blends three signal sources in priority order, each a fallback for the
//! previous: a fresh route-estimate duration scaled by the covered
//! fraction; a road-type-weighted expected speed blended 40/60 with a
//! recency-weighted measured average; and the plain trip average. A final
//! remaining-distance sanity clamp overrides raw speed where noise
//! dominates.

use chrono::{DateTime, Utc};
use domain::events::EtaReport;
use domain::value_objects::{RouteEstimate, SpeedHistory};

/// Route estimates older than this are no longer trusted for tier (a)
const ROUTE_FRESHNESS_MINUTES: f64 = 10.0;
/// Speed samples older than this are excluded from the measured average
const SPEED_SAMPLE_MAX_AGE_MINUTES: f64 = 5.0;
/// Weight of the road-type expected speed in the tier (b) blend
const EXPECTED_SPEED_WEIGHT: f64 = 0.4;
/// Weight of the measured speed in the tier (b) blend
const MEASURED_SPEED_WEIGHT: f64 = 0.6;
/// Plain-average acceptance band in km/h
const PLAIN_AVERAGE_BAND_KMH: (f64, f64) = (20.0, 120.0);
/// Fallback speed when no signal survives, in km/h
const DEFAULT_SPEED_KMH: f64 = 80.0;

/// Inputs for one ETA computation
#[derive(Debug, Clone)]
pub struct EtaContext<'a> {
    /// Kilometers left on the leg
    pub remaining_km: f64,
    /// Total leg length in kilometers
    pub leg_total_km: f64,
    /// The leg's route estimate, when one exists
    pub route: Option<&'a RouteEstimate>,
    /// Measured speed history
    pub speed_history: &'a SpeedHistory,
    /// Kilometers covered since trip start (for the plain average)
    pub trip_distance_traveled_km: f64,
    /// Minutes since trip start (for the plain average)
    pub trip_elapsed_minutes: f64,
    /// Reference time for freshness and recency weighting
    pub now: DateTime<Utc>,
}

/// Estimate the remaining minutes for a leg
#[must_use]
pub fn estimate_eta(ctx: &EtaContext<'_>) -> EtaReport {
    let minutes = estimate_minutes(ctx).max(0.0);
    EtaReport {
        minutes,
        display: format_eta_minutes(minutes),
    }
}

fn estimate_minutes(ctx: &EtaContext<'_>) -> f64 {
    if ctx.remaining_km <= 0.0 {
        return 0.0;
    }
    let speed_kmh = sanity_clamp_speed(ctx.remaining_km, raw_speed_kmh(ctx));
    ctx.remaining_km / speed_kmh * 60.0
}

/// Pick the best available speed signal, in km/h
fn raw_speed_kmh(ctx: &EtaContext<'_>) -> f64 {
    // (a) fresh route duration, scaled by the fraction already covered
    if let Some(route) = ctx.route {
        if let Some(duration_minutes) = route.duration_minutes {
            if route.is_fresh(ctx.now, ROUTE_FRESHNESS_MINUTES) && duration_minutes > 0.0 {
                let traveled_fraction = if ctx.leg_total_km > 0.0 {
                    (1.0 - ctx.remaining_km / ctx.leg_total_km).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let minutes_left = duration_minutes * (1.0 - traveled_fraction);
                if minutes_left > 0.0 {
                    return ctx.remaining_km / (minutes_left / 60.0);
                }
            }
        }
    }

    // (b) road-type expectation blended with the measured average
    let expected = ctx
        .route
        .and_then(|route| route.road_types.as_ref())
        .and_then(|histogram| histogram.weighted_expected_speed_kmh());
    let measured = ctx
        .speed_history
        .recency_weighted_average_kmh(ctx.now, SPEED_SAMPLE_MAX_AGE_MINUTES);
    match (expected, measured) {
        (Some(expected), Some(measured)) => {
            return EXPECTED_SPEED_WEIGHT.mul_add(expected, MEASURED_SPEED_WEIGHT * measured);
        },
        (Some(expected), None) => return expected,
        (None, Some(measured)) => return measured,
        (None, None) => {},
    }

    // (c) plain trip average, accepted only within a plausible band
    if ctx.trip_elapsed_minutes > 0.0 {
        let plain = ctx.trip_distance_traveled_km / (ctx.trip_elapsed_minutes / 60.0);
        if (PLAIN_AVERAGE_BAND_KMH.0..=PLAIN_AVERAGE_BAND_KMH.1).contains(&plain) {
            return plain;
        }
    }
    DEFAULT_SPEED_KMH
}

/// Remaining-distance sanity clamp
///
/// Long remaining legs imply highway travel; very short ones are dominated
/// by city driving and GPS noise, so raw speed is overridden there.
fn sanity_clamp_speed(remaining_km: f64, speed_kmh: f64) -> f64 {
    if remaining_km > 50.0 {
        speed_kmh.max(80.0)
    } else if remaining_km >= 10.0 {
        speed_kmh.max(60.0)
    } else {
        speed_kmh.min(50.0)
    }
}

/// Format minutes remaining into a banded display string
#[must_use]
pub fn format_eta_minutes(minutes: f64) -> String {
    let minutes = minutes.max(0.0);
    if minutes <= 5.0 {
        return "almost there".to_string();
    }
    let rounded = minutes.round() as u64;
    if rounded < 60 {
        return format!("{rounded} minutes");
    }
    let hours = rounded / 60;
    let rest = rounded % 60;
    if rest == 0 {
        if hours == 1 {
            "1 hour".to_string()
        } else {
            format!("{hours} hours")
        }
    } else {
        format!("{hours}h {rest}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use domain::value_objects::{RoadTypeHistogram, SpeedSample};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid ts")
    }

    fn history_with(speeds: &[f64]) -> SpeedHistory {
        let mut history = SpeedHistory::default();
        for (i, speed) in speeds.iter().enumerate() {
            history.push(SpeedSample::new(
                *speed,
                now() + chrono::Duration::seconds(i as i64 * 30),
            ));
        }
        history
    }

    fn context<'a>(
        remaining_km: f64,
        route: Option<&'a RouteEstimate>,
        history: &'a SpeedHistory,
    ) -> EtaContext<'a> {
        EtaContext {
            remaining_km,
            leg_total_km: 55.6,
            route,
            speed_history: history,
            trip_distance_traveled_km: 55.6 - remaining_km,
            trip_elapsed_minutes: 30.0,
            now: now() + chrono::Duration::minutes(2),
        }
    }

    #[test]
    fn test_zero_remaining_is_zero_minutes() {
        let history = SpeedHistory::default();
        let eta = estimate_eta(&context(0.0, None, &history));
        assert!(eta.minutes.abs() < f64::EPSILON);
        assert_eq!(eta.display, "almost there");
    }

    #[test]
    fn test_fresh_route_duration_scales_with_coverage() {
        // 60-minute route, half covered: 30 minutes left at route pace.
        // Remaining 27.8 of 55.6 km at 55.6 km/h implied -> but the 10-50 km
        // clamp floors the speed at 60 km/h, giving 27.8 km / 60 kmh = 27.8 min.
        let route = RouteEstimate::routed(55.6, 60.0, None, now());
        let history = SpeedHistory::default();
        let eta = estimate_eta(&context(27.8, Some(&route), &history));
        assert!((eta.minutes - 27.8).abs() < 0.5);
    }

    #[test]
    fn test_stale_route_falls_through_to_blend() {
        let mut route = RouteEstimate::routed(55.6, 60.0, Some(RoadTypeHistogram {
            highway: 10,
            ..Default::default()
        }), now());
        route.computed_at = now() - chrono::Duration::minutes(30);
        let history = history_with(&[100.0, 100.0, 100.0]);
        let ctx = context(30.0, Some(&route), &history);
        let eta = estimate_eta(&ctx);
        // Blend: 0.4*120 + 0.6*100 = 108 km/h; 30 km -> ~16.7 min
        assert!((eta.minutes - 16.7).abs() < 0.5);
    }

    #[test]
    fn test_blend_uses_measured_only_when_no_histogram() {
        let history = history_with(&[90.0, 90.0]);
        let ctx = context(30.0, None, &history);
        let eta = estimate_eta(&ctx);
        // 30 km at 90 km/h = 20 min
        assert!((eta.minutes - 20.0).abs() < 0.5);
    }

    #[test]
    fn test_plain_average_fallback_within_band() {
        let history = SpeedHistory::default();
        let mut ctx = context(30.0, None, &history);
        ctx.trip_distance_traveled_km = 25.6;
        ctx.trip_elapsed_minutes = 20.0; // 76.8 km/h plain average
        let eta = estimate_eta(&ctx);
        assert!((eta.minutes - 30.0 / 76.8 * 60.0).abs() < 0.5);
    }

    #[test]
    fn test_plain_average_outside_band_defaults() {
        let history = SpeedHistory::default();
        let mut ctx = context(30.0, None, &history);
        ctx.trip_distance_traveled_km = 2.0;
        ctx.trip_elapsed_minutes = 60.0; // 2 km/h, rejected
        let eta = estimate_eta(&ctx);
        // Default 80 km/h on a 30 km leg -> 22.5 min
        assert!((eta.minutes - 22.5).abs() < 0.5);
    }

    #[test]
    fn test_long_leg_clamps_speed_up() {
        let history = history_with(&[30.0, 30.0]);
        let mut ctx = context(80.0, None, &history);
        ctx.leg_total_km = 100.0;
        let eta = estimate_eta(&ctx);
        // 30 km/h measured, but >50 km remaining assumes >=80 km/h: 60 min
        assert!((eta.minutes - 60.0).abs() < 0.5);
    }

    #[test]
    fn test_short_leg_caps_speed_down() {
        let history = history_with(&[130.0, 130.0]);
        let ctx = context(5.0, None, &history);
        let eta = estimate_eta(&ctx);
        // 130 km/h measured, but <10 km remaining caps at 50 km/h: 6 min
        assert!((eta.minutes - 6.0).abs() < 0.2);
    }

    #[test]
    fn test_format_bands() {
        assert_eq!(format_eta_minutes(0.0), "almost there");
        assert_eq!(format_eta_minutes(5.0), "almost there");
        assert_eq!(format_eta_minutes(12.4), "12 minutes");
        assert_eq!(format_eta_minutes(59.4), "59 minutes");
        assert_eq!(format_eta_minutes(60.0), "1 hour");
        assert_eq!(format_eta_minutes(120.2), "2 hours");
        assert_eq!(format_eta_minutes(75.0), "1h 15m");
    }

    proptest! {
        #[test]
        fn eta_is_finite_and_non_negative(
            remaining in 0.0f64..500.0,
            traveled in 0.0f64..500.0,
            elapsed in 0.0f64..600.0,
        ) {
            let history = SpeedHistory::default();
            let ctx = EtaContext {
                remaining_km: remaining,
                leg_total_km: remaining + traveled,
                route: None,
                speed_history: &history,
                trip_distance_traveled_km: traveled,
                trip_elapsed_minutes: elapsed,
                now: now(),
            };
            let eta = estimate_eta(&ctx);
            prop_assert!(eta.minutes.is_finite());
            prop_assert!(eta.minutes >= 0.0);
        }

        #[test]
        fn format_is_total(minutes in 0.0f64..100_000.0) {
            let display = format_eta_minutes(minutes);
            prop_assert!(!display.is_empty());
        }
    }
}
