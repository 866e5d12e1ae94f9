//! Routing adapter - implements `RoutingPort` over the OSRM client
//!
//! Converts route summaries into domain estimates, bucketing per-segment
//! speed annotations into the road-type histogram the ETA blend consumes.

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::RoutingPort;
use async_trait::async_trait;
use chrono::Utc;
use domain::value_objects::{GeoLocation, RoadTypeHistogram, RouteEstimate};
use integration_routing::{RoutingBackend, RoutingError, Waypoint};
use tracing::{debug, instrument};

use crate::retry::{GateError, RetryGate, RetryPolicy};

/// Adapter binding the routing backend to the routing port
pub struct RoutingAdapter {
    client: Arc<dyn RoutingBackend>,
    gate: RetryGate,
}

impl std::fmt::Debug for RoutingAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingAdapter")
            .field("gate", &self.gate.name())
            .finish()
    }
}

impl RoutingAdapter {
    /// Create an adapter over the given routing backend
    #[must_use]
    pub fn new(client: Arc<dyn RoutingBackend>, policy: RetryPolicy) -> Self {
        Self {
            client,
            gate: RetryGate::new("routing", policy),
        }
    }

    fn map_error(&self, err: GateError<RoutingError>) -> ApplicationError {
        match err {
            GateError::CoolingDown { retry_in } => ApplicationError::TemporarilyUnavailable {
                service: self.gate.name().to_string(),
                retry_in_secs: retry_in.as_secs(),
            },
            GateError::Failed(other) => ApplicationError::RouteUnavailable(other.to_string()),
        }
    }
}

#[async_trait]
impl RoutingPort for RoutingAdapter {
    #[instrument(skip(self), fields(from = %origin, to = %destination))]
    async fn estimate(
        &self,
        origin: &GeoLocation,
        destination: &GeoLocation,
    ) -> Result<RouteEstimate, ApplicationError> {
        let waypoints = [
            Waypoint::new(origin.latitude(), origin.longitude()),
            Waypoint::new(destination.latitude(), destination.longitude()),
        ];

        let summary = self
            .gate
            .call(|| self.client.route(&waypoints))
            .await
            .map_err(|err| self.map_error(err))?;

        let road_types = if summary.segment_speeds_ms.is_empty() {
            None
        } else {
            Some(RoadTypeHistogram::from_segment_speeds_kmh(
                summary.segment_speeds_kmh(),
            ))
        };

        debug!(
            distance_km = summary.distance_km(),
            duration_minutes = summary.duration_minutes(),
            segments = summary.segment_speeds_ms.len(),
            "Route summary received"
        );

        Ok(RouteEstimate::routed(
            summary.distance_km(),
            summary.duration_minutes(),
            road_types,
            Utc::now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use integration_routing::RouteSummary;

    struct FakeBackend {
        result: Result<RouteSummary, fn() -> RoutingError>,
    }

    #[async_trait]
    impl RoutingBackend for FakeBackend {
        async fn route(&self, _waypoints: &[Waypoint]) -> Result<RouteSummary, RoutingError> {
            match &self.result {
                Ok(summary) => Ok(summary.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn adapter_with(result: Result<RouteSummary, fn() -> RoutingError>) -> RoutingAdapter {
        RoutingAdapter::new(Arc::new(FakeBackend { result }), RetryPolicy::for_testing())
    }

    fn origin() -> GeoLocation {
        GeoLocation::new_unchecked(52.0, 5.0)
    }

    fn destination() -> GeoLocation {
        GeoLocation::new_unchecked(52.5, 5.0)
    }

    #[tokio::test]
    async fn estimate_converts_units_and_buckets_speeds() {
        let adapter = adapter_with(Ok(RouteSummary {
            distance_m: 55_600.0,
            duration_s: 2_520.0,
            // 120, 90, 60, 30 km/h
            segment_speeds_ms: vec![33.333, 25.0, 16.667, 8.333],
        }));

        let estimate = adapter.estimate(&origin(), &destination()).await.expect("routed");
        assert!((estimate.distance_km - 55.6).abs() < 1e-9);
        assert!((estimate.duration_minutes.expect("duration") - 42.0).abs() < 1e-9);
        let histogram = estimate.road_types.expect("histogram");
        assert_eq!(histogram.highway, 1);
        assert_eq!(histogram.primary, 1);
        assert_eq!(histogram.secondary, 1);
        assert_eq!(histogram.residential, 1);
    }

    #[tokio::test]
    async fn estimate_without_annotations_has_no_histogram() {
        let adapter = adapter_with(Ok(RouteSummary {
            distance_m: 1000.0,
            duration_s: 90.0,
            segment_speeds_ms: vec![],
        }));

        let estimate = adapter.estimate(&origin(), &destination()).await.expect("routed");
        assert!(estimate.road_types.is_none());
    }

    #[tokio::test]
    async fn no_route_maps_to_route_unavailable() {
        let adapter = adapter_with(Err(|| RoutingError::NoRoute {
            code: "NoRoute".to_string(),
        }));

        let err = adapter.estimate(&origin(), &destination()).await.unwrap_err();
        assert!(matches!(err, ApplicationError::RouteUnavailable(_)));
    }

    #[tokio::test]
    async fn cooldown_maps_to_temporarily_unavailable() {
        let adapter =
            adapter_with(Err(|| RoutingError::ServiceUnavailable("HTTP 502".to_string())));

        let _ = adapter.estimate(&origin(), &destination()).await;
        let err = adapter.estimate(&origin(), &destination()).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::TemporarilyUnavailable { .. }
        ));
    }
}
