//! Route estimation service
//!
//! Thin wrapper over the routing port with one explicit degradation path.
//! The estimator always propagates routing failures; each call site decides
//! whether to abort (trip start) or degrade to the straight-line fallback
//! (mid-trip recomputes). Keeping the choice at the call site avoids the
//! estimator silently producing different qualities of data.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::value_objects::{GeoLocation, RouteEstimate};
use tracing::{debug, instrument};

use crate::error::ApplicationError;
use crate::ports::RoutingPort;

/// Estimates routes between coordinates
#[derive(Clone)]
pub struct RouteEstimator {
    routing: Arc<dyn RoutingPort>,
}

impl std::fmt::Debug for RouteEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEstimator").finish_non_exhaustive()
    }
}

impl RouteEstimator {
    /// Create a new estimator over a routing port
    #[must_use]
    pub fn new(routing: Arc<dyn RoutingPort>) -> Self {
        Self { routing }
    }

    /// Query the routing backend for a leg estimate
    ///
    /// # Errors
    ///
    /// Propagates `RouteUnavailable` / `TemporarilyUnavailable` untouched.
    #[instrument(skip(self), fields(from = %origin, to = %destination))]
    pub async fn estimate(
        &self,
        origin: &GeoLocation,
        destination: &GeoLocation,
    ) -> Result<RouteEstimate, ApplicationError> {
        let estimate = self.routing.estimate(origin, destination).await?;
        debug!(
            distance_km = estimate.distance_km,
            duration_minutes = estimate.duration_minutes,
            "Route estimated"
        );
        Ok(estimate)
    }

    /// Straight-line fallback for call sites that degrade on routing failure
    #[must_use]
    pub fn straight_line_fallback(
        origin: &GeoLocation,
        destination: &GeoLocation,
        now: DateTime<Utc>,
    ) -> RouteEstimate {
        RouteEstimate::straight_line(origin, destination, now)
    }
}
