//! OSRM routing client
//!
//! `GET /route/v1/{profile}/{lon},{lat};{lon},{lat}?overview=false` with
//! optional speed annotations. Waypoints go into the path longitude-first,
//! per the OSRM convention.

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::OsrmConfig;
use crate::error::RoutingError;
use crate::models::{RouteSummary, Waypoint};
use crate::RoutingBackend;

/// OSRM-backed routing client
#[derive(Debug)]
pub struct OsrmClient {
    client: Client,
    config: OsrmConfig,
}

impl OsrmClient {
    /// Create a new OSRM client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &OsrmConfig) -> Result<Self, RoutingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RoutingError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Build the request URL for the given waypoints
    fn build_route_url(&self, waypoints: &[Waypoint]) -> String {
        let mut coordinates = String::new();
        for (i, waypoint) in waypoints.iter().enumerate() {
            if i > 0 {
                coordinates.push(';');
            }
            // OSRM wants lon,lat
            let _ = write!(
                coordinates,
                "{},{}",
                waypoint.longitude, waypoint.latitude
            );
        }
        let annotations = if self.config.request_annotations {
            "&annotations=speed"
        } else {
            ""
        };
        format!(
            "{}/route/v1/{}/{}?overview=false{}",
            self.config.base_url, self.config.profile, coordinates, annotations
        )
    }
}

#[async_trait]
impl RoutingBackend for OsrmClient {
    #[instrument(skip(self), fields(waypoints = waypoints.len()))]
    async fn route(&self, waypoints: &[Waypoint]) -> Result<RouteSummary, RoutingError> {
        if waypoints.len() < 2 {
            return Err(RoutingError::TooFewWaypoints(waypoints.len()));
        }

        let url = self.build_route_url(waypoints);
        debug!(%url, "Requesting route");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                RoutingError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                }
            } else {
                RoutingError::ConnectionFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_server_error() {
            return Err(RoutingError::ServiceUnavailable(format!("HTTP {status}")));
        }
        // OSRM signals "no route" with a 400 and a code field; read the body
        // for both success and client-error statuses
        if !status.is_success() && !status.is_client_error() {
            return Err(RoutingError::RequestFailed(format!("HTTP {status}")));
        }

        let body: OsrmResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::ParseError(e.to_string()))?;

        if body.code != "Ok" {
            return Err(RoutingError::NoRoute { code: body.code });
        }

        let route = body
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::ParseError("Response carried no routes".to_string()))?;

        let segment_speeds_ms = route
            .legs
            .iter()
            .filter_map(|leg| leg.annotation.as_ref())
            .flat_map(|annotation| annotation.speed.iter().copied())
            .collect();

        debug!(
            distance_m = route.distance,
            duration_s = route.duration,
            "Route received"
        );

        Ok(RouteSummary {
            distance_m: route.distance,
            duration_s: route.duration,
            segment_speeds_ms,
        })
    }
}

/// Raw OSRM API response
#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    annotation: Option<OsrmAnnotation>,
}

#[derive(Debug, Deserialize)]
struct OsrmAnnotation {
    #[serde(default)]
    speed: Vec<f64>,
}
