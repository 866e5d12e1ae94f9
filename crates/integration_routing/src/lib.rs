//! Routing integration for Waypulse
//!
//! Queries an [OSRM](https://project-osrm.org) server for the best route
//! between waypoints: total distance, duration, and per-segment speed
//! annotations the application layer buckets into road types.

mod client;
mod config;
mod error;
mod models;

pub use client::OsrmClient;
pub use config::OsrmConfig;
pub use error::RoutingError;
pub use models::{RouteSummary, Waypoint};

use async_trait::async_trait;

/// Trait for routing backends
#[async_trait]
pub trait RoutingBackend: Send + Sync {
    /// Compute the best route through the given waypoints, in order
    async fn route(&self, waypoints: &[Waypoint]) -> Result<RouteSummary, RoutingError>;
}
