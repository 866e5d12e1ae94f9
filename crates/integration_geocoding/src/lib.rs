//! Geocoding integrations for Waypulse
//!
//! Turns free-text addresses into coordinates via
//! [Nominatim/OpenStreetMap](https://nominatim.openstreetmap.org) and
//! [Photon/Komoot](https://photon.komoot.io). Both backends implement the
//! [`GeocodingBackend`] trait; the application layer walks them in priority
//! order and treats an empty result set or a client-side rejection as
//! "no match, try the next backend".

mod config;
mod error;
mod models;
mod nominatim;
mod photon;

pub use config::{NominatimConfig, PhotonConfig};
pub use error::GeocodingError;
pub use models::GeocodeResult;
pub use nominatim::NominatimClient;
pub use photon::PhotonClient;

use async_trait::async_trait;

/// Trait for a single geocoding backend
#[async_trait]
pub trait GeocodingBackend: Send + Sync {
    /// Resolve a free-form address to a coordinate and display label
    async fn lookup(&self, address: &str) -> Result<GeocodeResult, GeocodingError>;

    /// Stable backend name for logs and error messages
    fn name(&self) -> &'static str;
}
