//! Geocoding port
//!
//! One port instance represents one geocoding backend. The address
//! resolver service walks a priority-ordered list of these.

use async_trait::async_trait;
use domain::value_objects::GeocodedPlace;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for a single geocoding backend
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GeocodingPort: Send + Sync {
    /// Resolve a free-form address to a coordinate and canonical label
    async fn resolve(&self, address: &str) -> Result<GeocodedPlace, ApplicationError>;

    /// Stable backend name for logs and error reports
    fn backend_name(&self) -> &'static str;
}
