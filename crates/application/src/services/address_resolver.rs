//! Address resolution across prioritized geocoding backends
//!
//! Tries each injected backend in order; the first success wins. Blank
//! input is rejected synchronously before any backend is consulted. When
//! every backend fails, the error carries the per-backend failure list.

use std::sync::Arc;

use domain::value_objects::GeocodedPlace;
use tracing::{debug, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::GeocodingPort;

/// Resolves free-form addresses via a backend priority chain
#[derive(Clone)]
pub struct AddressResolver {
    backends: Vec<Arc<dyn GeocodingPort>>,
}

impl std::fmt::Debug for AddressResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressResolver")
            .field("backends", &self.backends.len())
            .finish()
    }
}

impl AddressResolver {
    /// Create a resolver over backends in priority order
    #[must_use]
    pub fn new(backends: Vec<Arc<dyn GeocodingPort>>) -> Self {
        Self { backends }
    }

    /// Resolve an address to a geocoded place
    ///
    /// # Errors
    ///
    /// `InvalidAddress` for blank input; `AddressNotFound` with the
    /// per-backend error list when every backend fails.
    #[instrument(skip(self))]
    pub async fn resolve(&self, address: &str) -> Result<GeocodedPlace, ApplicationError> {
        let trimmed = address.trim();
        if trimmed.is_empty() {
            return Err(ApplicationError::InvalidAddress);
        }

        let mut backend_errors = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            match backend.resolve(trimmed).await {
                Ok(place) => {
                    debug!(
                        backend = backend.backend_name(),
                        label = %place.label,
                        "Address resolved"
                    );
                    return Ok(place);
                },
                Err(err) => {
                    warn!(
                        backend = backend.backend_name(),
                        error = %err,
                        "Geocoding backend failed, trying next"
                    );
                    backend_errors.push(format!("{}: {err}", backend.backend_name()));
                },
            }
        }

        Err(ApplicationError::address_not_found(trimmed, backend_errors))
    }
}
