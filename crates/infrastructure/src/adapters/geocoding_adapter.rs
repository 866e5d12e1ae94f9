//! Geocoding adapter - implements `GeocodingPort` over one backend client
//!
//! Every lookup goes through the shared retry gate; cooldown rejections
//! surface as `TemporarilyUnavailable` so the resolver can move on to the
//! next backend.

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::GeocodingPort;
use async_trait::async_trait;
use domain::value_objects::{GeoLocation, GeocodedPlace, GeocodingSource};
use integration_geocoding::{GeocodingBackend, GeocodingError};
use tracing::{debug, instrument};

use crate::retry::{GateError, RetryGate, RetryPolicy};

/// Adapter binding one geocoding backend client to the geocoding port
pub struct GeocodingAdapter {
    client: Arc<dyn GeocodingBackend>,
    source: GeocodingSource,
    gate: RetryGate,
}

impl std::fmt::Debug for GeocodingAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodingAdapter")
            .field("source", &self.source)
            .field("gate", &self.gate.name())
            .finish()
    }
}

impl GeocodingAdapter {
    /// Create an adapter for the given backend
    #[must_use]
    pub fn new(
        client: Arc<dyn GeocodingBackend>,
        source: GeocodingSource,
        policy: RetryPolicy,
    ) -> Self {
        let gate_name = match source {
            GeocodingSource::Nominatim => "geocoding-nominatim",
            GeocodingSource::Photon => "geocoding-photon",
        };
        Self {
            client,
            source,
            gate: RetryGate::new(gate_name, policy),
        }
    }

    fn map_error(&self, address: &str, err: GateError<GeocodingError>) -> ApplicationError {
        match err {
            GateError::CoolingDown { retry_in } => ApplicationError::TemporarilyUnavailable {
                service: self.gate.name().to_string(),
                retry_in_secs: retry_in.as_secs(),
            },
            GateError::Failed(GeocodingError::NoMatch(detail)) => {
                ApplicationError::address_not_found(address, vec![detail])
            },
            GateError::Failed(other) => ApplicationError::ExternalService(other.to_string()),
        }
    }
}

#[async_trait]
impl GeocodingPort for GeocodingAdapter {
    #[instrument(skip(self))]
    async fn resolve(&self, address: &str) -> Result<GeocodedPlace, ApplicationError> {
        let result = self
            .gate
            .call(|| self.client.lookup(address))
            .await
            .map_err(|err| self.map_error(address, err))?;

        let location = GeoLocation::new(result.latitude, result.longitude).map_err(|_| {
            ApplicationError::ExternalService(format!(
                "{} returned out-of-range coordinates",
                self.backend_name()
            ))
        })?;

        debug!(label = %result.label, "Backend resolved address");
        Ok(GeocodedPlace::new(location, result.label, self.source))
    }

    fn backend_name(&self) -> &'static str {
        match self.source {
            GeocodingSource::Nominatim => "nominatim",
            GeocodingSource::Photon => "photon",
        }
    }
}
