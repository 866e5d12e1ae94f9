//! Photon geocoding backend
//!
//! Search against the Photon API (GeoJSON feature collection, best match
//! only). GeoJSON coordinates are `[longitude, latitude]`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::PhotonConfig;
use crate::error::GeocodingError;
use crate::models::GeocodeResult;
use crate::GeocodingBackend;

/// Photon-backed geocoding client
#[derive(Debug)]
pub struct PhotonClient {
    client: Client,
    config: PhotonConfig,
}

impl PhotonClient {
    /// Create a new Photon client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &PhotonConfig) -> Result<Self, GeocodingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GeocodingError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Build a display label from the feature properties
    fn label_from_properties(properties: &PhotonProperties, fallback: &str) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        if let Some(name) = properties.name.as_deref() {
            parts.push(name);
        }
        if let Some(city) = properties.city.as_deref() {
            if !parts.contains(&city) {
                parts.push(city);
            }
        }
        if let Some(country) = properties.country.as_deref() {
            parts.push(country);
        }
        if parts.is_empty() {
            fallback.to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[async_trait]
impl GeocodingBackend for PhotonClient {
    #[instrument(skip(self))]
    async fn lookup(&self, address: &str) -> Result<GeocodeResult, GeocodingError> {
        let url = format!("{}/api", self.config.base_url);
        let params = [
            ("q", address.to_string()),
            ("limit", "1".to_string()),
            ("lang", self.config.language.clone()),
        ];

        debug!(%address, "Geocoding via Photon");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeocodingError::Timeout {
                        timeout_secs: self.config.timeout_secs,
                    }
                } else {
                    GeocodingError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_server_error() {
            return Err(GeocodingError::ServiceUnavailable(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(GeocodingError::NoMatch(format!(
                "{address} (HTTP {status})"
            )));
        }

        let collection: PhotonResponse = response
            .json()
            .await
            .map_err(|e| GeocodingError::ParseError(e.to_string()))?;

        let feature = collection
            .features
            .first()
            .ok_or_else(|| GeocodingError::NoMatch(address.to_string()))?;

        // GeoJSON order: [lon, lat]
        let [longitude, latitude] = feature.geometry.coordinates;

        debug!(%address, %latitude, %longitude, "Geocoded address");

        Ok(GeocodeResult {
            latitude,
            longitude,
            label: Self::label_from_properties(&feature.properties, address),
        })
    }

    fn name(&self) -> &'static str {
        "photon"
    }
}

/// Raw Photon API response (GeoJSON)
#[derive(Debug, Deserialize)]
struct PhotonResponse {
    features: Vec<PhotonFeature>,
}

#[derive(Debug, Deserialize)]
struct PhotonFeature {
    geometry: PhotonGeometry,
    properties: PhotonProperties,
}

#[derive(Debug, Deserialize)]
struct PhotonGeometry {
    coordinates: [f64; 2],
}

#[derive(Debug, Default, Deserialize)]
struct PhotonProperties {
    name: Option<String>,
    city: Option<String>,
    country: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = PhotonClient::new(&PhotonConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_backend_name() {
        let client = PhotonClient::new(&PhotonConfig::default()).unwrap();
        assert_eq!(client.name(), "photon");
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "features": [{
                "geometry": { "coordinates": [5.0, 52.5], "type": "Point" },
                "properties": { "name": "Utrecht", "country": "Netherlands" }
            }]
        }"#;
        let response: PhotonResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.features.len(), 1);
        assert!((response.features[0].geometry.coordinates[1] - 52.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_label_assembly() {
        let properties = PhotonProperties {
            name: Some("Dom Tower".to_string()),
            city: Some("Utrecht".to_string()),
            country: Some("Netherlands".to_string()),
        };
        let label = PhotonClient::label_from_properties(&properties, "fallback");
        assert_eq!(label, "Dom Tower, Utrecht, Netherlands");
    }

    #[test]
    fn test_label_falls_back_to_query() {
        let label = PhotonClient::label_from_properties(&PhotonProperties::default(), "query");
        assert_eq!(label, "query");
    }

    #[test]
    fn test_label_deduplicates_city_name() {
        let properties = PhotonProperties {
            name: Some("Utrecht".to_string()),
            city: Some("Utrecht".to_string()),
            country: Some("Netherlands".to_string()),
        };
        let label = PhotonClient::label_from_properties(&properties, "fallback");
        assert_eq!(label, "Utrecht, Netherlands");
    }
}
