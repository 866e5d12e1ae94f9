//! Nominatim geocoding backend
//!
//! Free-text search against the Nominatim API (jsonv2, best match only).
//! An empty result set means "no match"; server-side errors are surfaced
//! as retryable failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::NominatimConfig;
use crate::error::GeocodingError;
use crate::models::GeocodeResult;
use crate::GeocodingBackend;

/// Nominatim-backed geocoding client
#[derive(Debug)]
pub struct NominatimClient {
    client: Client,
    config: NominatimConfig,
}

impl NominatimClient {
    /// Create a new Nominatim client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &NominatimConfig) -> Result<Self, GeocodingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GeocodingError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl GeocodingBackend for NominatimClient {
    #[instrument(skip(self))]
    async fn lookup(&self, address: &str) -> Result<GeocodeResult, GeocodingError> {
        let url = format!("{}/search", self.config.base_url);
        let mut params = vec![
            ("q", address.to_string()),
            ("format", "jsonv2".to_string()),
            ("limit", "1".to_string()),
        ];
        if !self.config.country_filter.is_empty() {
            params.push(("countrycodes", self.config.country_filter.clone()));
        }

        debug!(%address, "Geocoding via Nominatim");

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
            // Client-side rejections count as "no match, try next backend"
            return Err(GeocodingError::NoMatch(format!(
                "{address} (HTTP {status})"
            )));
        }

        let results: Vec<NominatimResult> = response
            .json()
            .await
            .map_err(|e| GeocodingError::ParseError(e.to_string()))?;

        let result = results
            .first()
            .ok_or_else(|| GeocodingError::NoMatch(address.to_string()))?;

        let latitude: f64 = result
            .lat
            .parse()
            .map_err(|_| GeocodingError::ParseError("Invalid latitude".to_string()))?;
        let longitude: f64 = result
            .lon
            .parse()
            .map_err(|_| GeocodingError::ParseError("Invalid longitude".to_string()))?;

        debug!(%address, %latitude, %longitude, "Geocoded address");

        Ok(GeocodeResult {
            latitude,
            longitude,
            label: result
                .display_name
                .clone()
                .unwrap_or_else(|| address.to_string()),
        })
    }

    fn name(&self) -> &'static str {
        "nominatim"
    }
}

/// Raw Nominatim API response
#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = NominatimClient::new(&NominatimConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_backend_name() {
        let client = NominatimClient::new(&NominatimConfig::default()).unwrap();
        assert_eq!(client.name(), "nominatim");
    }

    #[test]
    fn test_result_parsing() {
        let json = r#"[{"lat": "52.5", "lon": "5.0", "display_name": "Utrecht"}]"#;
        let results: Vec<NominatimResult> = serde_json::from_str(json).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].lat, "52.5");
        assert_eq!(results[0].display_name.as_deref(), Some("Utrecht"));
    }

    #[test]
    fn test_empty_result_parsing() {
        let results: Vec<NominatimResult> = serde_json::from_str("[]").unwrap();
        assert!(results.is_empty());
    }
}
