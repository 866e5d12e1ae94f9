//! Geocoding backend configuration

use serde::{Deserialize, Serialize};

/// Configuration for the Nominatim backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NominatimConfig {
    /// Base URL for the Nominatim API
    #[serde(default = "default_nominatim_base_url")]
    pub base_url: String,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Country code filter (empty to disable)
    #[serde(default)]
    pub country_filter: String,

    /// User agent sent with each request (Nominatim usage policy)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_nominatim_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

const fn default_timeout_secs() -> u64 {
    5
}

fn default_user_agent() -> String {
    "Waypulse/0.3 (https://github.com/waypulse/waypulse)".to_string()
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: default_nominatim_base_url(),
            timeout_secs: default_timeout_secs(),
            country_filter: String::new(),
            user_agent: default_user_agent(),
        }
    }
}

impl NominatimConfig {
    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            ..Default::default()
        }
    }
}

/// Configuration for the Photon backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotonConfig {
    /// Base URL for the Photon API
    #[serde(default = "default_photon_base_url")]
    pub base_url: String,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Preferred result language
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_photon_base_url() -> String {
    "https://photon.komoot.io".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for PhotonConfig {
    fn default() -> Self {
        Self {
            base_url: default_photon_base_url(),
            timeout_secs: default_timeout_secs(),
            language: default_language(),
        }
    }
}

impl PhotonConfig {
    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominatim_defaults() {
        let config = NominatimConfig::default();
        assert_eq!(config.base_url, "https://nominatim.openstreetmap.org");
        assert_eq!(config.timeout_secs, 5);
        assert!(config.country_filter.is_empty());
        assert!(config.user_agent.contains("Waypulse"));
    }

    #[test]
    fn test_photon_defaults() {
        let config = PhotonConfig::default();
        assert_eq!(config.base_url, "https://photon.komoot.io");
        assert_eq!(config.language, "en");
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: NominatimConfig =
            serde_json::from_str(r#"{"country_filter":"nl"}"#).expect("deserialize");
        assert_eq!(config.country_filter, "nl");
        assert_eq!(config.timeout_secs, 5);
    }
}
