//! Application configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `WAYPULSE__`-prefixed environment variables (double underscore as the
//! section separator, e.g. `WAYPULSE__GPSD__HOST`).

use std::path::{Path, PathBuf};

use application::services::EngineConfig;
use integration_geocoding::{NominatimConfig, PhotonConfig};
use integration_gpsd::GpsdConfig;
use integration_routing::OsrmConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::retry::RetryPolicy;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The underlying loader failed (missing file, bad TOML, bad env value)
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

/// Geocoding section: backend order plus per-backend settings
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingSettings {
    /// Backends in priority order; first match wins
    #[serde(default = "default_backend_order")]
    pub backend_order: Vec<String>,

    /// Nominatim backend settings
    #[serde(default)]
    pub nominatim: NominatimConfig,

    /// Photon backend settings
    #[serde(default)]
    pub photon: PhotonConfig,
}

fn default_backend_order() -> Vec<String> {
    vec!["nominatim".to_string(), "photon".to_string()]
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            backend_order: default_backend_order(),
            nominatim: NominatimConfig::default(),
            photon: PhotonConfig::default(),
        }
    }
}

/// Persistence section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersistenceSettings {
    /// SQLite database path; `None` keeps snapshots in memory only
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Geocoding backends
    #[serde(default)]
    pub geocoding: GeocodingSettings,

    /// Routing backend
    #[serde(default)]
    pub routing: OsrmConfig,

    /// gpsd connection
    #[serde(default)]
    pub gpsd: GpsdConfig,

    /// Engine thresholds
    #[serde(default)]
    pub engine: EngineConfig,

    /// Retry gate policy shared by the HTTP adapters
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Snapshot persistence
    #[serde(default)]
    pub persistence: PersistenceSettings,
}

impl AppConfig {
    /// Load configuration, optionally merging a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error when the file or environment carry invalid values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("WAYPULSE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.geocoding.backend_order, vec!["nominatim", "photon"]);
        assert_eq!(config.routing.profile, "driving");
        assert_eq!(config.gpsd.port, 2947);
        assert!((config.engine.arrival_threshold_km - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.persistence.db_path.is_none());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = AppConfig::load(None).expect("load");
        assert_eq!(config.gpsd.host, "127.0.0.1");
    }

    #[test]
    fn test_toml_overrides() {
        let toml = r#"
            [geocoding]
            backend_order = ["photon"]

            [geocoding.nominatim]
            country_filter = "nl"

            [routing]
            base_url = "http://localhost:5000"

            [engine]
            arrival_threshold_km = 0.5

            [persistence]
            db_path = "/tmp/waypulse.db"
        "#;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("waypulse.toml");
        std::fs::write(&path, toml).expect("write config");

        let config = AppConfig::load(Some(&path)).expect("load");
        assert_eq!(config.geocoding.backend_order, vec!["photon"]);
        assert_eq!(config.geocoding.nominatim.country_filter, "nl");
        assert_eq!(config.routing.base_url, "http://localhost:5000");
        assert!((config.engine.arrival_threshold_km - 0.5).abs() < f64::EPSILON);
        assert_eq!(
            config.persistence.db_path.as_deref(),
            Some(Path::new("/tmp/waypulse.db"))
        );
        // Untouched sections keep their defaults
        assert_eq!(config.gpsd.port, 2947);
    }

    #[test]
    fn test_invalid_toml_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "engine = \"not a table\"").expect("write config");
        assert!(AppConfig::load(Some(&path)).is_err());
    }
}
