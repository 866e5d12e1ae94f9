//! Geocoded place value object

use serde::{Deserialize, Serialize};

use super::GeoLocation;

/// The geocoding backend that produced a place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocodingSource {
    /// Nominatim (OpenStreetMap)
    Nominatim,
    /// Photon (Komoot)
    Photon,
}

impl GeocodingSource {
    /// Get a human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Nominatim => "Nominatim",
            Self::Photon => "Photon",
        }
    }
}

impl std::fmt::Display for GeocodingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A resolved address: coordinate plus the canonical label the backend returned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedPlace {
    /// Resolved coordinate
    pub location: GeoLocation,
    /// Human-readable display name
    pub label: String,
    /// Which backend resolved it
    pub source: GeocodingSource,
}

impl GeocodedPlace {
    /// Create a new geocoded place
    #[must_use]
    pub fn new(
        location: GeoLocation,
        label: impl Into<String>,
        source: GeocodingSource,
    ) -> Self {
        Self {
            location,
            label: label.into(),
            source,
        }
    }
}

impl std::fmt::Display for GeocodedPlace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label, self.location)
    }
}
