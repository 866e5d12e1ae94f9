//! Shared geocoding result model

use serde::{Deserialize, Serialize};

/// A single best-match geocoding result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Human-readable display name
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let result = GeocodeResult {
            latitude: 52.5,
            longitude: 5.0,
            label: "Utrecht".to_string(),
        };
        let json = serde_json::to_string(&result).expect("serialize");
        let back: GeocodeResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, result);
    }
}
