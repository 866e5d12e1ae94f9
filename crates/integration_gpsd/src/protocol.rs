//! gpsd wire protocol types
//!
//! gpsd responses are newline-delimited JSON objects discriminated by a
//! `class` field. Only the classes the client acts on are modeled; others
//! are skipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GpsdError;

/// A time-position-velocity report (`class: "TPV"`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TpvReport {
    /// Fix mode: 0/1 no fix, 2 2D, 3 3D
    #[serde(default)]
    pub mode: u8,
    /// Latitude in degrees
    pub lat: Option<f64>,
    /// Longitude in degrees
    pub lon: Option<f64>,
    /// Estimated horizontal position error in meters
    pub eph: Option<f64>,
    /// Speed over ground in m/s
    pub speed: Option<f64>,
    /// Fix timestamp (RFC 3339)
    pub time: Option<String>,
}

impl TpvReport {
    /// Whether the report carries a usable 2D or 3D fix
    #[must_use]
    pub const fn has_fix(&self) -> bool {
        self.mode >= 2 && self.lat.is_some() && self.lon.is_some()
    }
}

/// A normalized position fix extracted from a TPV report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Estimated horizontal accuracy in meters
    pub accuracy_m: Option<f64>,
    /// Speed over ground in m/s, when reported
    pub speed_ms: Option<f64>,
    /// Fix timestamp
    pub time: DateTime<Utc>,
}

impl TryFrom<&TpvReport> for GpsFix {
    type Error = GpsdError;

    fn try_from(report: &TpvReport) -> Result<Self, Self::Error> {
        if !report.has_fix() {
            return Err(GpsdError::NoFix);
        }
        let (Some(latitude), Some(longitude)) = (report.lat, report.lon) else {
            return Err(GpsdError::NoFix);
        };
        let time = report
            .time
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map_or_else(Utc::now, |parsed| parsed.with_timezone(&Utc));
        Ok(Self {
            latitude,
            longitude,
            accuracy_m: report.eph,
            speed_ms: report.speed,
            time,
        })
    }
}
