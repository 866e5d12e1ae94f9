//! gpsd error types

use thiserror::Error;

/// Errors that can occur while talking to gpsd
#[derive(Debug, Clone, Error)]
pub enum GpsdError {
    /// TCP connection to gpsd failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The OS denied access to the daemon or device
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The receiver has no fix (TPV mode < 2)
    #[error("No GPS fix available")]
    NoFix,

    /// The request did not complete within its deadline
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout {
        /// The deadline in seconds
        timeout_secs: u64,
    },

    /// gpsd reported a protocol-level error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A report could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl GpsdError {
    /// Map an I/O error to the taxonomy
    #[must_use]
    pub fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::AccessDenied(err.to_string()),
            std::io::ErrorKind::TimedOut => Self::Timeout { timeout_secs: 0 },
            _ => Self::ConnectionFailed(err.to_string()),
        }
    }

    /// Whether the error is permanent for this session
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::AccessDenied(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_permission_denied_maps_to_access_denied() {
        let err = GpsdError::from_io(&io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(matches!(err, GpsdError::AccessDenied(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_refused_maps_to_connection_failed() {
        let err = GpsdError::from_io(&io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(matches!(err, GpsdError::ConnectionFailed(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_display() {
        assert!(GpsdError::NoFix.to_string().contains("No GPS fix"));
        assert!(
            GpsdError::Timeout { timeout_secs: 15 }
                .to_string()
                .contains("15")
        );
    }
}
