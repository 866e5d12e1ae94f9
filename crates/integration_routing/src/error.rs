//! Routing error types

use thiserror::Error;

/// Errors that can occur during route estimation
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Connection to the routing service failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP request to the routing service failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Failed to parse the response
    #[error("Parse error: {0}")]
    ParseError(String),

    /// No route exists between the waypoints
    #[error("No route found ({code})")]
    NoRoute {
        /// The backend's status code (e.g. `NoRoute`, `NoSegment`)
        code: String,
    },

    /// Fewer than two waypoints were given
    #[error("A route needs at least two waypoints, got {0}")]
    TooFewWaypoints(usize),

    /// Service returned a server-side error
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Request timeout
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout {
        /// The timeout duration in seconds
        timeout_secs: u64,
    },
}

impl RoutingError {
    /// Returns true if this error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::RequestFailed(_)
                | Self::ServiceUnavailable(_)
                | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(RoutingError::ConnectionFailed("refused".to_string()).is_retryable());
        assert!(RoutingError::ServiceUnavailable("HTTP 502".to_string()).is_retryable());
        assert!(RoutingError::Timeout { timeout_secs: 10 }.is_retryable());
    }

    #[test]
    fn test_non_retryable_errors() {
        assert!(
            !RoutingError::NoRoute {
                code: "NoRoute".to_string()
            }
            .is_retryable()
        );
        assert!(!RoutingError::TooFewWaypoints(1).is_retryable());
        assert!(!RoutingError::ParseError("bad json".to_string()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = RoutingError::NoRoute {
            code: "NoSegment".to_string(),
        };
        assert!(err.to_string().contains("NoSegment"));

        let err = RoutingError::TooFewWaypoints(1);
        assert!(err.to_string().contains('1'));
    }
}
