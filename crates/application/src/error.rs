//! Application-level errors
//!
//! The closed error taxonomy of the trip tracker. Trip-lifecycle callers
//! match on these variants; transport-level detail stays in the message.

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Blank or otherwise unusable address input
    #[error("Invalid address: address must not be blank")]
    InvalidAddress,

    /// Every geocoding backend was tried and none returned a match
    #[error("Address not found: {address}")]
    AddressNotFound {
        /// The address as given to the resolver
        address: String,
        /// One entry per failed backend, in priority order
        backend_errors: Vec<String>,
    },

    /// A trip is already being tracked
    #[error("A trip is already active; reset it before starting another")]
    AlreadyActive,

    /// No trip to operate on
    #[error("No active trip")]
    NoActiveTrip,

    /// Location access was denied; fatal for this session
    #[error("Location permission denied")]
    PositionPermissionDenied,

    /// The position source cannot produce a fix
    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    /// The position source did not answer in time
    #[error("Position request timed out")]
    PositionTimeout,

    /// The routing backend could not produce a route
    #[error("Route unavailable: {0}")]
    RouteUnavailable(String),

    /// A retry gate is cooling down after exhausting its attempts
    #[error("{service} temporarily unavailable, retry in {retry_in_secs}s")]
    TemporarilyUnavailable {
        /// Which external service is gated
        service: String,
        /// Seconds until the cooldown window expires
        retry_in_secs: u64,
    },

    /// A start or stop-update command is already in flight
    #[error("Another trip operation is in progress")]
    OperationInProgress,

    /// External service error
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Persistence error
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ExternalService(_)
                | Self::PositionTimeout
                | Self::PositionUnavailable(_)
                | Self::RouteUnavailable(_)
        )
    }

    /// Build an `AddressNotFound` from per-backend failures
    pub fn address_not_found(
        address: impl Into<String>,
        backend_errors: Vec<String>,
    ) -> Self {
        Self::AddressNotFound {
            address: address.into(),
            backend_errors,
        }
    }
}
