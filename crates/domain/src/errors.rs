//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Coordinates outside the valid range
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    /// Address input rejected before any backend was consulted
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl DomainError {
    /// Create an invalid-address error
    pub fn invalid_address(reason: impl Into<String>) -> Self {
        Self::InvalidAddress(reason.into())
    }
}

impl From<crate::value_objects::InvalidCoordinates> for DomainError {
    fn from(err: crate::value_objects::InvalidCoordinates) -> Self {
        Self::InvalidCoordinates(err.to_string())
    }
}
