//! Position source port
//!
//! Wraps a device location source into a one-shot pull and a continuous
//! push interface. Errors arrive normalized to the closed
//! [`LocationErrorKind`] taxonomy so the engine never sees transport
//! detail.

use async_trait::async_trait;
use domain::events::LocationErrorKind;
use domain::value_objects::PositionFix;
#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;

use crate::error::ApplicationError;

/// One element of the continuous tracking stream
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    /// A new fix
    Fix(PositionFix),
    /// A transient or fatal source failure; the stream continues
    Error(LocationErrorKind),
}

/// Port for device position access
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PositionPort: Send + Sync {
    /// One-shot position request
    ///
    /// Implementations may serve a cached fix within their configured cache
    /// validity window. Fails with the position variants of
    /// [`ApplicationError`].
    async fn current_position(&self) -> Result<PositionFix, ApplicationError>;

    /// Start continuous tracking; fixes and errors arrive on the returned
    /// channel until [`PositionPort::stop_tracking`] is called
    async fn start_tracking(
        &self,
    ) -> Result<mpsc::Receiver<PositionEvent>, ApplicationError>;

    /// Stop continuous tracking; idempotent
    async fn stop_tracking(&self);
}
