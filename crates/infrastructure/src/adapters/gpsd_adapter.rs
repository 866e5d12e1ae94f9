//! Position adapter - implements `PositionPort` over the gpsd client
//!
//! Normalizes gpsd failures into the closed location-error taxonomy and
//! bridges the watch stream into the engine's position event channel.

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::{PositionEvent, PositionPort};
use async_trait::async_trait;
use domain::events::LocationErrorKind;
use domain::value_objects::{GeoLocation, PositionFix};
use integration_gpsd::{GpsFix, GpsdError, PositionClient, WatchEvent};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

/// Adapter binding the gpsd client to the position port
pub struct GpsdAdapter {
    client: Arc<dyn PositionClient>,
}

impl std::fmt::Debug for GpsdAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpsdAdapter").finish_non_exhaustive()
    }
}

impl GpsdAdapter {
    /// Create an adapter over the given position client
    #[must_use]
    pub fn new(client: Arc<dyn PositionClient>) -> Self {
        Self { client }
    }

    fn map_error(err: &GpsdError) -> ApplicationError {
        match err {
            GpsdError::AccessDenied(_) => ApplicationError::PositionPermissionDenied,
            GpsdError::Timeout { .. } => ApplicationError::PositionTimeout,
            other => ApplicationError::PositionUnavailable(other.to_string()),
        }
    }

    fn map_error_kind(err: &GpsdError) -> LocationErrorKind {
        match err {
            GpsdError::AccessDenied(_) => LocationErrorKind::PermissionDenied,
            GpsdError::Timeout { .. } => LocationErrorKind::Timeout,
            _ => LocationErrorKind::Unavailable,
        }
    }

    fn convert_fix(fix: &GpsFix) -> Result<PositionFix, ApplicationError> {
        let location = GeoLocation::new(fix.latitude, fix.longitude).map_err(|_| {
            ApplicationError::PositionUnavailable(
                "Receiver reported out-of-range coordinates".to_string(),
            )
        })?;
        Ok(PositionFix::new(location, fix.accuracy_m, fix.time))
    }
}

#[async_trait]
impl PositionPort for GpsdAdapter {
    #[instrument(skip(self))]
    async fn current_position(&self) -> Result<PositionFix, ApplicationError> {
        let fix = self
            .client
            .current_fix()
            .await
            .map_err(|err| Self::map_error(&err))?;
        Self::convert_fix(&fix)
    }

    #[instrument(skip(self))]
    async fn start_tracking(
        &self,
    ) -> Result<mpsc::Receiver<PositionEvent>, ApplicationError> {
        let mut watch = self
            .client
            .start_watch()
            .await
            .map_err(|err| Self::map_error(&err))?;

        let (sender, receiver) = mpsc::channel(32);
        tokio::spawn(async move {
            while let Some(event) = watch.recv().await {
                let mapped = match event {
                    WatchEvent::Fix(fix) => match Self::convert_fix(&fix) {
                        Ok(fix) => PositionEvent::Fix(fix),
                        Err(_) => {
                            warn!("Skipping fix with out-of-range coordinates");
                            continue;
                        },
                    },
                    WatchEvent::Degraded(err) => {
                        PositionEvent::Error(Self::map_error_kind(&err))
                    },
                };
                if sender.send(mapped).await.is_err() {
                    debug!("Position event receiver dropped, ending bridge");
                    return;
                }
            }
        });

        Ok(receiver)
    }

    async fn stop_tracking(&self) {
        self.client.stop_watch().await;
    }
}
