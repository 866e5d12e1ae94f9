//! Trip snapshot store port
//!
//! The engine treats persistence as an opaque save/load/clear of one
//! serialized snapshot; saves are fire-and-forget (logged, never retried).

use async_trait::async_trait;
use domain::entities::TripSnapshot;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for trip snapshot persistence
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TripStorePort: Send + Sync {
    /// Persist the snapshot, replacing any previous one
    async fn save(&self, snapshot: &TripSnapshot) -> Result<(), ApplicationError>;

    /// Load the stored snapshot, if any
    async fn load(&self) -> Result<Option<TripSnapshot>, ApplicationError>;

    /// Remove the stored snapshot; idempotent
    async fn clear(&self) -> Result<(), ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn TripStorePort) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn TripStorePort>();
    }
}
