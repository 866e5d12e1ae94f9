//! Routing port

use async_trait::async_trait;
use domain::value_objects::{GeoLocation, RouteEstimate};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for route estimation between two coordinates
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoutingPort: Send + Sync {
    /// Estimate the route from `origin` to `destination`
    async fn estimate(
        &self,
        origin: &GeoLocation,
        destination: &GeoLocation,
    ) -> Result<RouteEstimate, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn RoutingPort) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn RoutingPort>();
    }
}
