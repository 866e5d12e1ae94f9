//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these
//! ports.

mod geocoding_port;
mod position_port;
mod routing_port;
mod trip_store;

#[cfg(test)]
pub use geocoding_port::MockGeocodingPort;
pub use geocoding_port::GeocodingPort;
#[cfg(test)]
pub use position_port::MockPositionPort;
pub use position_port::{PositionEvent, PositionPort};
#[cfg(test)]
pub use routing_port::MockRoutingPort;
pub use routing_port::RoutingPort;
#[cfg(test)]
pub use trip_store::MockTripStorePort;
pub use trip_store::TripStorePort;
