//! Port adapters over the integration clients

mod geocoding_adapter;
mod gpsd_adapter;
mod routing_adapter;

pub use geocoding_adapter::GeocodingAdapter;
pub use gpsd_adapter::GpsdAdapter;
pub use routing_adapter::RoutingAdapter;
