//! Trip snapshot persistence

mod trip_store;

pub use trip_store::{InMemoryTripStore, SqliteTripStore, TRIP_NAMESPACE};
