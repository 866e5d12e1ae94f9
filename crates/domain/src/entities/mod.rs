//! Entities for the trip domain

mod trip;
mod trip_snapshot;

pub use trip::{NextStopLeg, Trip, TripStatus};
pub use trip_snapshot::{SNAPSHOT_SCHEMA_VERSION, TripSnapshot};
