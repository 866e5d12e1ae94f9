//! Value objects for the trip domain

mod geo_location;
mod geocoded_place;
mod position_fix;
mod route_estimate;
mod speed_sample;

pub use geo_location::{GeoLocation, InvalidCoordinates};
pub use geocoded_place::{GeocodedPlace, GeocodingSource};
pub use position_fix::PositionFix;
pub use route_estimate::{RoadType, RoadTypeHistogram, RouteEstimate};
pub use speed_sample::{SpeedHistory, SpeedSample};
