//! Application services

mod address_resolver;
mod eta;
mod progress;
mod route_estimator;
mod trip_engine;

pub use address_resolver::AddressResolver;
pub use eta::{EtaContext, estimate_eta, format_eta_minutes};
pub use route_estimator::RouteEstimator;
pub use trip_engine::{EngineConfig, EngineStatus, TripProgressEngine};
