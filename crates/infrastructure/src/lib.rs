//! Infrastructure layer for Waypulse
//!
//! Adapters that implement the application ports over the integration
//! clients, the retry gate shared by all outbound HTTP adapters, snapshot
//! persistence, and configuration loading.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod retry;

pub use adapters::{GeocodingAdapter, GpsdAdapter, RoutingAdapter};
pub use config::AppConfig;
pub use persistence::{InMemoryTripStore, SqliteTripStore};
pub use retry::{GateError, Retryable, RetryGate, RetryPolicy};
