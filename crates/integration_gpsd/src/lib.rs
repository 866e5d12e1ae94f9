//! gpsd position source for Waypulse
//!
//! Talks the [gpsd](https://gpsd.gitlab.io/gpsd/) JSON protocol over TCP:
//! a one-shot `?POLL;` mode with a short-lived fix cache, and a continuous
//! `?WATCH` stream of TPV reports. Transport and protocol failures are
//! normalized into the small [`GpsdError`] taxonomy; the watch stream
//! survives transient errors by reconnecting.

mod client;
mod config;
mod error;
mod protocol;

pub use client::{GpsdClient, PositionClient, WatchEvent};
pub use config::GpsdConfig;
pub use error::GpsdError;
pub use protocol::{GpsFix, TpvReport};
