//! Application layer - Trip tracking use cases and orchestration
//!
//! Contains the trip progress engine, address/route resolution services,
//! and the port definitions the infrastructure adapters implement.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
