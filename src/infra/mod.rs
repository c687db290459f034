//! Infrastructure adapters and runtime bootstrap.

pub mod aws;
pub mod error;
pub mod http;
pub mod telemetry;
