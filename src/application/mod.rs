//! Application services: the recache pipeline and the ports it drives.

pub mod allow_list;
pub mod authorizer;
pub mod error;
pub mod invalidator;
pub mod ports;
pub mod recache;
pub mod scheduler;
