//! Token-authorized cache invalidation and recache scheduling for a prerendering service.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
