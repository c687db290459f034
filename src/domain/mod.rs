//! Domain layer types and invariants.

pub mod allow_list;
pub mod jobs;
pub mod urls;
