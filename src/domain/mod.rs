//! Domain layer types and invariants.

pub mod entities;
pub mod error;
pub mod featured;
pub mod posts;
pub mod stats;
pub mod types;
pub mod users;
