//! Application services orchestrating domain rules over the repositories.

pub mod auth;
pub mod blog;
pub mod category;
pub mod error;
pub mod featured;
pub mod repos;
pub mod search;
pub mod snapshot;
