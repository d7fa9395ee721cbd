//! Voce is a self-hosted, server-rendered blog platform.
//!
//! The crate is layered the same way the binary boots it: `domain` holds the
//! entities and invariants, `application` the services over repository traits,
//! `infra` the Postgres, snapshot, and HTTP adapters, and `presentation` the
//! template view models.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
