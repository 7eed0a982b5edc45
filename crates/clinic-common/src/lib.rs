//! # clinic-common
//!
//! Shared types, configuration, error handling, and validation used across the
//! clinic directory crates. No business logic lives here, only the contracts
//! the API, database, and server layers agree on.

pub mod any_row;
pub mod auth;
pub mod config;
pub mod error;
pub mod ids;
pub mod models;
pub mod validation;
