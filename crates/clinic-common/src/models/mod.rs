//! Core domain models shared across the clinic crates.
//!
//! These are the "truth" types: what the database stores and the API serializes.

pub mod company;
pub mod doctor;
pub mod user;

pub use company::*;
pub use doctor::*;
pub use user::*;
