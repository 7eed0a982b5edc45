//! Repository layer: query functions organized by domain.
//!
//! Reads take the pool directly; deletes that take part in a cascade accept
//! any executor so the caller can run them inside one transaction.

pub mod companies;
pub mod doctors;
pub mod users;

/// Timestamp format stored in the TEXT timestamp columns.
pub(crate) fn now_text() -> String {
    chrono::Utc::now().to_rfc3339()
}
