//! Identifier generation.
//!
//! Records use UUID v7 ids: globally unique, time-sortable, and generated
//! without coordination between requests or nodes. The same property makes
//! them a good uniqueness token for stored object names.

use uuid::Uuid;

/// Generate a new time-sortable record ID.
pub fn generate_id() -> Uuid {
    Uuid::now_v7()
}

/// A filename-safe uniqueness token: 48 bits of millisecond timestamp
/// followed by 74 random bits, rendered as 32 lowercase hex characters.
pub fn unique_token() -> String {
    Uuid::now_v7().simple().to_string()
}
