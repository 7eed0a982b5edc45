//! User model: staff accounts that belong to a company.
//!
//! The directory never manages users over HTTP; it only needs them for the
//! company cascade and to name the creator of a doctor record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// The `{ id, name }` projection embedded in doctor listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
}
