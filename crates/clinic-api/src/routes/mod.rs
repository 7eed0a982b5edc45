//! API route modules.

pub mod companies;
pub mod doctors;
pub mod files;
pub mod health;

use clinic_common::error::{ClinicError, ClinicResult};
use uuid::Uuid;

/// Parse a path id; anything that is not a UUID cannot exist.
fn parse_id(raw: &str, resource: &str) -> ClinicResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ClinicError::not_found(resource))
}
