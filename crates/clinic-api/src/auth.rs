//! Access-token minting.
//!
//! Login and refresh flows belong to the identity service; this crate only
//! mints tokens for operators (`clinic issue-token`) and tests. Validation
//! lives in `clinic_common::auth`.

use chrono::{Duration, Utc};
use clinic_common::auth::Claims;
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

/// Generate a JWT access token for a user of `company_id`.
pub fn generate_access_token(
    user_id: Uuid,
    company_id: Uuid,
    secret: &str,
    ttl_secs: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        company_id: company_id.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_secs as i64)).timestamp(),
        token_type: "access".to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}
