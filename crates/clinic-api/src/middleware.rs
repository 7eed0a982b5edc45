//! Middleware: caller extraction and response hardening.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use clinic_common::{auth, error::ClinicError};
use clinic_db::repository::users;
use uuid::Uuid;

use crate::AppState;

/// The authenticated caller, resolved once per request.
///
/// Handlers receive it explicitly through `Extension<AuthContext>`; nothing
/// downstream looks the caller up on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub company_id: Uuid,
}

/// Extract and validate the JWT from the Authorization: Bearer <token> header,
/// then confirm its user still belongs to the company it names.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ClinicError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ClinicError::Unauthorized)?;

    let claims = auth::validate_token(token, &state.config.auth.jwt_secret)
        .map_err(|_| ClinicError::InvalidToken)?;

    if claims.token_type != "access" {
        return Err(ClinicError::InvalidToken);
    }

    let user_id = claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| ClinicError::InvalidToken)?;
    let company_id = claims
        .company_id
        .parse::<Uuid>()
        .map_err(|_| ClinicError::InvalidToken)?;

    // The token must name a live user of the company it claims.
    let user = users::find_by_id(&state.db.pool, user_id)
        .await?
        .ok_or(ClinicError::InvalidToken)?;
    if user.company_id != company_id {
        tracing::warn!(user_id = %user_id, claimed_company = %company_id, "Token company does not match user");
        return Err(ClinicError::InvalidToken);
    }

    request.extensions_mut().insert(AuthContext {
        user_id,
        company_id,
    });

    Ok(next.run(request).await)
}

const SECURITY_HEADERS: [(&str, &str); 4] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("content-security-policy", "default-src 'none'; frame-ancestors 'none'"),
];

/// Add security headers to every response.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let h = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        h.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    response
}
