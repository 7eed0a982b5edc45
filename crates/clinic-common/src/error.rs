//! Centralized error types for the clinic directory.
//!
//! Uses `thiserror` for ergonomic error definitions and provides HTTP-friendly
//! error variants that can be directly converted to API responses. Every
//! variant renders the same JSON shape, and infrastructure failures never leak
//! their details to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::validation::FieldErrors;

/// Core application error type used across all clinic crates.
#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    // === Auth errors ===
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid token")]
    InvalidToken,

    // === Resource errors ===
    #[error("{resource} not found")]
    NotFound { resource: String },

    // === Validation errors ===
    #[error("{}", .errors.first().unwrap_or("Validation error"))]
    Validation { errors: FieldErrors },

    // === Infrastructure errors ===
    #[error("Storage error: {0}")]
    Storage(anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body sent to clients.
#[derive(Serialize)]
struct ErrorResponse {
    status: u16,
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

impl ClinicError {
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
        }
    }

    /// Map error to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Storage(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error code string for programmatic handling by clients.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ClinicError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = self.error_code();

        // Don't leak internal details to clients
        let message = match &self {
            ClinicError::Storage(e) => {
                tracing::error!(error = ?e, "Storage error");
                "The file storage service could not complete the request".to_string()
            }
            ClinicError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "An internal error occurred".to_string()
            }
            ClinicError::Internal(e) => {
                tracing::error!(error = ?e, "Internal error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let errors = match self {
            ClinicError::Validation { errors } => Some(errors),
            _ => None,
        };

        let body = ErrorResponse {
            status: status.as_u16(),
            error,
            message,
            errors,
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Convenience type alias for Results using ClinicError.
pub type ClinicResult<T> = Result<T, ClinicError>;
