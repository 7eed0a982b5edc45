//! Static local file serving (lite mode).
//!
//! `GET /files/{*key}`: serves stored images from the local filesystem when
//! running without S3/MinIO. With S3 the backend serves nothing itself, so
//! every request here is a 404.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/files/{*key}", get(serve_file))
}

async fn serve_file(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> Response {
    match state.storage.read_object(&key).await {
        Ok(Some((bytes, content_type))) => (
            [
                (header::CONTENT_TYPE, content_type),
                (
                    header::CACHE_CONTROL,
                    "public, max-age=31536000, immutable".to_string(),
                ),
            ],
            bytes,
        )
            .into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::warn!(key = %key, error = ?e, "Failed to serve local file");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
