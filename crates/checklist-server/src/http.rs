//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::de::IgnoredAny;

use checklist_core::{StoreError, EMPTY_DOCUMENT};

use crate::AppState;

const JSON_CONTENT_TYPE: [(header::HeaderName, &str); 1] =
    [(header::CONTENT_TYPE, "application/json")];

const SUCCESS_BODY: &str = r#"{"success": true}"#;
const INVALID_JSON_BODY: &str = r#"{"error": "Invalid JSON"}"#;
const WRITE_FAILED_BODY: &str = r#"{"error": "Failed to write data"}"#;

/// Errors surfaced by the data endpoints
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidJson(e) => {
                tracing::debug!("Rejected write: {}", e);
                (StatusCode::BAD_REQUEST, JSON_CONTENT_TYPE, INVALID_JSON_BODY).into_response()
            }
            ApiError::Store(_) | ApiError::Task(_) => {
                tracing::error!("Write failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    JSON_CONTENT_TYPE,
                    WRITE_FAILED_BODY,
                )
                    .into_response()
            }
        }
    }
}

/// Return the stored document verbatim
pub async fn get_data(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    if uri.query().is_some() {
        return not_found().await;
    }

    let store = Arc::clone(&state.store);
    let bytes = tokio::task::spawn_blocking(move || store.read_or_empty())
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Read task failed: {}, serving empty document", e);
            EMPTY_DOCUMENT.to_vec()
        });

    (StatusCode::OK, JSON_CONTENT_TYPE, bytes).into_response()
}

/// Validate the body as JSON and replace the stored document with it.
///
/// The parsed value is thrown away; the raw bytes are what get stored.
pub async fn post_data(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    body: Bytes,
) -> Result<Response, ApiError> {
    if uri.query().is_some() {
        return Ok(not_found().await);
    }

    serde_json::from_slice::<IgnoredAny>(&body)?;

    let store = Arc::clone(&state.store);
    let len = body.len();
    tokio::task::spawn_blocking(move || store.write(&body)).await??;
    tracing::info!("Stored document ({} bytes)", len);

    Ok((StatusCode::OK, JSON_CONTENT_TYPE, SUCCESS_BODY).into_response())
}

/// Anything that isn't exactly GET/POST /data, including HEAD and any
/// request carrying a query string
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}
