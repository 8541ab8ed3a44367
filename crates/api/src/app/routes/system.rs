use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::{errors, SharedStore};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Readiness: the store answers a trivial query.
pub async fn ready(Extension(store): Extension<SharedStore>) -> axum::response::Response {
    match store.ping().await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "ready" }))).into_response(),
        Err(e) => errors::json_error(StatusCode::SERVICE_UNAVAILABLE, e.kind(), e.to_string()),
    }
}
