use std::path::Path;

use axum::{handler::HandlerWithoutStateExt, http::StatusCode, Router};
use tower_http::services::ServeDir;

use crate::app::errors;

/// Static lesson images. Missing files get a JSON 404 instead of an empty body.
pub fn service(dir: &Path) -> Router {
    Router::new().fallback_service(ServeDir::new(dir).not_found_service(not_found.into_service()))
}

async fn not_found() -> axum::response::Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "Image file does not exist")
}
