use axum::http::StatusCode;
use serde::Deserialize;

use afterschool_core::LessonId;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// `GET /search?q=...`
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default, alias = "query")]
    pub q: String,
}

// -------------------------
// Extraction helpers
// -------------------------

pub fn parse_lesson_id(raw: &str) -> Result<LessonId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid lesson id"))
}
