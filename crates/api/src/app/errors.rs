use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use afterschool_infra::StoreError;

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    let code = err.kind();
    let message = err.to_string();
    match err {
        StoreError::InvalidInput(_) => json_error(StatusCode::BAD_REQUEST, code, message),
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, code, message),
        StoreError::InsufficientSeats(shortfalls) => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": code,
                "message": message,
                "shortfalls": shortfalls,
            })),
        )
            .into_response(),
        StoreError::StorageFault(_) => {
            tracing::error!(error = %message, "storage fault");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, code, message)
        }
    }
}

/// Malformed or missing JSON bodies are invalid input, not framework errors.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_input", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
