use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use afterschool_lessons::OrderRequest;

use crate::app::{errors, SharedStore};

pub fn router() -> Router {
    Router::new().route("/", get(list_orders).post(place_order))
}

pub async fn place_order(
    Extension(store): Extension<SharedStore>,
    body: Result<Json<OrderRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match store.reserve(request).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_orders(Extension(store): Extension<SharedStore>) -> axum::response::Response {
    match store.list_orders().await {
        Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
