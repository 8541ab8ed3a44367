use axum::{routing::get, Router};

pub mod images;
pub mod lessons;
pub mod orders;
pub mod system;

/// Router for the booking endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/lessons", lessons::router())
        .route("/search", get(lessons::search_lessons))
        .route("/search/:token", get(lessons::search_lessons_by_path))
        .nest("/orders", orders::router())
}
