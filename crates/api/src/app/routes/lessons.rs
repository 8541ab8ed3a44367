use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use afterschool_lessons::{LessonPatch, LessonSearch};

use crate::app::{dto, errors, SharedStore};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_lessons))
        .route("/:id", get(get_lesson).put(update_lesson))
}

pub async fn list_lessons(Extension(store): Extension<SharedStore>) -> axum::response::Response {
    match store.list_lessons().await {
        Ok(lessons) => (StatusCode::OK, Json(lessons)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_lesson(
    Extension(store): Extension<SharedStore>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_lesson_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.get_lesson(id).await {
        Ok(lesson) => (StatusCode::OK, Json(lesson)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_lesson(
    Extension(store): Extension<SharedStore>,
    Path(id): Path<String>,
    body: Result<Json<LessonPatch>, JsonRejection>,
) -> axum::response::Response {
    let id = match dto::parse_lesson_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(patch) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match store.update_lesson(id, patch).await {
        Ok(lesson) => {
            tracing::info!(lesson_id = %lesson.id, "lesson updated");
            (StatusCode::OK, Json(lesson)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn search_lessons(
    Extension(store): Extension<SharedStore>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    run_search(store, &query.q).await
}

pub async fn search_lessons_by_path(
    Extension(store): Extension<SharedStore>,
    Path(token): Path<String>,
) -> axum::response::Response {
    run_search(store, &token).await
}

async fn run_search(store: SharedStore, token: &str) -> axum::response::Response {
    match store.search_lessons(&LessonSearch::new(token)).await {
        Ok(lessons) => (StatusCode::OK, Json(lessons)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
