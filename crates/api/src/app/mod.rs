//! HTTP API application wiring (Axum router + store injection).
//!
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and extractor helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::get,
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use afterschool_infra::InventoryStore;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Store handle shared by every handler.
pub type SharedStore = Arc<dyn InventoryStore>;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(store: SharedStore, config: &AppConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/ready", get(routes::system::ready))
        .merge(routes::router())
        .nest_service("/images", routes::images::service(&config.images_dir))
        .layer(Extension(store))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::log_requests))
                .layer(cors),
        )
}
