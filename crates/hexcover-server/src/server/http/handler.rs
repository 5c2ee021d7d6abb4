//! Routes and handlers for the indexing HTTP API.
//!
//! The request body of `POST /create-index` is read as raw bytes and decoded
//! here rather than through an extractor, so that every decoding failure (bad
//! syntax, wrong types) is reported uniformly as `400 Invalid JSON format`.

use super::middleware::log_requests;
use crate::server::{error::ServiceError, service::IndexService};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use hexcover::{IndexRequest, IndexResponse};
use tower_http::cors::{Any, CorsLayer};

/// Builds the application router around `service`.
pub fn router(service: IndexService, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/create-index", post(create_index))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(middleware::from_fn(log_requests))
        .with_state(service)
}

async fn create_index(
    State(service): State<IndexService>,
    body: Bytes,
) -> Result<Json<IndexResponse>, ServiceError> {
    let request: IndexRequest = serde_json::from_slice(&body).map_err(|_e| {
        #[cfg(feature = "tracing")]
        tracing::error!("Invalid JSON format for body: {_e}");
        ServiceError::InvalidJson
    })?;

    service.create_index(request).await.map(Json)
}

async fn health(State(service): State<IndexService>) -> (StatusCode, &'static str) {
    if service.is_serving() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "shutting down")
    }
}
