//! HTTP Routes Module
//!
//! - `POST /webhook`: content-store event receiver
//! - `/health/*`: liveness endpoints
//! - `/metrics`: Prometheus scrape endpoint
//! - `/openapi.json`: generated API description

pub mod health;
pub mod webhook;

use std::any::Any;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

pub use health::create_router as health_router;

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Panics inside a handler become a 500 JSON error instead of a dropped
/// connection.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Handler panicked");
    ApiError::internal_error("Unexpected error while handling request").into_response()
}

/// Build the complete application router.
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    let webhook_routes = Router::new()
        .route(
            "/webhook",
            post(webhook::receive_webhook).fallback(webhook::method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(state);

    Router::new()
        .merge(webhook_routes)
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_json))
        .layer(from_fn(observability_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
}
