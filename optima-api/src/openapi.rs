//! OpenAPI document for the Optima API

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::{health, webhook};
use crate::telemetry::metrics;
use crate::types::{UploadAttributes, WebhookEntity, WebhookEvent, WebhookResponse};

/// OpenAPI document for the Optima API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Optima API",
        version = "0.1.0",
        description = "Webhook-driven image optimization for content-store uploads",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Webhook", description = "Content-store event receiver"),
        (name = "Health", description = "Liveness checks"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        webhook::receive_webhook,
        health::ping,
        health::liveness,
        metrics::metrics_handler,
    ),
    components(schemas(
        WebhookEvent,
        WebhookEntity,
        UploadAttributes,
        WebhookResponse,
        ApiError,
        ErrorCode,
        health::HealthResponse,
        health::HealthStatus,
    ))
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Serialize the document as pretty JSON.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}
