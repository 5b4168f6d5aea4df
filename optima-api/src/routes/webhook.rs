//! Webhook receiver
//!
//! `POST /webhook` accepts content-store events. The body is read as raw
//! bytes and parsed here so a malformed payload produces a JSON response
//! in the same shape as every other webhook reply.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use crate::telemetry::METRICS;
use crate::types::{WebhookEvent, WebhookResponse};

/// Outcome label for payloads that could not be processed.
const REJECTED_OUTCOME: &str = "rejected";

/// POST /webhook - Process a content-store event
#[utoipa::path(
    post,
    path = "/webhook",
    tag = "Webhook",
    request_body = WebhookEvent,
    responses(
        (status = 200, description = "Event processed; replacement failures are reported in the body", body = WebhookResponse),
        (status = 405, description = "Method other than POST", body = ApiError),
        (status = 500, description = "Payload could not be processed", body = WebhookResponse),
    ),
)]
pub async fn receive_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    let delivery_id = Uuid::now_v7();
    let span = info_span!("webhook_delivery", delivery_id = %delivery_id, body_bytes = body.len());

    async move {
        let result = match serde_json::from_slice::<WebhookEvent>(&body) {
            Ok(event) => state.service.process(&event).await,
            Err(e) => Err(ApiError::from(e)),
        };

        match result {
            Ok(response) => (StatusCode::OK, Json(response)).into_response(),
            Err(e) => {
                tracing::warn!(code = ?e.code, error = %e.message, "Rejected webhook payload");
                if let Ok(metrics) = METRICS.as_ref() {
                    metrics.record_webhook_event(REJECTED_OUTCOME);
                }
                let response = WebhookResponse::rejected("Invalid webhook payload", e.message);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
            }
        }
    }
    .instrument(span)
    .await
}

/// Any method other than POST on `/webhook`.
pub async fn method_not_allowed(method: Method) -> impl IntoResponse {
    tracing::debug!(method = %method, "Rejected non-POST webhook request");
    ([(header::ALLOW, "POST")], ApiError::method_not_allowed(method))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::WebhookOutcome;

    #[test]
    fn test_rejected_label_differs_from_outcomes() {
        for outcome in [
            WebhookOutcome::Ignored,
            WebhookOutcome::Optimized,
            WebhookOutcome::ReplacementSkipped,
            WebhookOutcome::Replaced,
            WebhookOutcome::ReplacementFailed,
        ] {
            assert_ne!(outcome.as_str(), REJECTED_OUTCOME);
        }
    }
}
