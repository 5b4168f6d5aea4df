//! Webhook event processing
//!
//! Decides what to do with one webhook event: ignore it, derive a delivery
//! URL, and, for oversized images, write the optimized bytes back to the
//! content store. Replacement errors are logged and reported in the
//! response body; they never fail the delivery.

use optima_core::derive_delivery_url;
use optima_store::AssetReplacer;
use std::sync::Arc;
use std::time::Instant;

use crate::error::ApiResult;
use crate::telemetry::METRICS;
use crate::types::{WebhookEvent, WebhookResponse};

/// How one webhook event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Not an image upload, or no URL to work with.
    Ignored,
    /// Delivery URL derived; no replacement needed.
    Optimized,
    /// Over threshold but replacement is disabled.
    ReplacementSkipped,
    Replaced,
    ReplacementFailed,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Ignored => "ignored",
            WebhookOutcome::Optimized => "optimized",
            WebhookOutcome::ReplacementSkipped => "replacement_skipped",
            WebhookOutcome::Replaced => "replaced",
            WebhookOutcome::ReplacementFailed => "replacement_failed",
        }
    }
}

/// Processes webhook events. Shared by every request.
#[derive(Debug, Clone, Default)]
pub struct OptimizationService {
    replacer: Option<Arc<AssetReplacer>>,
}

impl OptimizationService {
    pub fn new(replacer: Option<Arc<AssetReplacer>>) -> Self {
        Self { replacer }
    }

    /// A service that derives URLs but never writes to the content store.
    pub fn without_replacement() -> Self {
        Self { replacer: None }
    }

    pub fn replacement_enabled(&self) -> bool {
        self.replacer.is_some()
    }

    /// Handle one event.
    ///
    /// Every well-formed event produces a `received: true` response,
    /// whatever happens to the replacement. Only an image upload whose
    /// attributes or id do not fit the upload schema is an error.
    pub async fn process(&self, event: &WebhookEvent) -> ApiResult<WebhookResponse> {
        let (outcome, response) = self.handle(event).await?;

        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_webhook_event(outcome.as_str());
        }
        tracing::info!(
            entity_type = %event.entity_type,
            event_type = %event.event_type,
            outcome = outcome.as_str(),
            "Webhook event processed"
        );

        Ok(response)
    }

    async fn handle(&self, event: &WebhookEvent) -> ApiResult<(WebhookOutcome, WebhookResponse)> {
        let Some(upload) = event.image_upload()? else {
            return Ok((
                WebhookOutcome::Ignored,
                WebhookResponse::received("Event ignored: not an image upload"),
            ));
        };

        let Some(image) = upload.image_metadata() else {
            tracing::warn!(asset_id = %upload.asset_id, "Image upload event has no URL");
            return Ok((
                WebhookOutcome::Ignored,
                WebhookResponse::received("Event ignored: upload has no URL"),
            ));
        };

        let tier = image.tier();
        let optimized_url = derive_delivery_url(&image);
        tracing::debug!(
            asset_id = %upload.asset_id,
            size_bytes = image.size_bytes,
            width = image.width,
            tier = tier.as_str(),
            optimized_url = %optimized_url,
            "Derived delivery URL"
        );

        if !tier.requires_replacement() {
            return Ok((
                WebhookOutcome::Optimized,
                WebhookResponse::received("Image optimized").with_optimized_url(optimized_url),
            ));
        }

        let Some(replacer) = &self.replacer else {
            return Ok((
                WebhookOutcome::ReplacementSkipped,
                WebhookResponse::received("Image optimized; asset replacement is disabled")
                    .with_optimized_url(optimized_url),
            ));
        };

        let asset_id = &upload.asset_id;
        let start = Instant::now();
        let result = replacer
            .replace(asset_id, &optimized_url, upload.filename())
            .await;
        let elapsed = start.elapsed().as_secs_f64();

        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_replacement(
                replacer.strategy().as_str(),
                result.as_ref().err().map(|e| e.step().as_str()),
                elapsed,
            );
        }

        let handled = match result {
            Ok(_) => (
                WebhookOutcome::Replaced,
                WebhookResponse::received("Image optimized and asset replaced")
                    .with_optimized_url(optimized_url)
                    .with_replacement(true, None),
            ),
            Err(e) => {
                tracing::error!(
                    asset_id = %asset_id,
                    step = %e.step(),
                    error = %e,
                    "Asset replacement failed; reporting in response body"
                );
                (
                    WebhookOutcome::ReplacementFailed,
                    WebhookResponse::received("Image optimized; asset replacement failed")
                        .with_optimized_url(optimized_url)
                        .with_replacement(false, Some(e.to_string())),
                )
            }
        };
        Ok(handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optima_core::{HttpMethod, LARGE_IMAGE_THRESHOLD};
    use optima_store::ReplacementStrategy;
    use optima_test_utils::{test_replacer, webhook_payload, MockTransport, TEST_SOURCE_URL};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn event(value: serde_json::Value) -> Result<WebhookEvent, serde_json::Error> {
        serde_json::from_value(value)
    }

    fn service_with(mock: &Arc<MockTransport>) -> OptimizationService {
        OptimizationService::new(Some(Arc::new(test_replacer(
            Arc::clone(mock),
            ReplacementStrategy::ReplaceInPlace,
        ))))
    }

    #[tokio::test]
    async fn test_small_image_is_optimized_without_replacement() -> TestResult {
        let mock = Arc::new(MockTransport::happy_path());
        let service = service_with(&mock);

        let response = service
            .process(&event(webhook_payload("1", "https://x/img.jpg?v=2", 1_000_000, 800, 600, true))?)
            .await?;

        assert!(response.received);
        assert_eq!(
            response.optimized_url.as_deref(),
            Some("https://x/img.jpg?v=2&auto=format,compress&q=85")
        );
        assert_eq!(response.asset_replaced, None);
        assert_eq!(mock.call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_size_at_threshold_does_not_replace() -> TestResult {
        let mock = Arc::new(MockTransport::happy_path());
        let service = service_with(&mock);

        let response = service
            .process(&event(webhook_payload("1", "https://x/img.jpg", LARGE_IMAGE_THRESHOLD, 3000, 2000, true))?)
            .await?;

        assert_eq!(response.asset_replaced, None);
        assert_eq!(mock.call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_huge_image_is_replaced_with_derived_url() -> TestResult {
        let mock = Arc::new(
            MockTransport::happy_path().on(
                HttpMethod::Get,
                "https://x/img.jpg",
                optima_core::HttpResponse::new(200, b"smaller".to_vec()),
            ),
        );
        let service = service_with(&mock);

        let response = service
            .process(&event(webhook_payload("42", "https://x/img.jpg", 11_000_000, 3000, 1000, true))?)
            .await?;

        let expected = "https://x/img.jpg?auto=format,compress&q=75&w=2000&dpr=2";
        assert_eq!(response.optimized_url.as_deref(), Some(expected));
        assert_eq!(response.asset_replaced, Some(true));
        assert_eq!(response.error, None);

        let fetches = mock.requests_to(HttpMethod::Get, "https://x/img.jpg");
        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].url, expected);
        assert_eq!(mock.calls_to(HttpMethod::Put, "/uploads/42"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_replacement_failure_is_reported_in_body() -> TestResult {
        let mock = Arc::new(MockTransport::happy_path().on_status(
            HttpMethod::Post,
            "/upload-requests",
            500,
            "store down",
        ));
        let service = service_with(&mock);

        let response = service
            .process(&event(webhook_payload("42", TEST_SOURCE_URL, 6_000_000, 1000, 800, true))?)
            .await?;

        assert!(response.received);
        assert_eq!(response.asset_replaced, Some(false));
        let error = response.error.unwrap_or_default();
        assert!(error.contains("Upload request failed"));
        assert!(error.contains("store down"));
        assert_eq!(mock.call_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_replacement_disabled_skips_store() -> TestResult {
        let service = OptimizationService::without_replacement();
        assert!(!service.replacement_enabled());

        let response = service
            .process(&event(webhook_payload("42", "https://x/img.jpg", 6_000_000, 1000, 800, true))?)
            .await?;

        assert_eq!(
            response.optimized_url.as_deref(),
            Some("https://x/img.jpg?auto=format,compress&q=75")
        );
        assert_eq!(response.asset_replaced, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_image_events_are_ignored() -> TestResult {
        let mock = Arc::new(MockTransport::happy_path());
        let service = service_with(&mock);

        let not_image = webhook_payload("1", "https://x/doc.pdf", 20_000_000, 0, 0, false);
        let response = service.process(&event(not_image)?).await?;
        assert!(response.received);
        assert_eq!(response.optimized_url, None);

        let mut item = webhook_payload("1", "https://x/img.jpg", 20_000_000, 3000, 3000, true);
        item["entity_type"] = serde_json::json!("item");
        let response = service.process(&event(item)?).await?;
        assert_eq!(response.optimized_url, None);

        assert_eq!(mock.call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_url_is_ignored() -> TestResult {
        let service = OptimizationService::without_replacement();
        let mut payload = webhook_payload("1", "", 20_000_000, 3000, 3000, true);
        payload["entity"]["attributes"]["url"] = serde_json::Value::Null;

        let response = service.process(&event(payload)?).await?;
        assert!(response.received);
        assert_eq!(response.optimized_url, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_record_event_with_upload_like_fields_is_ignored() -> TestResult {
        let mock = Arc::new(MockTransport::happy_path());
        let service = service_with(&mock);
        let record = serde_json::json!({
            "entity_type": "item",
            "event_type": "update",
            "entity": { "id": "42", "type": "item", "attributes": { "size": "XL", "url": "https://shop/x" } }
        });

        let response = service.process(&event(record)?).await?;

        assert!(response.received);
        assert_eq!(response.optimized_url, None);
        assert_eq!(mock.call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unsafe_upload_id_is_an_error_without_store_calls() -> TestResult {
        let mock = Arc::new(MockTransport::happy_path());
        let service = service_with(&mock);
        let payload = webhook_payload("42?force=1", TEST_SOURCE_URL, 6_000_000, 1000, 800, true);

        let result = service.process(&event(payload)?).await;

        assert!(result.is_err());
        assert_eq!(mock.call_count(), 0);
        Ok(())
    }
}
