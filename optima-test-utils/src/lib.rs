//! Optima Test Utilities
//!
//! Shared test infrastructure for the Optima workspace:
//! - Scripted mock transport that records every request
//! - Content-store response fixtures and webhook payloads
//! - Proptest generators

pub use optima_core::{
    AssetId, HttpMethod, HttpRequest, HttpResponse, HttpTransport, ImageMetadata, PathToken,
    ReplaceError, ReplaceStep, ReplacementResult, TransportError,
};
pub use optima_store::{AssetReplacer, ContentStoreClient, ReplacementStrategy, StoreConfig};

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

// ============================================================================
// MOCK TRANSPORT
// ============================================================================

/// Scripted outcome for one route.
#[derive(Debug, Clone)]
struct MockRoute {
    method: HttpMethod,
    url_fragment: String,
    outcome: Result<HttpResponse, TransportError>,
}

/// In-memory [`HttpTransport`] for tests.
///
/// Routes match on method plus a URL substring. The most recently added
/// matching route wins, so a test can start from [`MockTransport::happy_path`]
/// and override a single step. Unmatched requests get a 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Vec<MockRoute>,
    calls: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that answers every step of both strategies successfully.
    pub fn happy_path() -> Self {
        Self::new()
            .on(
                HttpMethod::Post,
                "/upload-requests",
                upload_request_response(TEST_PATH_TOKEN, TEST_UPLOAD_URL, &[]),
            )
            .on(
                HttpMethod::Get,
                TEST_SOURCE_URL,
                HttpResponse::new(200, TEST_SOURCE_BYTES.to_vec()),
            )
            .on(HttpMethod::Put, TEST_UPLOAD_URL, HttpResponse::new(200, Vec::new()))
            .on(HttpMethod::Put, "/uploads/", upload_response(TEST_ASSET_ID))
            .on(HttpMethod::Post, "/uploads", upload_response(TEST_NEW_ASSET_ID))
            .on(HttpMethod::Delete, "/uploads/", HttpResponse::new(204, Vec::new()))
    }

    /// Answer matching requests with `response`.
    pub fn on(mut self, method: HttpMethod, url_fragment: &str, response: HttpResponse) -> Self {
        self.routes.push(MockRoute {
            method,
            url_fragment: url_fragment.to_string(),
            outcome: Ok(response),
        });
        self
    }

    /// Answer matching requests with a bare status and text body.
    pub fn on_status(self, method: HttpMethod, url_fragment: &str, status: u16, body: &str) -> Self {
        self.on(method, url_fragment, HttpResponse::new(status, body.as_bytes().to_vec()))
    }

    /// Fail matching requests before any response is produced.
    pub fn on_error(mut self, method: HttpMethod, url_fragment: &str, error: TransportError) -> Self {
        self.routes.push(MockRoute {
            method,
            url_fragment: url_fragment.to_string(),
            outcome: Err(error),
        });
        self
    }

    /// Every request sent so far, in order.
    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Requests sent with `method` to a URL containing `url_fragment`.
    pub fn requests_to(&self, method: HttpMethod, url_fragment: &str) -> Vec<HttpRequest> {
        self.calls()
            .into_iter()
            .filter(|request| request.method == method && request.url.contains(url_fragment))
            .collect()
    }

    pub fn calls_to(&self, method: HttpMethod, url_fragment: &str) -> usize {
        self.requests_to(method, url_fragment).len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let outcome = self
            .routes
            .iter()
            .rev()
            .find(|route| route.method == request.method && request.url.contains(&route.url_fragment))
            .map(|route| route.outcome.clone())
            .unwrap_or_else(|| Ok(HttpResponse::new(404, b"no route".to_vec())));

        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        outcome
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub const TEST_BASE_URL: &str = "http://store.test";
pub const TEST_API_TOKEN: &str = "test-api-token";
pub const TEST_ASSET_ID: &str = "asset-123";
pub const TEST_NEW_ASSET_ID: &str = "asset-456";
pub const TEST_PATH_TOKEN: &str = "/8421/1700000000-optimized-image.jpg";
pub const TEST_UPLOAD_URL: &str = "https://bucket.test/staging/1700000000-optimized-image.jpg";
pub const TEST_SOURCE_URL: &str = "https://cdn.test/8421/photo.jpg?auto=format,compress&q=75";
pub const TEST_SOURCE_BYTES: &[u8] = b"optimized image bytes";

/// Store config pointing at the mock host.
pub fn test_store_config() -> StoreConfig {
    StoreConfig::new(TEST_API_TOKEN).with_base_url(TEST_BASE_URL)
}

/// Client wired to `transport`.
pub fn test_client(transport: Arc<MockTransport>) -> Arc<ContentStoreClient> {
    Arc::new(ContentStoreClient::with_transport(test_store_config(), transport))
}

/// Replacer wired to `transport` with the given strategy.
pub fn test_replacer(transport: Arc<MockTransport>, strategy: ReplacementStrategy) -> AssetReplacer {
    AssetReplacer::new(test_client(transport), strategy)
}

pub fn json_response(status: u16, value: &serde_json::Value) -> HttpResponse {
    HttpResponse::new(status, value.to_string().into_bytes())
}

/// `POST /upload-requests` success body.
pub fn upload_request_response(
    path: &str,
    upload_url: &str,
    request_headers: &[(&str, &str)],
) -> HttpResponse {
    let headers: serde_json::Map<String, serde_json::Value> = request_headers
        .iter()
        .map(|(name, value)| (name.to_string(), serde_json::Value::from(*value)))
        .collect();

    json_response(
        200,
        &serde_json::json!({
            "data": {
                "id": path,
                "type": "upload_request",
                "attributes": {
                    "url": upload_url,
                    "request_headers": headers,
                }
            }
        }),
    )
}

/// `PUT /uploads/{id}` or `POST /uploads` success body.
pub fn upload_response(id: &str) -> HttpResponse {
    json_response(
        200,
        &serde_json::json!({
            "data": {
                "id": id,
                "type": "upload",
                "attributes": {
                    "path": TEST_PATH_TOKEN,
                    "size": TEST_SOURCE_BYTES.len(),
                    "is_image": true,
                }
            }
        }),
    )
}

/// Webhook body for an upload event.
pub fn webhook_payload(
    asset_id: &str,
    url: &str,
    size: u64,
    width: u64,
    height: u64,
    is_image: bool,
) -> serde_json::Value {
    serde_json::json!({
        "entity_type": "upload",
        "event_type": "create",
        "entity": {
            "id": asset_id,
            "type": "upload",
            "attributes": {
                "size": size,
                "width": width,
                "height": height,
                "url": url,
                "is_image": is_image,
                "filename": "photo.jpg",
            }
        }
    })
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_asset_id() -> impl Strategy<Value = AssetId> {
        "[0-9]{1,10}".prop_map(AssetId::new)
    }

    pub fn arb_path_token() -> impl Strategy<Value = PathToken> {
        ("[0-9]{1,6}", "[a-z0-9-]{1,24}").prop_map(|(site, name)| PathToken::new(format!("/{}/{}.jpg", site, name)))
    }

    pub fn arb_filename() -> impl Strategy<Value = String> {
        "[a-z0-9_-]{1,24}\\.(jpg|png|webp)"
    }

    /// Image metadata spanning all three tiers.
    pub fn arb_image_metadata() -> impl Strategy<Value = ImageMetadata> {
        (
            "https://[a-z]{1,10}\\.test/[a-z0-9]{1,12}\\.jpg",
            0u64..10_000,
            0u64..10_000,
            0u64..(32 * 1024 * 1024),
        )
            .prop_map(|(url, width, height, size)| ImageMetadata::new(url, width, height, size))
    }

    pub fn arb_replacement_strategy() -> impl Strategy<Value = ReplacementStrategy> {
        prop_oneof![
            Just(ReplacementStrategy::ReplaceInPlace),
            Just(ReplacementStrategy::CreateAndDelete),
        ]
    }
}
