//! Content-store API client
//!
//! One method per remote call of the replacement protocol. Each method maps
//! transport failures and non-2xx statuses to the [`ReplaceError`] of the
//! step it serves, so strategies only sequence calls.

use crate::config::StoreConfig;
use crate::http::ReqwestTransport;
use crate::types::{
    ApiErrorDocument, Document, NewUpload, NewUploadRequest, UploadPathUpdate,
    UploadRequestResource, UploadResource,
};
use optima_core::{
    AssetId, ConfigError, HttpMethod, HttpRequest, HttpResponse, HttpTransport, PathToken,
    ReplaceError, ReplaceStep, ReplacementResult, UploadRequest,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::sync::Arc;

/// Longest upstream body kept in an error message.
const MAX_ERROR_DETAIL_CHARS: usize = 2048;

/// Authenticated client for the content-store API.
///
/// Built once at startup and shared behind an `Arc`. Immutable after
/// construction.
pub struct ContentStoreClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    api_token: SecretString,
    api_version: String,
    environment: Option<String>,
}

impl ContentStoreClient {
    /// Build a client backed by a pooled reqwest transport.
    pub fn from_config(config: StoreConfig) -> Result<Self, ConfigError> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Build a client over an arbitrary transport.
    pub fn with_transport(config: StoreConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            base_url: config.base_url,
            api_token: config.api_token,
            api_version: config.api_version,
            environment: config.environment,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `uploads/{id}`, refusing ids that would escape the path segment.
    fn upload_path(step: ReplaceStep, asset_id: &AssetId) -> Result<String, ReplaceError> {
        ensure_path_safe(step, asset_id)?;
        Ok(format!("uploads/{}", asset_id))
    }

    /// Request against the content-store host, carrying auth and version headers.
    fn api_request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        let request = HttpRequest::new(method, self.endpoint(path))
            .with_header(
                "Authorization",
                format!("Bearer {}", self.api_token.expose_secret()),
            )
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "application/json")
            .with_header("X-Api-Version", self.api_version.as_str());

        match &self.environment {
            Some(environment) => request.with_header("X-Environment", environment.as_str()),
            None => request,
        }
    }

    fn api_json_request<T: Serialize>(
        &self,
        step: ReplaceStep,
        method: HttpMethod,
        path: &str,
        body: &T,
    ) -> Result<HttpRequest, ReplaceError> {
        self.api_request(method, path)
            .with_json(body)
            .map_err(|e| step.failure(None, e.to_string()))
    }

    /// Send a request, turning anything but a 2xx response into `step`'s error.
    async fn execute(
        &self,
        step: ReplaceStep,
        request: HttpRequest,
    ) -> Result<HttpResponse, ReplaceError> {
        let method = request.method;
        let url = request.url.clone();

        let response = self.transport.send(request).await.map_err(|e| {
            tracing::warn!(step = %step, method = %method, url = %url, error = %e, "Content store request failed");
            step.failure(None, e.to_string())
        })?;

        if !response.is_success() {
            tracing::warn!(
                step = %step,
                method = %method,
                url = %url,
                status = response.status,
                "Content store returned non-success status"
            );
            let detail = match step {
                ReplaceStep::SourceFetch => status_reason(response.status),
                _ => store_error_detail(response.text()),
            };
            return Err(step.failure(Some(response.status), detail));
        }

        tracing::debug!(step = %step, method = %method, url = %url, status = response.status, "Content store request succeeded");
        Ok(response)
    }

    /// Step 1: obtain a single-use staging ticket.
    pub async fn create_upload_request(&self, filename: &str) -> Result<UploadRequest, ReplaceError> {
        let step = ReplaceStep::StageRequest;
        let body = Document::new(NewUploadRequest::new(filename));
        let request = self.api_json_request(step, HttpMethod::Post, "upload-requests", &body)?;

        let response = self.execute(step, request).await?;
        let document: Document<UploadRequestResource> = response
            .json()
            .map_err(|e| step.failure(None, format!("Failed to parse upload request: {}", e)))?;

        let resource = document.data;
        Ok(UploadRequest {
            id: PathToken::new(resource.id),
            upload_url: resource.attributes.url,
            upload_headers: resource.attributes.request_headers,
        })
    }

    /// Step 2: download the full optimized payload.
    pub async fn fetch_source(&self, url: &str) -> Result<Vec<u8>, ReplaceError> {
        let response = self
            .execute(ReplaceStep::SourceFetch, HttpRequest::get(url))
            .await?;
        tracing::debug!(url = %url, bytes = response.body.len(), "Fetched source image");
        Ok(response.body)
    }

    /// Step 3: PUT the payload to the ticket's pre-signed URL.
    ///
    /// The ticket's headers are sent as-is except `Content-Length`, which
    /// always reflects the payload.
    pub async fn stage_bytes(
        &self,
        ticket: &UploadRequest,
        bytes: Vec<u8>,
    ) -> Result<(), ReplaceError> {
        let length = bytes.len();
        let request = ticket
            .upload_headers
            .iter()
            .fold(HttpRequest::put(ticket.upload_url.as_str()), |request, (name, value)| {
                request.with_header(name.as_str(), value.as_str())
            })
            .with_header("Content-Length", length.to_string())
            .with_body(bytes);

        self.execute(ReplaceStep::StageUpload, request).await?;
        tracing::debug!(path = %ticket.id, bytes = length, "Staged payload in object storage");
        Ok(())
    }

    /// Step 4 (in place): point an existing asset at the staged path.
    pub async fn attach_path(
        &self,
        asset_id: &AssetId,
        path: &PathToken,
    ) -> Result<ReplacementResult, ReplaceError> {
        let step = ReplaceStep::Finalize;
        let body = Document::new(UploadPathUpdate::new(asset_id.as_str(), path.as_str()));
        let path = Self::upload_path(step, asset_id)?;
        let request = self.api_json_request(step, HttpMethod::Put, &path, &body)?;

        let response = self.execute(step, request).await?;
        let document: Document<UploadResource> = response
            .json()
            .map_err(|e| step.failure(None, format!("Failed to parse upload: {}", e)))?;

        Ok(ReplacementResult {
            asset_id: asset_id.clone(),
            succeeded: true,
            attributes: document.data.attributes,
        })
    }

    /// Step 4 (create and delete): mint a new asset from the staged path.
    pub async fn create_upload(&self, path: &PathToken) -> Result<ReplacementResult, ReplaceError> {
        let step = ReplaceStep::Finalize;
        let body = Document::new(NewUpload::new(path.as_str()));
        let request = self.api_json_request(step, HttpMethod::Post, "uploads", &body)?;

        let response = self.execute(step, request).await?;
        let document: Document<UploadResource> = response
            .json()
            .map_err(|e| step.failure(None, format!("Failed to parse upload: {}", e)))?;

        Ok(ReplacementResult {
            asset_id: AssetId::new(document.data.id),
            succeeded: true,
            attributes: document.data.attributes,
        })
    }

    /// Remove an asset. Used only after a sibling has been created.
    pub async fn delete_upload(&self, asset_id: &AssetId) -> Result<(), ReplaceError> {
        let step = ReplaceStep::Cleanup;
        let request = self.api_request(HttpMethod::Delete, &Self::upload_path(step, asset_id)?);
        self.execute(step, request).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ContentStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStoreClient")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("environment", &self.environment)
            .finish()
    }
}

fn status_reason(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

/// Fail `step` without a remote call when `asset_id` cannot be used as a
/// path segment.
pub(crate) fn ensure_path_safe(step: ReplaceStep, asset_id: &AssetId) -> Result<(), ReplaceError> {
    if asset_id.is_path_safe() {
        return Ok(());
    }
    tracing::warn!(step = %step, asset_id = %asset_id, "Refusing unsafe asset id");
    Err(step.failure(
        None,
        format!("Asset id {:?} is not a valid path segment", asset_id.as_str()),
    ))
}

/// Error text for a non-2xx store response. When the body is a store error
/// document its codes lead, so they survive truncation.
fn store_error_detail(text: String) -> String {
    let codes: Vec<String> = serde_json::from_str::<ApiErrorDocument>(&text)
        .map(|document| {
            document
                .data
                .into_iter()
                .map(|entry| entry.attributes.code)
                .collect()
        })
        .unwrap_or_default();

    if codes.is_empty() {
        truncate_detail(text)
    } else {
        truncate_detail(format!("{}: {}", codes.join(", "), text))
    }
}

fn truncate_detail(detail: String) -> String {
    if detail.chars().count() <= MAX_ERROR_DETAIL_CHARS {
        return detail;
    }
    let mut truncated: String = detail.chars().take(MAX_ERROR_DETAIL_CHARS).collect();
    truncated.push_str("...");
    truncated
}
