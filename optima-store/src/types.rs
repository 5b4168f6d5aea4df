//! Content-store API request and response types
//!
//! The store speaks JSON:API: every payload is wrapped in `{"data": ...}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const UPLOAD_REQUEST_TYPE: &str = "upload_request";
pub const UPLOAD_TYPE: &str = "upload";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document<T> {
    pub data: T,
}

impl<T> Document<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// UPLOAD REQUESTS
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct NewUploadRequest {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attributes: NewUploadRequestAttributes,
}

impl NewUploadRequest {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            kind: UPLOAD_REQUEST_TYPE,
            attributes: NewUploadRequestAttributes {
                filename: filename.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUploadRequestAttributes {
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequestResource {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub attributes: UploadRequestAttributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequestAttributes {
    pub url: String,
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,
}

// ============================================================================
// UPLOADS
// ============================================================================

/// Body of `PUT /uploads/{id}` repointing an upload at a staged path.
#[derive(Debug, Clone, Serialize)]
pub struct UploadPathUpdate {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attributes: UploadPathAttributes,
}

impl UploadPathUpdate {
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: UPLOAD_TYPE,
            attributes: UploadPathAttributes { path: path.into() },
        }
    }
}

/// Body of `POST /uploads` creating an upload from a staged path.
#[derive(Debug, Clone, Serialize)]
pub struct NewUpload {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attributes: UploadPathAttributes,
}

impl NewUpload {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            kind: UPLOAD_TYPE,
            attributes: UploadPathAttributes { path: path.into() },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadPathAttributes {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResource {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// Error body returned by the store on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDocument {
    pub data: Vec<ApiErrorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub attributes: ApiErrorAttributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorAttributes {
    pub code: String,
    #[serde(default)]
    pub details: serde_json::Value,
}
