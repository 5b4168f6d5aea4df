//! Asset replacement data contracts

use crate::error::ReplaceError;
use crate::identity::{AssetId, PathToken};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Filename used for the staged object when the caller supplies none.
pub const DEFAULT_UPLOAD_FILENAME: &str = "optimized-image.jpg";

/// A single-use staging ticket issued by the content store.
///
/// Deliberately not `Clone`: a ticket is created per replacement attempt,
/// used for exactly one staging PUT, then consumed by
/// [`UploadRequest::into_path_token`] to finalize.
#[derive(Debug, PartialEq, Eq)]
pub struct UploadRequest {
    pub id: PathToken,
    /// Pre-signed object-storage URL the payload is PUT to.
    pub upload_url: String,
    /// Headers the object store requires on the staging PUT.
    pub upload_headers: BTreeMap<String, String>,
}

impl UploadRequest {
    pub fn into_path_token(self) -> PathToken {
        self.id
    }
}

/// Terminal outcome of a replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementResult {
    pub asset_id: AssetId,
    pub succeeded: bool,
    /// Attributes of the asset as reported by the store after the commit.
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// Steps of the replacement protocol, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceStep {
    /// Create the upload request (`POST /upload-requests`).
    StageRequest,
    /// Download the optimized bytes.
    SourceFetch,
    /// PUT the bytes to object storage.
    StageUpload,
    /// Attach the staged path to an asset.
    Finalize,
    /// Remove the original asset (create-and-delete only).
    Cleanup,
}

impl ReplaceStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplaceStep::StageRequest => "stage_request",
            ReplaceStep::SourceFetch => "source_fetch",
            ReplaceStep::StageUpload => "stage_upload",
            ReplaceStep::Finalize => "finalize",
            ReplaceStep::Cleanup => "cleanup",
        }
    }

    /// Build this step's error kind.
    pub fn failure(&self, status: Option<u16>, detail: impl Into<String>) -> ReplaceError {
        let detail = detail.into();
        match self {
            ReplaceStep::StageRequest => ReplaceError::StageRequestFailed {
                status,
                body: detail,
            },
            ReplaceStep::SourceFetch => ReplaceError::SourceFetchFailed {
                status,
                reason: detail,
            },
            ReplaceStep::StageUpload => ReplaceError::StageUploadFailed {
                status,
                body: detail,
            },
            ReplaceStep::Finalize => ReplaceError::FinalizeFailed {
                status,
                body: detail,
            },
            ReplaceStep::Cleanup => ReplaceError::CleanupFailed {
                status,
                body: detail,
            },
        }
    }
}

impl fmt::Display for ReplaceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
