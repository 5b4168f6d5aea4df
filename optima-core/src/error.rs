//! Error types for Optima operations

use crate::replacement::ReplaceStep;
use thiserror::Error;

/// Failure of one step of the asset-replacement protocol.
///
/// Every variant carries the upstream HTTP status when one was received.
/// `None` means the request never produced a response (timeout, connection
/// failure, or a body that could not be parsed after a 2xx).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReplaceError {
    #[error("Upload request failed (status {status:?}): {body}")]
    StageRequestFailed { status: Option<u16>, body: String },

    #[error("Source fetch failed (status {status:?}): {reason}")]
    SourceFetchFailed { status: Option<u16>, reason: String },

    #[error("Staging upload failed (status {status:?}): {body}")]
    StageUploadFailed { status: Option<u16>, body: String },

    #[error("Finalizing upload failed (status {status:?}): {body}")]
    FinalizeFailed { status: Option<u16>, body: String },

    #[error("Deleting original upload failed (status {status:?}): {body}")]
    CleanupFailed { status: Option<u16>, body: String },
}

impl ReplaceError {
    /// The protocol step that failed.
    pub fn step(&self) -> ReplaceStep {
        match self {
            ReplaceError::StageRequestFailed { .. } => ReplaceStep::StageRequest,
            ReplaceError::SourceFetchFailed { .. } => ReplaceStep::SourceFetch,
            ReplaceError::StageUploadFailed { .. } => ReplaceStep::StageUpload,
            ReplaceError::FinalizeFailed { .. } => ReplaceStep::Finalize,
            ReplaceError::CleanupFailed { .. } => ReplaceStep::Cleanup,
        }
    }

    /// Upstream HTTP status, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ReplaceError::StageRequestFailed { status, .. }
            | ReplaceError::SourceFetchFailed { status, .. }
            | ReplaceError::StageUploadFailed { status, .. }
            | ReplaceError::FinalizeFailed { status, .. }
            | ReplaceError::CleanupFailed { status, .. } => *status,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Errors raised by an [`HttpTransport`](crate::transport::HttpTransport)
/// before a response is available.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Request to {url} failed: {reason}")]
    Connection { url: String, reason: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_error_display_includes_status_and_body() {
        let err = ReplaceError::StageRequestFailed {
            status: Some(422),
            body: "{\"errors\":[]}".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Upload request failed"));
        assert!(msg.contains("422"));
        assert!(msg.contains("errors"));
    }

    #[test]
    fn test_replace_error_step_and_status() {
        let err = ReplaceError::FinalizeFailed {
            status: None,
            body: "timed out".to_string(),
        };
        assert_eq!(err.step(), ReplaceStep::Finalize);
        assert_eq!(err.status(), None);

        let err = ReplaceError::SourceFetchFailed {
            status: Some(404),
            reason: "Not Found".to_string(),
        };
        assert_eq!(err.step(), ReplaceStep::SourceFetch);
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            field: "OPTIMA_STORE_API_TOKEN".to_string(),
        };
        assert!(err.to_string().contains("OPTIMA_STORE_API_TOKEN"));
    }
}
