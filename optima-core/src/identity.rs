//! Identity types for content-store entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier the content store assigns to an asset.
///
/// Opaque to Optima. It is read from webhook payloads and echoed back to the
/// store; the in-place replacement path never mints a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id can be placed in a URL path segment verbatim.
    ///
    /// Store ids are ASCII alphanumerics, `-` and `_`. Anything else (`/`,
    /// `?`, `#`, `%`, whitespace) would change which resource a request
    /// addresses.
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AssetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for AssetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Staging path returned by an upload request.
///
/// Once bytes are staged under this path it is attached to an asset to
/// complete a replacement. Only lives for the duration of one replacement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathToken(String);

impl PathToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PathToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for PathToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for PathToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}
