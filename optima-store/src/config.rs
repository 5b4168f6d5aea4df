//! Content-store client configuration
//!
//! Loaded from environment variables once at startup. A missing API token
//! is a configuration error, never a per-request one.

use optima_core::ConfigError;
use secrecy::SecretString;
use std::time::Duration;

/// Default content-store API host.
pub const DEFAULT_BASE_URL: &str = "https://site-api.datocms.com";

/// API version sent in the `X-Api-Version` header.
pub const DEFAULT_API_VERSION: &str = "3";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the content-store client.
pub struct StoreConfig {
    /// API host, without trailing slash.
    pub base_url: String,
    /// Bearer token for the content-store API.
    pub api_token: SecretString,
    pub api_version: String,
    /// Sandbox environment to target, sent as `X-Environment`.
    pub environment: Option<String>,
    /// Upper bound on each remote call, including the staging PUT.
    pub request_timeout: Duration,
}

impl StoreConfig {
    /// Create a config with defaults for everything but the token.
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: SecretString::from(api_token.into()),
            api_version: DEFAULT_API_VERSION.to_string(),
            environment: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `OPTIMA_STORE_API_TOKEN`: Bearer token (required)
    /// - `OPTIMA_STORE_BASE_URL`: API host (default: https://site-api.datocms.com)
    /// - `OPTIMA_STORE_API_VERSION`: API version header (default: 3)
    /// - `OPTIMA_STORE_ENVIRONMENT`: Sandbox environment name (optional)
    /// - `OPTIMA_STORE_TIMEOUT_SECS`: Per-request timeout (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = lookup("OPTIMA_STORE_API_TOKEN")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                field: "OPTIMA_STORE_API_TOKEN".to_string(),
            })?;

        let mut config = Self::new(api_token);

        if let Some(base_url) = lookup("OPTIMA_STORE_BASE_URL").filter(|s| !s.trim().is_empty()) {
            let base_url = base_url.trim();
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    field: "OPTIMA_STORE_BASE_URL".to_string(),
                    value: base_url.to_string(),
                    reason: "must start with http:// or https://".to_string(),
                });
            }
            config = config.with_base_url(base_url);
        }

        if let Some(version) = lookup("OPTIMA_STORE_API_VERSION").filter(|s| !s.trim().is_empty()) {
            config.api_version = version.trim().to_string();
        }

        config.environment = lookup("OPTIMA_STORE_ENVIRONMENT")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if let Some(raw) = lookup("OPTIMA_STORE_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: "OPTIMA_STORE_TIMEOUT_SECS".to_string(),
                    value: raw.clone(),
                    reason: "must be a positive integer".to_string(),
                })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("environment", &self.environment)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
