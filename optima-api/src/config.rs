//! API Configuration Module
//!
//! Server and webhook-processing settings, loaded from environment
//! variables with defaults suitable for local development.

use optima_core::ConfigError;
use optima_store::ReplacementStrategy;
use std::net::SocketAddr;

/// Default request body limit for the webhook endpoint.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Interface to bind.
    pub bind_host: String,

    pub port: u16,

    /// Whether over-threshold images are written back to the content store.
    /// When disabled the service only derives delivery URLs and no store
    /// token is needed.
    pub replacement_enabled: bool,

    /// How replacement swaps asset content.
    pub strategy: ReplacementStrategy,

    /// Largest webhook body accepted.
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 3000,
            replacement_enabled: true,
            strategy: ReplacementStrategy::ReplaceInPlace,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `OPTIMA_API_BIND`: Interface to bind (default: 0.0.0.0)
    /// - `PORT` or `OPTIMA_API_PORT`: Listen port (default: 3000)
    /// - `OPTIMA_REPLACEMENT_ENABLED`: "true" or "false" (default: true)
    /// - `OPTIMA_REPLACEMENT_STRATEGY`: `replace_in_place` or `create_and_delete`
    ///   (default: replace_in_place)
    /// - `OPTIMA_MAX_BODY_BYTES`: Webhook body limit (default: 1048576)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_host = lookup("OPTIMA_API_BIND")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.bind_host);

        let port = match lookup("PORT").or_else(|| lookup("OPTIMA_API_PORT")) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                field: "PORT".to_string(),
                value: raw.clone(),
                reason: "must be a port number".to_string(),
            })?,
            None => defaults.port,
        };

        let replacement_enabled = lookup("OPTIMA_REPLACEMENT_ENABLED")
            .map(|s| s.trim().to_lowercase() != "false")
            .unwrap_or(defaults.replacement_enabled);

        let strategy = match lookup("OPTIMA_REPLACEMENT_STRATEGY").filter(|s| !s.trim().is_empty()) {
            Some(raw) => raw.parse::<ReplacementStrategy>().map_err(|e| ConfigError::InvalidValue {
                field: "OPTIMA_REPLACEMENT_STRATEGY".to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.strategy,
        };

        let max_body_bytes = match lookup("OPTIMA_MAX_BODY_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|bytes| *bytes > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: "OPTIMA_MAX_BODY_BYTES".to_string(),
                    value: raw.clone(),
                    reason: "must be a positive integer".to_string(),
                })?,
            None => defaults.max_body_bytes,
        };

        Ok(Self {
            bind_host,
            port,
            replacement_enabled,
            strategy,
            max_body_bytes,
        })
    }

    /// Socket address to listen on.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "OPTIMA_API_BIND".to_string(),
                value: addr.clone(),
                reason: e.to_string(),
            })
    }
}
