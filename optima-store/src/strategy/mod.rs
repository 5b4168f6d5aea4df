//! Replacement strategies
//!
//! Both strategies share steps 1-3 (stage request, fetch source, stage bytes)
//! and differ in how the staged path becomes the live asset.

mod create_and_delete;
mod replace_in_place;

pub use create_and_delete::CreateAndDelete;
pub use replace_in_place::ReplaceInPlace;

use crate::client::ContentStoreClient;
use async_trait::async_trait;
use optima_core::{AssetId, PathToken, ReplaceError, ReplacementResult, DEFAULT_UPLOAD_FILENAME};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info_span, Instrument};

/// How a staged payload replaces an existing asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementStrategy {
    /// Repoint the existing asset at the new payload. Identity is preserved.
    #[default]
    ReplaceInPlace,
    /// Create a new asset, then delete the original. Identity is NOT
    /// preserved: references to the old asset id break.
    CreateAndDelete,
}

impl ReplacementStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplacementStrategy::ReplaceInPlace => "replace_in_place",
            ReplacementStrategy::CreateAndDelete => "create_and_delete",
        }
    }

    pub fn preserves_identity(&self) -> bool {
        matches!(self, ReplacementStrategy::ReplaceInPlace)
    }

    fn policy(&self) -> Box<dyn ReplacementPolicy> {
        match self {
            ReplacementStrategy::ReplaceInPlace => Box::new(ReplaceInPlace),
            ReplacementStrategy::CreateAndDelete => Box::new(CreateAndDelete),
        }
    }
}

impl fmt::Display for ReplacementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplacementStrategy {
    type Err = ReplacementStrategyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "replace_in_place" => Ok(ReplacementStrategy::ReplaceInPlace),
            "create_and_delete" => Ok(ReplacementStrategy::CreateAndDelete),
            _ => Err(ReplacementStrategyParseError(s.to_string())),
        }
    }
}

/// Error when parsing an unknown strategy name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementStrategyParseError(pub String);

impl fmt::Display for ReplacementStrategyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid replacement strategy: {} (expected replace_in_place or create_and_delete)",
            self.0
        )
    }
}

impl std::error::Error for ReplacementStrategyParseError {}

/// Turns a source URL into the content of an asset.
#[async_trait]
pub trait ReplacementPolicy: Send + Sync {
    fn strategy(&self) -> ReplacementStrategy;

    async fn replace(
        &self,
        client: &ContentStoreClient,
        asset_id: &AssetId,
        source_url: &str,
        filename: &str,
    ) -> Result<ReplacementResult, ReplaceError>;
}

/// Steps 1-3: request a ticket, download the payload, upload it.
///
/// Returns the staged path. The ticket is consumed here and cannot be
/// reused by a later attempt.
pub(crate) async fn stage(
    client: &ContentStoreClient,
    source_url: &str,
    filename: &str,
) -> Result<PathToken, ReplaceError> {
    let ticket = client.create_upload_request(filename).await?;
    let bytes = client.fetch_source(source_url).await?;
    client.stage_bytes(&ticket, bytes).await?;
    Ok(ticket.into_path_token())
}

/// Replaces asset content through the configured strategy.
pub struct AssetReplacer {
    client: Arc<ContentStoreClient>,
    policy: Box<dyn ReplacementPolicy>,
}

impl AssetReplacer {
    pub fn new(client: Arc<ContentStoreClient>, strategy: ReplacementStrategy) -> Self {
        Self {
            client,
            policy: strategy.policy(),
        }
    }

    pub fn strategy(&self) -> ReplacementStrategy {
        self.policy.strategy()
    }

    /// Replace the content of `asset_id` with the bytes served at `source_url`.
    ///
    /// The first failing step's error is returned; nothing is rolled back.
    pub async fn replace(
        &self,
        asset_id: &AssetId,
        source_url: &str,
        filename: Option<&str>,
    ) -> Result<ReplacementResult, ReplaceError> {
        let filename = filename
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_UPLOAD_FILENAME);
        let strategy = self.policy.strategy();

        let span = info_span!(
            "asset_replacement",
            asset_id = %asset_id,
            strategy = %strategy,
            filename = %filename,
        );

        async {
            let start = Instant::now();
            tracing::info!(source_url = %source_url, "Starting asset replacement");

            let result = self
                .policy
                .replace(&self.client, asset_id, source_url, filename)
                .await;

            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(replaced) => tracing::info!(
                    new_asset_id = %replaced.asset_id,
                    elapsed_ms,
                    "Asset replacement completed"
                ),
                Err(e) => tracing::error!(
                    step = %e.step(),
                    status = ?e.status(),
                    error = %e,
                    elapsed_ms,
                    "Asset replacement failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }
}

impl fmt::Debug for AssetReplacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetReplacer")
            .field("client", &self.client)
            .field("strategy", &self.policy.strategy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_default_preserves_identity() {
        let strategy = ReplacementStrategy::default();
        assert_eq!(strategy, ReplacementStrategy::ReplaceInPlace);
        assert!(strategy.preserves_identity());
        assert!(!ReplacementStrategy::CreateAndDelete.preserves_identity());
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(
            "replace_in_place".parse::<ReplacementStrategy>(),
            Ok(ReplacementStrategy::ReplaceInPlace)
        );
        assert_eq!(
            "Create-And-Delete".parse::<ReplacementStrategy>(),
            Ok(ReplacementStrategy::CreateAndDelete)
        );
        assert!("overwrite".parse::<ReplacementStrategy>().is_err());
    }

    #[test]
    fn test_strategy_display_round_trips() {
        for strategy in [
            ReplacementStrategy::ReplaceInPlace,
            ReplacementStrategy::CreateAndDelete,
        ] {
            assert_eq!(strategy.to_string().parse::<ReplacementStrategy>(), Ok(strategy));
        }
    }

    #[test]
    fn test_strategy_serde_snake_case() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&ReplacementStrategy::CreateAndDelete)?;
        assert_eq!(json, "\"create_and_delete\"");
        Ok(())
    }

    #[test]
    fn test_policy_matches_strategy() {
        for strategy in [
            ReplacementStrategy::ReplaceInPlace,
            ReplacementStrategy::CreateAndDelete,
        ] {
            assert_eq!(strategy.policy().strategy(), strategy);
        }
    }
}
