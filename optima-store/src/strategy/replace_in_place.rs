use super::{stage, ReplacementPolicy, ReplacementStrategy};
use crate::client::{ensure_path_safe, ContentStoreClient};
use async_trait::async_trait;
use optima_core::{AssetId, ReplaceError, ReplaceStep, ReplacementResult};

/// Stage the payload, then `PUT /uploads/{id}` with the staged path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceInPlace;

#[async_trait]
impl ReplacementPolicy for ReplaceInPlace {
    fn strategy(&self) -> ReplacementStrategy {
        ReplacementStrategy::ReplaceInPlace
    }

    async fn replace(
        &self,
        client: &ContentStoreClient,
        asset_id: &AssetId,
        source_url: &str,
        filename: &str,
    ) -> Result<ReplacementResult, ReplaceError> {
        ensure_path_safe(ReplaceStep::Finalize, asset_id)?;
        let path = stage(client, source_url, filename).await?;
        client.attach_path(asset_id, &path).await
    }
}
