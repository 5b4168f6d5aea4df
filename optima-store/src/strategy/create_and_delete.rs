use super::{stage, ReplacementPolicy, ReplacementStrategy};
use crate::client::{ensure_path_safe, ContentStoreClient};
use async_trait::async_trait;
use optima_core::{AssetId, ReplaceError, ReplaceStep, ReplacementResult};

/// Stage the payload, create a sibling asset from it, then delete the
/// original.
///
/// If the delete fails the new asset is kept and `CleanupFailed` is
/// returned; the caller then owns two assets.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateAndDelete;

#[async_trait]
impl ReplacementPolicy for CreateAndDelete {
    fn strategy(&self) -> ReplacementStrategy {
        ReplacementStrategy::CreateAndDelete
    }

    async fn replace(
        &self,
        client: &ContentStoreClient,
        asset_id: &AssetId,
        source_url: &str,
        filename: &str,
    ) -> Result<ReplacementResult, ReplaceError> {
        // Before staging: an unusable id must not leave a second asset behind.
        ensure_path_safe(ReplaceStep::Cleanup, asset_id)?;
        let path = stage(client, source_url, filename).await?;
        let created = client.create_upload(&path).await?;

        if let Err(e) = client.delete_upload(asset_id).await {
            tracing::warn!(
                original_asset_id = %asset_id,
                new_asset_id = %created.asset_id,
                "Original asset left in place after failed delete"
            );
            return Err(e);
        }

        Ok(created)
    }
}
