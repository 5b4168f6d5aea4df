//! Property-Based Tests for Asset Replacement
//!
//! **Property: identity and ticket use per strategy**
//!
//! For any asset id, filename and strategy, a replacement against a healthy
//! store SHALL:
//! - request exactly one staging ticket, named after the filename
//! - stage exactly once, to the ticket's URL
//! - keep the asset id under replace-in-place, and mint a new one under
//!   create-and-delete (deleting the original)

use optima_core::{HttpMethod, ReplacementResult};
use optima_store::ReplacementStrategy;
use optima_test_utils::generators::{
    arb_asset_id, arb_filename, arb_path_token, arb_replacement_strategy,
};
use optima_test_utils::{
    test_client, test_replacer, AssetId, MockTransport, TEST_NEW_ASSET_ID, TEST_SOURCE_URL,
    TEST_UPLOAD_URL,
};
use proptest::prelude::*;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn test_runtime() -> Result<Runtime, TestCaseError> {
    Runtime::new().map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

fn run_replacement(
    mock: &Arc<MockTransport>,
    strategy: ReplacementStrategy,
    asset_id: &AssetId,
    filename: &str,
) -> Result<ReplacementResult, TestCaseError> {
    let replacer = test_replacer(Arc::clone(mock), strategy);
    test_runtime()?
        .block_on(replacer.replace(asset_id, TEST_SOURCE_URL, Some(filename)))
        .map_err(|e| TestCaseError::fail(format!("Replacement failed: {}", e)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_strategy_decides_resulting_identity(
        asset_id in arb_asset_id(),
        filename in arb_filename(),
        strategy in arb_replacement_strategy(),
    ) {
        let mock = Arc::new(MockTransport::happy_path());
        let result = run_replacement(&mock, strategy, &asset_id, &filename)?;

        prop_assert!(result.succeeded);
        if strategy.preserves_identity() {
            prop_assert_eq!(&result.asset_id, &asset_id);
            prop_assert_eq!(mock.calls_to(HttpMethod::Delete, "/uploads/"), 0);
        } else {
            prop_assert_eq!(result.asset_id.as_str(), TEST_NEW_ASSET_ID);
            let deletes = mock.requests_to(HttpMethod::Delete, "/uploads/");
            prop_assert_eq!(deletes.len(), 1);
            let expected_suffix = format!("/uploads/{}", asset_id);
            prop_assert!(deletes[0].url.ends_with(&expected_suffix));
        }
    }

    #[test]
    fn prop_one_ticket_per_attempt(
        asset_id in arb_asset_id(),
        filename in arb_filename(),
        strategy in arb_replacement_strategy(),
    ) {
        let mock = Arc::new(MockTransport::happy_path());
        run_replacement(&mock, strategy, &asset_id, &filename)?;

        let tickets = mock.requests_to(HttpMethod::Post, "/upload-requests");
        prop_assert_eq!(tickets.len(), 1);
        let body: Option<serde_json::Value> = tickets[0].json_body();
        let sent_filename = body.as_ref().map(|b| b["data"]["attributes"]["filename"].clone());
        prop_assert_eq!(sent_filename, Some(serde_json::Value::from(filename.as_str())));

        prop_assert_eq!(mock.calls_to(HttpMethod::Put, TEST_UPLOAD_URL), 1);
    }

    #[test]
    fn prop_attach_path_sends_staged_path(
        asset_id in arb_asset_id(),
        path in arb_path_token(),
    ) {
        let mock = Arc::new(MockTransport::happy_path());
        let client = test_client(Arc::clone(&mock));

        let result = test_runtime()?
            .block_on(client.attach_path(&asset_id, &path))
            .map_err(|e| TestCaseError::fail(format!("Attach failed: {}", e)))?;
        prop_assert_eq!(&result.asset_id, &asset_id);

        let calls = mock.requests_to(HttpMethod::Put, "/uploads/");
        prop_assert_eq!(calls.len(), 1);
        let body: Option<serde_json::Value> = calls[0].json_body();
        let sent_path = body.as_ref().map(|b| b["data"]["attributes"]["path"].clone());
        prop_assert_eq!(sent_path, Some(serde_json::Value::from(path.as_str())));
    }
}
