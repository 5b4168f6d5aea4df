//! Create-and-delete protocol tests against the mock transport.

use optima_core::{AssetId, HttpMethod, ReplaceError, ReplaceStep};
use optima_store::{AssetReplacer, ReplacementStrategy};
use optima_test_utils::{
    test_replacer, MockTransport, TEST_ASSET_ID, TEST_BASE_URL, TEST_NEW_ASSET_ID,
    TEST_PATH_TOKEN, TEST_SOURCE_URL, TEST_UPLOAD_URL,
};
use std::sync::Arc;

fn replacer(mock: &Arc<MockTransport>) -> AssetReplacer {
    test_replacer(Arc::clone(mock), ReplacementStrategy::CreateAndDelete)
}

#[tokio::test]
async fn test_success_returns_new_asset_and_deletes_original() -> Result<(), ReplaceError> {
    let mock = Arc::new(MockTransport::happy_path());

    let result = replacer(&mock)
        .replace(&AssetId::new(TEST_ASSET_ID), TEST_SOURCE_URL, None)
        .await?;

    assert!(result.succeeded);
    assert_eq!(result.asset_id, AssetId::new(TEST_NEW_ASSET_ID));

    let sequence: Vec<(HttpMethod, String)> = mock
        .calls()
        .into_iter()
        .map(|request| (request.method, request.url))
        .collect();
    assert_eq!(
        sequence,
        vec![
            (HttpMethod::Post, format!("{}/upload-requests", TEST_BASE_URL)),
            (HttpMethod::Get, TEST_SOURCE_URL.to_string()),
            (HttpMethod::Put, TEST_UPLOAD_URL.to_string()),
            (HttpMethod::Post, format!("{}/uploads", TEST_BASE_URL)),
            (HttpMethod::Delete, format!("{}/uploads/{}", TEST_BASE_URL, TEST_ASSET_ID)),
        ]
    );

    let created = mock.requests_to(HttpMethod::Post, "/uploads");
    let body: serde_json::Value = created[0]
        .json_body()
        .ok_or_else(|| ReplaceStep::Finalize.failure(None, "create body was not JSON"))?;
    assert_eq!(body["data"]["type"], "upload");
    assert_eq!(body["data"]["attributes"]["path"], TEST_PATH_TOKEN);
    assert!(body["data"].get("id").is_none());

    assert_eq!(mock.calls_to(HttpMethod::Put, "/uploads/"), 0);
    Ok(())
}

#[tokio::test]
async fn test_create_failure_keeps_original() {
    let mock = Arc::new(MockTransport::happy_path().on_status(
        HttpMethod::Post,
        "/uploads",
        422,
        "invalid path",
    ));

    let result = replacer(&mock)
        .replace(&AssetId::new(TEST_ASSET_ID), TEST_SOURCE_URL, None)
        .await;

    assert_eq!(
        result.err(),
        Some(ReplaceError::FinalizeFailed {
            status: Some(422),
            body: "invalid path".to_string(),
        })
    );
    assert_eq!(mock.calls_to(HttpMethod::Delete, "/uploads/"), 0);
}

#[tokio::test]
async fn test_delete_failure_is_cleanup_failure() {
    let mock = Arc::new(MockTransport::happy_path().on_status(
        HttpMethod::Delete,
        "/uploads/",
        409,
        "asset in use",
    ));

    let result = replacer(&mock)
        .replace(&AssetId::new(TEST_ASSET_ID), TEST_SOURCE_URL, None)
        .await;

    match result {
        Err(ReplaceError::CleanupFailed { status, body }) => {
            assert_eq!(status, Some(409));
            assert_eq!(body, "asset in use");
        }
        other => panic!("expected CleanupFailed, got {:?}", other),
    }
    assert_eq!(mock.calls_to(HttpMethod::Post, "/uploads"), 1);
}

#[tokio::test]
async fn test_stage_request_failure_creates_nothing() {
    let mock = Arc::new(MockTransport::happy_path().on_status(
        HttpMethod::Post,
        "/upload-requests",
        401,
        "unauthorized",
    ));

    let result = replacer(&mock)
        .replace(&AssetId::new(TEST_ASSET_ID), TEST_SOURCE_URL, None)
        .await;

    assert!(matches!(
        result,
        Err(ReplaceError::StageRequestFailed { status: Some(401), .. })
    ));
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_unsafe_asset_id_is_refused_before_any_call() {
    let mock = Arc::new(MockTransport::happy_path());

    let result = replacer(&mock)
        .replace(&AssetId::new("123?force=true"), TEST_SOURCE_URL, None)
        .await;

    assert!(matches!(
        result,
        Err(ReplaceError::CleanupFailed { status: None, .. })
    ));
    assert_eq!(mock.call_count(), 0);
}
