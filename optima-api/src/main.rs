//! Optima API Server Entry Point
//!
//! Loads configuration, builds the content-store client once, and serves
//! the webhook router until ctrl-c.

use std::sync::Arc;

use optima_api::telemetry::{init_tracing, TelemetryConfig};
use optima_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState, OptimizationService};
use optima_store::{AssetReplacer, ContentStoreClient, StoreConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    let api_config = ApiConfig::from_env()?;
    let service = build_service(&api_config)?;
    let app = create_api_router(AppState::new(service), &api_config);

    let addr = api_config.bind_addr()?;
    tracing::info!(
        %addr,
        replacement_enabled = api_config.replacement_enabled,
        strategy = %api_config.strategy,
        "Starting Optima API server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

/// The store token is only required when replacement is enabled.
fn build_service(config: &ApiConfig) -> ApiResult<OptimizationService> {
    if !config.replacement_enabled {
        tracing::warn!("Asset replacement disabled; only delivery URLs will be derived");
        return Ok(OptimizationService::without_replacement());
    }

    let store_config = StoreConfig::from_env()?;
    tracing::info!(
        base_url = %store_config.base_url,
        environment = ?store_config.environment,
        timeout_secs = store_config.request_timeout.as_secs(),
        "Content store client configured"
    );
    let client = Arc::new(ContentStoreClient::from_config(store_config)?);
    let replacer = AssetReplacer::new(client, config.strategy);

    Ok(OptimizationService::new(Some(Arc::new(replacer))))
}
