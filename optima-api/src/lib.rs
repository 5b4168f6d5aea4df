//! Optima API - Webhook Server
//!
//! Receives content-store upload events, derives optimized delivery URLs,
//! and writes oversized images back to the store through
//! [`optima_store::AssetReplacer`].

pub mod config;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use services::{OptimizationService, WebhookOutcome};
pub use state::AppState;
pub use types::{ImageUpload, UploadAttributes, WebhookEntity, WebhookEvent, WebhookResponse};
