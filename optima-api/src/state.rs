//! Shared application state for Axum routers.

use std::sync::Arc;

use crate::services::OptimizationService;

/// Application-wide state shared across all routes.
///
/// Immutable after startup; cloning copies the `Arc`.
#[derive(Clone, Debug)]
pub struct AppState {
    pub service: Arc<OptimizationService>,
}

impl AppState {
    pub fn new(service: OptimizationService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
