//! Service layer

pub mod optimization;

pub use optimization::{OptimizationService, WebhookOutcome};
