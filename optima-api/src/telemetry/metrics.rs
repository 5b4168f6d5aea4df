//! Prometheus Metrics Definitions
//!
//! Defines all Optima metrics and the `/metrics` scrape endpoint.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Replacement latency buckets (seconds). A replacement moves a whole
/// image through object storage, so the tail is long.
const REPLACEMENT_LATENCY_BUCKETS: &[f64] = &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0];

/// Global metrics instance - initialized on first use
pub static METRICS: Lazy<ApiResult<OptimaMetrics>> = Lazy::new(OptimaMetrics::new);

/// Container for all Optima metrics.
#[derive(Clone)]
pub struct OptimaMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Webhook events - labels: outcome
    pub webhook_events_total: CounterVec,

    /// Replacement attempts - labels: strategy, status
    pub replacements_total: CounterVec,

    /// Replacement failures - labels: step
    pub replacement_failures_total: CounterVec,

    /// Replacement duration histogram - labels: strategy
    pub replacement_duration_seconds: HistogramVec,
}

impl OptimaMetrics {
    /// Create and register all metrics with the default Prometheus registry.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "optima_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "optima_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            webhook_events_total: register_counter_vec!(
                "optima_webhook_events_total",
                "Webhook events processed, by outcome",
                &["outcome"]
            )
            .map_err(|e| registration_error("webhook_events_total", e))?,

            replacements_total: register_counter_vec!(
                "optima_replacements_total",
                "Asset replacement attempts",
                &["strategy", "status"]
            )
            .map_err(|e| registration_error("replacements_total", e))?,

            replacement_failures_total: register_counter_vec!(
                "optima_replacement_failures_total",
                "Asset replacement failures by protocol step",
                &["step"]
            )
            .map_err(|e| registration_error("replacement_failures_total", e))?,

            replacement_duration_seconds: register_histogram_vec!(
                "optima_replacement_duration_seconds",
                "Asset replacement duration in seconds",
                &["strategy"],
                REPLACEMENT_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("replacement_duration_seconds", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, status_str.as_str()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record the outcome of one webhook event.
    pub fn record_webhook_event(&self, outcome: &str) {
        self.webhook_events_total.with_label_values(&[outcome]).inc();
    }

    /// Record a finished replacement. `failed_step` is `None` on success.
    pub fn record_replacement(&self, strategy: &str, failed_step: Option<&str>, duration_secs: f64) {
        let status = if failed_step.is_some() { "failure" } else { "success" };
        self.replacements_total
            .with_label_values(&[strategy, status])
            .inc();
        if let Some(step) = failed_step {
            self.replacement_failures_total
                .with_label_values(&[step])
                .inc();
        }
        self.replacement_duration_seconds
            .with_label_values(&[strategy])
            .observe(duration_secs);
    }
}

fn registration_error(name: &str, err: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, err))
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
