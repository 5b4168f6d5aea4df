//! Optima Core - Shared Types
//!
//! Pure data structures, the delivery-parameter deriver, and the HTTP
//! transport seam. Every other Optima crate depends on this one.
//! Nothing in here performs I/O.

pub mod error;
pub mod identity;
pub mod optimize;
pub mod replacement;
pub mod transport;

pub use error::{ConfigError, ReplaceError, TransportError};
pub use identity::{AssetId, PathToken};
pub use optimize::{
    derive_delivery_url, DeliveryParams, ImageMetadata, OptimizationTier, HIGH_DENSITY_DPR,
    HUGE_IMAGE_THRESHOLD, LARGE_IMAGE_THRESHOLD, MAX_DELIVERY_WIDTH, REDUCED_QUALITY,
    STANDARD_QUALITY,
};
pub use replacement::{ReplaceStep, ReplacementResult, UploadRequest, DEFAULT_UPLOAD_FILENAME};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
