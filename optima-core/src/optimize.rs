//! Delivery-parameter derivation
//!
//! Maps image metadata to an annotated delivery URL. The image CDN in front
//! of the media library transforms images on the fly from query parameters,
//! so "optimizing" an image is a matter of choosing those parameters.
//!
//! The policy is a three-tier table keyed on the original byte size:
//!
//! | size                | quality | extra                            |
//! |---------------------|---------|----------------------------------|
//! | > 10 MiB            | 75      | `w=2000` if wider, then `dpr=2`  |
//! | (5 MiB, 10 MiB]     | 75      | `w=2000` if wider                |
//! | <= 5 MiB            | 85      | none                             |
//!
//! Every derived URL starts its annotation with `auto=format,compress`.

use serde::{Deserialize, Serialize};

/// Size above which an image is considered large (5 MiB).
pub const LARGE_IMAGE_THRESHOLD: u64 = 5 * 1024 * 1024;

/// Size above which an image is considered huge (10 MiB).
pub const HUGE_IMAGE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Width cap applied to large and huge images.
pub const MAX_DELIVERY_WIDTH: u64 = 2000;

/// Quality for images within the size budget.
pub const STANDARD_QUALITY: u8 = 85;

/// Quality for large and huge images.
pub const REDUCED_QUALITY: u8 = 75;

/// Device pixel ratio requested for huge images.
pub const HIGH_DENSITY_DPR: u8 = 2;

const AUTO_PARAMS: &str = "auto=format,compress";

/// Size tier an image falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationTier {
    /// At most 5 MiB.
    Standard,
    /// Over 5 MiB, at most 10 MiB.
    Large,
    /// Over 10 MiB.
    Huge,
}

impl OptimizationTier {
    /// Classify a byte size. Boundaries belong to the lower tier.
    pub fn for_size(size_bytes: u64) -> Self {
        if size_bytes > HUGE_IMAGE_THRESHOLD {
            OptimizationTier::Huge
        } else if size_bytes > LARGE_IMAGE_THRESHOLD {
            OptimizationTier::Large
        } else {
            OptimizationTier::Standard
        }
    }

    pub fn quality(&self) -> u8 {
        match self {
            OptimizationTier::Standard => STANDARD_QUALITY,
            OptimizationTier::Large | OptimizationTier::Huge => REDUCED_QUALITY,
        }
    }

    /// Whether images in this tier should have their stored bytes replaced.
    pub fn requires_replacement(&self) -> bool {
        !matches!(self, OptimizationTier::Standard)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationTier::Standard => "standard",
            OptimizationTier::Large => "large",
            OptimizationTier::Huge => "huge",
        }
    }
}

/// Metadata describing an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub url: String,
    pub width: u64,
    pub height: u64,
    pub size_bytes: u64,
}

impl ImageMetadata {
    pub fn new(url: impl Into<String>, width: u64, height: u64, size_bytes: u64) -> Self {
        Self {
            url: url.into(),
            width,
            height,
            size_bytes,
        }
    }

    pub fn tier(&self) -> OptimizationTier {
        OptimizationTier::for_size(self.size_bytes)
    }
}

/// Query parameters appended to a delivery URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryParams {
    pub quality: u8,
    /// Width override, only set when the image is wider than the cap.
    pub width: Option<u64>,
    pub dpr: Option<u8>,
}

impl DeliveryParams {
    pub fn for_image(image: &ImageMetadata) -> Self {
        let tier = image.tier();
        let width = match tier {
            OptimizationTier::Standard => None,
            OptimizationTier::Large | OptimizationTier::Huge => {
                (image.width > MAX_DELIVERY_WIDTH).then_some(MAX_DELIVERY_WIDTH)
            }
        };
        let dpr = (tier == OptimizationTier::Huge).then_some(HIGH_DENSITY_DPR);

        Self {
            quality: tier.quality(),
            width,
            dpr,
        }
    }

    /// Render as `auto=format,compress&q=..[&w=..][&dpr=..]`.
    pub fn to_query(&self) -> String {
        let mut query = format!("{}&q={}", AUTO_PARAMS, self.quality);
        if let Some(width) = self.width {
            query.push_str(&format!("&w={}", width));
        }
        if let Some(dpr) = self.dpr {
            query.push_str(&format!("&dpr={}", dpr));
        }
        query
    }
}

/// Derive the annotated delivery URL for an image.
///
/// Appends with `&` when the URL already carries a query string, `?`
/// otherwise. Existing parameters are never rewritten, so deriving twice
/// appends twice.
pub fn derive_delivery_url(image: &ImageMetadata) -> String {
    let params = DeliveryParams::for_image(image).to_query();
    let separator = if image.url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", image.url, separator, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_huge_wide_image() {
        let image = ImageMetadata::new("https://x/img.jpg", 3000, 1000, 11_000_000);
        assert_eq!(
            derive_delivery_url(&image),
            "https://x/img.jpg?auto=format,compress&q=75&w=2000&dpr=2"
        );
    }

    #[test]
    fn test_small_image_with_existing_query() {
        let image = ImageMetadata::new("https://x/img.jpg?v=2", 800, 600, 1_000_000);
        assert_eq!(
            derive_delivery_url(&image),
            "https://x/img.jpg?v=2&auto=format,compress&q=85"
        );
    }

    #[test]
    fn test_large_narrow_image_has_no_width_override() {
        let image = ImageMetadata::new("https://x/img.png", 1200, 900, 6 * 1024 * 1024);
        assert_eq!(
            derive_delivery_url(&image),
            "https://x/img.png?auto=format,compress&q=75"
        );
    }

    #[test]
    fn test_tier_boundaries_belong_to_lower_tier() {
        assert_eq!(OptimizationTier::for_size(0), OptimizationTier::Standard);
        assert_eq!(
            OptimizationTier::for_size(LARGE_IMAGE_THRESHOLD),
            OptimizationTier::Standard
        );
        assert_eq!(
            OptimizationTier::for_size(LARGE_IMAGE_THRESHOLD + 1),
            OptimizationTier::Large
        );
        assert_eq!(
            OptimizationTier::for_size(HUGE_IMAGE_THRESHOLD),
            OptimizationTier::Large
        );
        assert_eq!(
            OptimizationTier::for_size(HUGE_IMAGE_THRESHOLD + 1),
            OptimizationTier::Huge
        );
    }

    #[test]
    fn test_width_exactly_at_cap_is_not_overridden() {
        let image = ImageMetadata::new("https://x/img.jpg", 2000, 2000, 20_000_000);
        let params = DeliveryParams::for_image(&image);
        assert_eq!(params.width, None);
        assert_eq!(params.dpr, Some(HIGH_DENSITY_DPR));
    }

    #[test]
    fn test_requires_replacement() {
        assert!(!OptimizationTier::Standard.requires_replacement());
        assert!(OptimizationTier::Large.requires_replacement());
        assert!(OptimizationTier::Huge.requires_replacement());
    }

    #[test]
    fn test_deriving_twice_appends() {
        let image = ImageMetadata::new("https://x/img.jpg", 800, 600, 1_000);
        let once = derive_delivery_url(&image);
        let twice = derive_delivery_url(&ImageMetadata::new(once.clone(), 800, 600, 1_000));
        assert_eq!(twice, format!("{}&auto=format,compress&q=85", once));
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
