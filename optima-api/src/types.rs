//! Webhook request and response types

use chrono::{DateTime, Utc};
use optima_core::{AssetId, ImageMetadata};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};

/// Entity type whose events are eligible for optimization.
pub const UPLOAD_ENTITY_TYPE: &str = "upload";

// ============================================================================
// INBOUND
// ============================================================================

/// Event delivered by the content store's webhook.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookEvent {
    pub entity_type: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub entity: Option<WebhookEntity>,
}

impl WebhookEvent {
    /// The upload, if this event is about an image upload.
    ///
    /// Attributes are typed only after the entity is known to be an upload.
    /// An upload whose attributes or id do not fit the store's upload
    /// schema is an error.
    pub fn image_upload(&self) -> ApiResult<Option<ImageUpload>> {
        if self.entity_type != UPLOAD_ENTITY_TYPE {
            return Ok(None);
        }
        let Some(entity) = &self.entity else {
            return Ok(None);
        };

        let attributes: UploadAttributes =
            serde_json::from_value(serde_json::Value::Object(entity.attributes.clone()))
                .map_err(|e| ApiError::invalid_input(format!("Invalid upload attributes: {}", e)))?;
        if !attributes.is_image {
            return Ok(None);
        }

        let asset_id = AssetId::new(entity.id.as_str());
        if !asset_id.is_path_safe() {
            return Err(ApiError::invalid_format(
                "entity.id",
                "ASCII letters, digits, '-' or '_'",
            ));
        }

        Ok(Some(ImageUpload {
            asset_id,
            attributes,
        }))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookEntity {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Shape depends on the entity type. Record entities carry arbitrary
    /// model fields; uploads follow [`UploadAttributes`].
    #[serde(default)]
    #[schema(value_type = Object)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// An image upload with typed attributes.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub asset_id: AssetId,
    pub attributes: UploadAttributes,
}

impl ImageUpload {
    /// Metadata for the deriver. `None` when the upload has no URL.
    pub fn image_metadata(&self) -> Option<ImageMetadata> {
        let attributes = &self.attributes;
        let url = attributes.url.as_deref().filter(|url| !url.trim().is_empty())?;
        Some(ImageMetadata::new(
            url,
            attributes.width.unwrap_or(0),
            attributes.height.unwrap_or(0),
            attributes.size.unwrap_or(0),
        ))
    }

    pub fn filename(&self) -> Option<&str> {
        self.attributes.filename.as_deref()
    }
}

/// Upload attributes. Numeric fields are unsigned; a negative value fails
/// deserialization. Non-image uploads carry `null` dimensions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UploadAttributes {
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub width: Option<u64>,
    #[serde(default)]
    pub height: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub is_image: bool,
    #[serde(default)]
    pub filename: Option<String>,
}

// ============================================================================
// OUTBOUND
// ============================================================================

/// Response body returned to the webhook sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub received: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized_url: Option<String>,
    /// Present only when a replacement was attempted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_replaced: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookResponse {
    pub fn received(message: impl Into<String>) -> Self {
        Self {
            received: true,
            message: message.into(),
            timestamp: Utc::now(),
            optimized_url: None,
            asset_replaced: None,
            error: None,
        }
    }

    /// Body for a request that could not be processed at all.
    pub fn rejected(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            received: false,
            error: Some(error.into()),
            ..Self::received(message)
        }
    }

    pub fn with_optimized_url(mut self, url: impl Into<String>) -> Self {
        self.optimized_url = Some(url.into());
        self
    }

    pub fn with_replacement(mut self, replaced: bool, error: Option<String>) -> Self {
        self.asset_replaced = Some(replaced);
        self.error = error;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn event(value: serde_json::Value) -> Result<WebhookEvent, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_image_upload_filters_entity_type_and_flag() -> Result<(), Box<dyn std::error::Error>> {
        let upload = event(serde_json::json!({
            "entity_type": "upload",
            "event_type": "create",
            "entity": { "id": "1", "type": "upload", "attributes": { "is_image": true, "url": "https://x/a.jpg" } }
        }))?;
        assert!(upload.image_upload()?.is_some());

        let not_image = event(serde_json::json!({
            "entity_type": "upload",
            "event_type": "create",
            "entity": { "id": "1", "type": "upload", "attributes": { "is_image": false } }
        }))?;
        assert!(not_image.image_upload()?.is_none());

        let item = event(serde_json::json!({
            "entity_type": "item",
            "event_type": "update",
            "entity": { "id": "1", "type": "item", "attributes": { "is_image": true } }
        }))?;
        assert!(item.image_upload()?.is_none());
        Ok(())
    }

    #[test]
    fn test_null_dimensions_default_to_zero() -> Result<(), Box<dyn std::error::Error>> {
        let upload = event(serde_json::json!({
            "entity_type": "upload",
            "event_type": "create",
            "entity": {
                "id": "7",
                "type": "upload",
                "attributes": { "is_image": true, "url": "https://x/a.jpg", "width": null, "height": null, "size": 10 }
            }
        }))?;
        let metadata = upload.image_upload()?.and_then(|image| image.image_metadata());
        assert_eq!(metadata, Some(ImageMetadata::new("https://x/a.jpg", 0, 0, 10)));
        Ok(())
    }

    #[test]
    fn test_record_fields_are_not_typed_as_upload() -> Result<(), Box<dyn std::error::Error>> {
        let item = event(serde_json::json!({
            "entity_type": "item",
            "event_type": "update",
            "entity": {
                "id": "42",
                "type": "item",
                "attributes": { "size": "XL", "width": [1, 2], "is_image": "yes", "url": 7 }
            }
        }))?;
        assert!(item.image_upload()?.is_none());
        Ok(())
    }

    #[test]
    fn test_negative_upload_size_is_rejected() -> Result<(), serde_json::Error> {
        let upload = event(serde_json::json!({
            "entity_type": "upload",
            "entity": { "id": "7", "attributes": { "is_image": true, "size": -1 } }
        }))?;
        let err = upload.image_upload().err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::InvalidInput));
        Ok(())
    }

    #[test]
    fn test_unsafe_upload_id_is_rejected() -> Result<(), serde_json::Error> {
        let upload = event(serde_json::json!({
            "entity_type": "upload",
            "entity": { "id": "7/../8", "attributes": { "is_image": true, "url": "https://x/a.jpg" } }
        }))?;
        let err = upload.image_upload().err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::InvalidFormat));
        Ok(())
    }

    #[test]
    fn test_response_omits_absent_fields() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(WebhookResponse::received("Event ignored"))?;
        assert_eq!(json["received"], true);
        assert!(json.get("optimizedUrl").is_none());
        assert!(json.get("assetReplaced").is_none());
        assert!(json.get("error").is_none());
        assert!(json["timestamp"].as_str().is_some());

        let json = serde_json::to_value(
            WebhookResponse::received("Image optimized")
                .with_optimized_url("https://x/a.jpg?q=75")
                .with_replacement(false, Some("boom".to_string())),
        )?;
        assert_eq!(json["optimizedUrl"], "https://x/a.jpg?q=75");
        assert_eq!(json["assetReplaced"], false);
        assert_eq!(json["error"], "boom");
        Ok(())
    }
}
