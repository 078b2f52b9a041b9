//! Image domain model.
//!
//! An [`Image`] is the record the remote service returns for one uploaded
//! medical image. The store only relies on its `id`; everything else travels
//! as an opaque payload `P` that round-trips unchanged.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MedscanError, Result};

/// Identifier assigned by the remote service once an upload is confirmed.
///
/// The service may use integer primary keys or opaque strings; both are kept
/// in the shape they arrived in so the record serializes back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageId::Number(n) => f.pad(&n.to_string()),
            ImageId::Text(s) => f.pad(s),
        }
    }
}

impl From<u64> for ImageId {
    fn from(value: u64) -> Self {
        ImageId::Number(value)
    }
}

impl From<&str> for ImageId {
    fn from(value: &str) -> Self {
        ImageId::Text(value.to_string())
    }
}

impl From<String> for ImageId {
    fn from(value: String) -> Self {
        ImageId::Text(value)
    }
}

impl FromStr for ImageId {
    type Err = MedscanError;

    /// Parses all-digit input as a numeric id, anything else as text.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MedscanError::invalid_payload("image id must not be empty"));
        }
        Ok(match trimmed.parse::<u64>() {
            Ok(n) => ImageId::Number(n),
            Err(_) => ImageId::Text(trimmed.to_string()),
        })
    }
}

/// One image record: the server-assigned `id` plus an opaque payload.
///
/// The payload's fields are flattened next to `id` on the wire, so
/// `{"id": 3, "title": "Scan"}` deserializes into `Image { id: 3, payload: {"title": "Scan"} }`
/// for the default `serde_json::Value` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image<P = Value> {
    pub id: ImageId,
    #[serde(flatten)]
    pub payload: P,
}

impl<P> Image<P> {
    pub fn new(id: impl Into<ImageId>, payload: P) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

impl<P: DeserializeOwned> Image<P> {
    /// Builds an image from an untyped JSON record.
    ///
    /// Only the `id` field is validated up front; the payload must merely
    /// deserialize into `P`.
    pub fn from_value(value: Value) -> Result<Self> {
        match value.get("id") {
            None | Some(Value::Null) => {
                return Err(MedscanError::invalid_payload("image record has no id"));
            }
            Some(Value::Number(n)) if n.as_u64().is_none() => {
                return Err(MedscanError::invalid_payload(format!(
                    "image id must be a non-negative integer or a string, got {n}"
                )));
            }
            Some(Value::Number(_)) | Some(Value::String(_)) => {}
            Some(other) => {
                return Err(MedscanError::invalid_payload(format!(
                    "image id must be a number or a string, got {other}"
                )));
            }
        }

        serde_json::from_value(value).map_err(|e| MedscanError::invalid_payload(e.to_string()))
    }
}

/// Analysis lifecycle derived from a [`MedicalImage`]'s timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Uploaded, analysis not started yet.
    Pending,
    /// Analysis started but not completed.
    InProgress,
    /// Analysis finished.
    Completed,
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::InProgress => "in progress",
            AnalysisStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Typed payload of an analysis record as served by the MedScan API.
///
/// Every field is optional so partially populated records still parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalImage {
    /// Owner's user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    /// Storage path of the uploaded file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Absolute URL of the uploaded file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub analyzed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// File size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl MedicalImage {
    pub fn analysis_status(&self) -> AnalysisStatus {
        if self.analyzed || self.analysis_completed_at.is_some() {
            AnalysisStatus::Completed
        } else if self.analysis_started_at.is_some() {
            AnalysisStatus::InProgress
        } else {
            AnalysisStatus::Pending
        }
    }

    /// Title to show in listings; falls back to "Image" like the service does.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Image"
        } else {
            &self.title
        }
    }

    /// `WIDTHxHEIGHT` when both dimensions are known.
    pub fn dimensions(&self) -> Option<String> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(format!("{w}x{h}")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_opaque_payload_round_trips_unchanged() {
        let raw = json!({
            "id": 7,
            "title": "Chest X-Ray",
            "custom": {"nested": [1, 2, 3]},
            "analyzed": false
        });

        let image: Image = Image::from_value(raw.clone()).unwrap();
        assert_eq!(image.id, ImageId::Number(7));
        assert_eq!(image.payload["title"], "Chest X-Ray");
        assert!(image.payload.get("id").is_none());

        let back = serde_json::to_value(&image).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_string_id_is_kept_as_text() {
        let image: Image = Image::from_value(json!({"id": "scan-42"})).unwrap();
        assert_eq!(image.id, ImageId::Text("scan-42".into()));
        assert_eq!(image.id.to_string(), "scan-42");
    }

    #[test]
    fn test_missing_id_is_rejected() {
        let err = Image::<Value>::from_value(json!({"title": "no id"})).unwrap_err();
        assert!(matches!(err, MedscanError::InvalidPayload(_)));
    }

    #[test]
    fn test_null_id_is_rejected() {
        let err = Image::<Value>::from_value(json!({"id": null})).unwrap_err();
        assert!(matches!(err, MedscanError::InvalidPayload(_)));
    }

    #[test]
    fn test_negative_or_object_id_is_rejected() {
        assert!(Image::<Value>::from_value(json!({"id": -1})).is_err());
        assert!(Image::<Value>::from_value(json!({"id": {"pk": 1}})).is_err());
    }

    #[test]
    fn test_typed_payload_parses_service_record() {
        let raw = json!({
            "id": 12,
            "user": 3,
            "user_email": "doctor@example.com",
            "image": "medical_images/2024/05/01/brain.png",
            "image_url": "http://localhost:8000/media/medical_images/2024/05/01/brain.png",
            "title": "Brain MRI",
            "description": "Axial slice",
            "analyzed": false,
            "analysis_started_at": "2024-05-01T10:00:00Z",
            "analysis_completed_at": null,
            "uploaded_at": "2024-05-01T09:59:00Z",
            "updated_at": "2024-05-01T10:00:00Z",
            "width": 512,
            "height": 512,
            "file_size": 204800
        });

        let image: Image<MedicalImage> = Image::from_value(raw).unwrap();
        assert_eq!(image.id, ImageId::Number(12));
        assert_eq!(image.payload.display_title(), "Brain MRI");
        assert_eq!(image.payload.analysis_status(), AnalysisStatus::InProgress);
        assert_eq!(image.payload.dimensions().as_deref(), Some("512x512"));
        assert_eq!(image.payload.file_size, Some(204800));
    }

    #[test]
    fn test_analysis_status_transitions() {
        let mut record = MedicalImage::default();
        assert_eq!(record.analysis_status(), AnalysisStatus::Pending);

        record.analysis_started_at = Some(Utc::now());
        assert_eq!(record.analysis_status(), AnalysisStatus::InProgress);

        record.analyzed = true;
        assert_eq!(record.analysis_status(), AnalysisStatus::Completed);
    }

    #[test]
    fn test_display_title_falls_back() {
        let record = MedicalImage::default();
        assert_eq!(record.display_title(), "Image");
        assert!(record.dimensions().is_none());
    }

    #[test]
    fn test_image_id_from_str() {
        assert_eq!("15".parse::<ImageId>().unwrap(), ImageId::Number(15));
        assert_eq!(" abc ".parse::<ImageId>().unwrap(), ImageId::Text("abc".into()));
        assert!("".parse::<ImageId>().is_err());
    }
}
