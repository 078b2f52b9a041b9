//! Upload request model.

use std::path::Path;

use crate::error::{MedscanError, Result};

/// Largest payload the service accepts (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// File extensions the service accepts, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "dicom", "dcm"];

/// A binary image plus the metadata sent alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Original file name; its extension decides acceptance.
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub title: String,
    pub description: String,
}

impl UploadRequest {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            title: String::new(),
            description: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Reads a file from disk into an upload request named after the file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                MedscanError::invalid_upload(format!("'{}' has no usable file name", path.display()))
            })?
            .to_string();
        let bytes = std::fs::read(path)?;
        Ok(Self::new(file_name, bytes))
    }

    /// Lower-cased extension of `file_name`, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    /// MIME type announced for the multipart file part.
    pub fn content_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("dcm") | Some("dicom") => "application/dicom",
            _ => "application/octet-stream",
        }
    }

    /// Checks the request against the service's upload rules.
    pub fn validate(&self) -> Result<()> {
        if self.bytes.is_empty() {
            return Err(MedscanError::invalid_upload("Image file is empty"));
        }

        if self.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(MedscanError::invalid_upload(
                "Image file size cannot exceed 10MB",
            ));
        }

        let extension = self.extension().unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(MedscanError::invalid_upload(format!(
                "File extension \"{}\" is not allowed. Allowed extensions are: {}",
                extension,
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        Ok(())
    }
}
