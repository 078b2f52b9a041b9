//! Error types for the MedScan client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the MedScan client crates.
///
/// Transport collaborators raise the transport-facing variants; the image store
/// wraps every failed command into [`MedscanError::OperationFailed`] carrying the
/// same message it records as its last error.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MedscanError {
    /// The remote service answered with an error status.
    #[error("Request rejected (status {status}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: u16,
        /// Human-readable message supplied by the server, if any.
        message: Option<String>,
    },

    /// The request never produced a response (connection, timeout, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be interpreted as an image record.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The upload was refused before transmission.
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// An upload was requested while another one is still outstanding.
    #[error("An upload is already in progress")]
    UploadInProgress,

    /// A store command failed; the message matches the store's last error.
    #[error("{0}")]
    OperationFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },
}

impl MedscanError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Rejected error
    pub fn rejected(status: u16, message: Option<String>) -> Self {
        Self::Rejected { status, message }
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates an InvalidPayload error
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }

    /// Creates an InvalidUpload error
    pub fn invalid_upload(message: impl Into<String>) -> Self {
        Self::InvalidUpload(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Rejected error
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Check if this is a Network error
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns the human-readable message worth showing to a user verbatim.
    ///
    /// Only messages that came from the server (or from upload validation,
    /// which mirrors the server's own rules) qualify. Everything else returns
    /// `None` so callers fall back to a generic per-operation message.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message),
            Self::InvalidUpload(message) => Some(message),
            _ => None,
        }
    }

    /// Resolves the message to surface, falling back to `default`.
    pub fn message_or(&self, default: &str) -> String {
        self.server_message().unwrap_or(default).to_string()
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for MedscanError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MedscanError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MedscanError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, MedscanError>`.
pub type Result<T> = std::result::Result<T, MedscanError>;
