//! Domain layer for MedScan.
//!
//! Holds the image record types, the upload request model and the
//! [`image::ImageTransport`] port the application layer talks through.

pub mod error;
pub mod image;

// Re-export common error type
pub use error::{MedscanError, Result};
