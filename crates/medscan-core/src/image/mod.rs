//! Image domain module.
//!
//! # Module Structure
//!
//! - `model`: Image record and identifiers (`Image`, `ImageId`, `MedicalImage`)
//! - `upload`: Upload request and its validation rules (`UploadRequest`)
//! - `progress`: Upload progress callback and percentage math
//! - `transport`: Port to the remote collection (`ImageTransport`)

mod model;
mod progress;
mod transport;
mod upload;

pub use model::{AnalysisStatus, Image, ImageId, MedicalImage};
pub use progress::{ProgressCallback, ignore_progress, progress_percent};
pub use transport::ImageTransport;
pub use upload::{ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES, UploadRequest};
