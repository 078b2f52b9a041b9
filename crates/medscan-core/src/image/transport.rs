//! Image transport trait.
//!
//! Defines the interface to the remote image collection.

use async_trait::async_trait;

use super::model::{Image, ImageId};
use super::progress::ProgressCallback;
use super::upload::UploadRequest;
use crate::error::Result;

/// An abstract gateway to the remote image collection.
///
/// This trait decouples the image store from the specific transport
/// (HTTP API, in-process fake, ...). Each call is single-shot: no retries,
/// and timeouts are the implementation's business.
///
/// # Implementation Notes
///
/// Failures should be reported as [`crate::MedscanError::Rejected`] when the
/// service answered, carrying the server-supplied message if one was present,
/// so the store can surface it verbatim.
#[async_trait]
pub trait ImageTransport: Send + Sync {
    /// Payload carried next to each image's `id`.
    type Payload: Clone + Send + Sync + 'static;

    /// Fetches the whole collection in server order.
    async fn list(&self) -> Result<Vec<Image<Self::Payload>>>;

    /// Uploads a new image.
    ///
    /// # Arguments
    ///
    /// * `upload` - The file and metadata to send
    /// * `on_progress` - Invoked zero or more times with the percentage sent
    ///
    /// # Returns
    ///
    /// The canonical record created by the service.
    async fn create(
        &self,
        upload: UploadRequest,
        on_progress: ProgressCallback,
    ) -> Result<Image<Self::Payload>>;

    /// Fetches a single image by id.
    async fn get(&self, id: &ImageId) -> Result<Image<Self::Payload>>;

    /// Deletes an image by id.
    async fn remove(&self, id: &ImageId) -> Result<()>;
}
