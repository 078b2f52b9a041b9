use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use medscan_core::error::{MedscanError, Result};
use medscan_core::image::{Image, ImageId, ImageTransport, ProgressCallback, UploadRequest};
use tokio::sync::watch;

use super::state::{RequestSeq, StoreEvent, StoreState};

const LIST_FAILED: &str = "Failed to fetch images";
const UPLOAD_FAILED: &str = "Failed to upload image";
const DETAIL_FAILED: &str = "Failed to fetch image";
const DELETE_FAILED: &str = "Failed to delete image";

/// Client-side store synchronizing a local view of the remote image collection.
///
/// `ImageStore` is responsible for:
/// - Issuing list / upload / fetch-one / delete commands through the transport
/// - Tracking per-operation loading flags, upload progress and the last error
/// - Publishing a fresh [`StoreState`] snapshot after every transition
///
/// The store is a cheap handle: clones share the same state and transport.
/// Commands may run concurrently; each transition is applied atomically.
///
/// Upload is optimistic (the returned record is inserted as soon as the
/// transport reports success) while delete is pessimistic (the entry is only
/// removed after the service confirms). A list response is authoritative and
/// may drop an upload that completed while it was in flight.
pub struct ImageStore<T: ImageTransport> {
    transport: Arc<T>,
    state: Arc<watch::Sender<StoreState<T::Payload>>>,
    next_seq: Arc<AtomicU64>,
}

impl<T: ImageTransport> Clone for ImageStore<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            state: self.state.clone(),
            next_seq: self.next_seq.clone(),
        }
    }
}

impl<T: ImageTransport> ImageStore<T> {
    /// Creates a store with an empty collection and all flags cleared.
    pub fn new(transport: Arc<T>) -> Self {
        let (state, _) = watch::channel(StoreState::new());
        Self {
            transport,
            state: Arc::new(state),
            next_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> StoreState<T::Payload> {
        self.state.borrow().clone()
    }

    /// Subscribes to state snapshots; the receiver is notified after every
    /// applied transition.
    pub fn subscribe(&self) -> watch::Receiver<StoreState<T::Payload>> {
        self.state.subscribe()
    }

    /// Replaces the collection with the server's.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` carrying the failure message. The message is
    /// also recorded as the last error unless a newer list request was issued
    /// meanwhile; a superseded completion, success or failure, leaves the
    /// state to the newer request.
    pub async fn fetch_all(&self) -> Result<()> {
        let seq = self.issue();
        self.dispatch(StoreEvent::ListRequested { seq });
        tracing::debug!(seq, "Fetching image list");

        match self.transport.list().await {
            Ok(images) => {
                let count = images.len();
                if self.dispatch(StoreEvent::ListSucceeded { seq, images }) {
                    tracing::info!(seq, count, "Image list loaded");
                } else {
                    tracing::warn!(seq, "Discarding superseded image list response");
                }
                Ok(())
            }
            Err(err) => {
                let message = err.message_or(LIST_FAILED);
                if !self.dispatch(StoreEvent::ListFailed {
                    seq,
                    message: message.clone(),
                }) {
                    tracing::warn!(seq, "Discarding superseded image list failure");
                }
                tracing::warn!(seq, error = %err, "Fetching image list failed");
                Err(MedscanError::OperationFailed(message))
            }
        }
    }

    /// Uploads an image and prepends the created record to the collection.
    ///
    /// Progress reported by the transport is clamped to `0..=100` and never
    /// moves backwards. A record whose id is already present replaces that
    /// entry in place.
    ///
    /// # Errors
    ///
    /// - `UploadInProgress` if another upload is outstanding (state untouched)
    /// - `OperationFailed` if the transport fails
    pub async fn upload(&self, request: UploadRequest) -> Result<Image<T::Payload>> {
        let seq = self.issue();
        let mut started = false;
        self.state.send_if_modified(|state| {
            if state.is_uploading() {
                return false;
            }
            started = state.apply(StoreEvent::UploadRequested { seq });
            started
        });
        if !started {
            tracing::warn!(seq, "Refusing upload while another upload is in flight");
            return Err(MedscanError::UploadInProgress);
        }
        tracing::debug!(seq, file = %request.file_name, bytes = request.bytes.len(), "Uploading image");

        let state = self.state.clone();
        let on_progress: ProgressCallback = Arc::new(move |percent| {
            state.send_if_modified(|s| s.apply(StoreEvent::UploadProgressed { seq, percent }));
        });

        match self.transport.create(request, on_progress).await {
            Ok(image) => {
                tracing::info!(seq, id = %image.id, "Image uploaded");
                self.dispatch(StoreEvent::UploadSucceeded {
                    seq,
                    image: image.clone(),
                });
                Ok(image)
            }
            Err(err) => {
                let message = err.message_or(UPLOAD_FAILED);
                self.dispatch(StoreEvent::UploadFailed {
                    seq,
                    message: message.clone(),
                });
                tracing::warn!(seq, error = %err, "Uploading image failed");
                Err(MedscanError::OperationFailed(message))
            }
        }
    }

    /// Loads a single image into the selection slot.
    ///
    /// The collection is not updated from the result. On failure the previous
    /// selection is kept.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` carrying the failure message. The message is
    /// also recorded as the last error unless a newer fetch was issued
    /// meanwhile, in which case the state is left to that fetch.
    pub async fn fetch_one(&self, id: &ImageId) -> Result<Image<T::Payload>> {
        let seq = self.issue();
        self.dispatch(StoreEvent::DetailRequested { seq });
        tracing::debug!(seq, %id, "Fetching image");

        match self.transport.get(id).await {
            Ok(image) => {
                if !self.dispatch(StoreEvent::DetailSucceeded {
                    seq,
                    image: image.clone(),
                }) {
                    tracing::warn!(seq, %id, "Discarding superseded image response");
                }
                Ok(image)
            }
            Err(err) => {
                let message = err.message_or(DETAIL_FAILED);
                if !self.dispatch(StoreEvent::DetailFailed {
                    seq,
                    message: message.clone(),
                }) {
                    tracing::warn!(seq, %id, "Discarding superseded image failure");
                }
                tracing::warn!(seq, %id, error = %err, "Fetching image failed");
                Err(MedscanError::OperationFailed(message))
            }
        }
    }

    /// Deletes an image, removing it locally once the service confirms.
    ///
    /// Deleting an id that is not in the collection succeeds without changing it.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` with the message recorded as the last error;
    /// the collection is unchanged.
    pub async fn delete(&self, id: &ImageId) -> Result<()> {
        self.dispatch(StoreEvent::DeleteRequested);
        tracing::debug!(%id, "Deleting image");

        match self.transport.remove(id).await {
            Ok(()) => {
                self.dispatch(StoreEvent::DeleteSucceeded { id: id.clone() });
                tracing::info!(%id, "Image deleted");
                Ok(())
            }
            Err(err) => {
                let message = err.message_or(DELETE_FAILED);
                self.dispatch(StoreEvent::DeleteFailed {
                    message: message.clone(),
                });
                tracing::warn!(%id, error = %err, "Deleting image failed");
                Err(MedscanError::OperationFailed(message))
            }
        }
    }

    /// Clears the last error.
    pub fn clear_error(&self) {
        self.dispatch(StoreEvent::ErrorCleared);
    }

    /// Resets upload progress to 0, e.g. once a finished upload was acknowledged.
    ///
    /// Ignored while an upload is in flight.
    pub fn reset_upload_progress(&self) {
        self.dispatch(StoreEvent::UploadProgressReset);
    }

    fn issue(&self) -> RequestSeq {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Applies one transition and notifies subscribers if it took effect.
    fn dispatch(&self, event: StoreEvent<T::Payload>) -> bool {
        self.state.send_if_modified(|state| state.apply(event))
    }
}
