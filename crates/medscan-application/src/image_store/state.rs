//! Image store state and its transition table.
//!
//! [`StoreState`] is the read-only snapshot consumers see. Every change to it
//! goes through [`StoreState::apply`] with a [`StoreEvent`], one event per
//! indivisible transition.

use medscan_core::image::{Image, ImageId};
use serde_json::Value;

/// Identifies one issued command so late completions can be recognised.
pub(crate) type RequestSeq = u64;

/// A single state transition.
///
/// Each command produces a `*Requested` event followed by exactly one
/// `*Succeeded` or `*Failed` event carrying the same sequence number.
#[derive(Debug, Clone)]
pub(crate) enum StoreEvent<P> {
    ListRequested { seq: RequestSeq },
    ListSucceeded { seq: RequestSeq, images: Vec<Image<P>> },
    ListFailed { seq: RequestSeq, message: String },

    UploadRequested { seq: RequestSeq },
    UploadProgressed { seq: RequestSeq, percent: i64 },
    UploadSucceeded { seq: RequestSeq, image: Image<P> },
    UploadFailed { seq: RequestSeq, message: String },

    DetailRequested { seq: RequestSeq },
    DetailSucceeded { seq: RequestSeq, image: Image<P> },
    DetailFailed { seq: RequestSeq, message: String },

    DeleteRequested,
    DeleteSucceeded { id: ImageId },
    DeleteFailed { message: String },

    ErrorCleared,
    UploadProgressReset,
}

/// Snapshot of the image collection and of outstanding asynchronous work.
#[derive(Debug, Clone)]
pub struct StoreState<P = Value> {
    images: Vec<Image<P>>,
    selected: Option<Image<P>>,
    upload_progress: u8,
    last_error: Option<String>,

    /// Newest list request; only its completion is applied.
    list_pending: Option<RequestSeq>,
    /// Newest single-image request; only its completion is applied.
    detail_pending: Option<RequestSeq>,
    /// The one upload allowed in flight.
    upload_pending: Option<RequestSeq>,
    /// Deletes may overlap, so they are counted rather than fenced.
    deletes_pending: usize,
}

impl<P> Default for StoreState<P> {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            selected: None,
            upload_progress: 0,
            last_error: None,
            list_pending: None,
            detail_pending: None,
            upload_pending: None,
            deletes_pending: 0,
        }
    }
}

impl<P> StoreState<P> {
    /// Creates the initial state: empty collection, all flags false.
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================================
    // Read-only views
    // ============================================================================

    /// The collection in display order.
    pub fn images(&self) -> &[Image<P>] {
        &self.images
    }

    /// The image last loaded by a single-image fetch.
    ///
    /// Not reconciled with [`Self::images`]; a failed fetch keeps the stale value.
    pub fn selected(&self) -> Option<&Image<P>> {
        self.selected.as_ref()
    }

    pub fn find(&self, id: &ImageId) -> Option<&Image<P>> {
        self.images.iter().find(|image| &image.id == id)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn is_list_loading(&self) -> bool {
        self.list_pending.is_some()
    }

    pub fn is_detail_loading(&self) -> bool {
        self.detail_pending.is_some()
    }

    pub fn is_deleting(&self) -> bool {
        self.deletes_pending > 0
    }

    /// True while a delete or a single-image fetch is outstanding.
    pub fn is_mutating(&self) -> bool {
        self.is_deleting() || self.is_detail_loading()
    }

    pub fn is_uploading(&self) -> bool {
        self.upload_pending.is_some()
    }

    /// True while any command is outstanding.
    pub fn is_busy(&self) -> bool {
        self.is_list_loading() || self.is_mutating() || self.is_uploading()
    }

    /// Percentage of the current upload sent, in `0..=100`.
    pub fn upload_progress(&self) -> u8 {
        self.upload_progress
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // ============================================================================
    // Transitions
    // ============================================================================

    /// Applies one transition.
    ///
    /// Returns `false` when the event was discarded: completions of superseded
    /// list/detail requests, progress reports that do not belong to the
    /// upload in flight or would not move progress forward, and progress
    /// resets while an upload is running.
    pub(crate) fn apply(&mut self, event: StoreEvent<P>) -> bool {
        match event {
            StoreEvent::ListRequested { seq } => {
                self.list_pending = Some(seq);
                self.last_error = None;
            }
            StoreEvent::ListSucceeded { seq, images } => {
                if self.list_pending != Some(seq) {
                    return false;
                }
                self.list_pending = None;
                self.images = dedup_by_id(images);
                self.last_error = None;
            }
            StoreEvent::ListFailed { seq, message } => {
                if self.list_pending != Some(seq) {
                    return false;
                }
                self.list_pending = None;
                self.last_error = Some(message);
            }

            StoreEvent::UploadRequested { seq } => {
                self.upload_pending = Some(seq);
                self.upload_progress = 0;
                self.last_error = None;
            }
            StoreEvent::UploadProgressed { seq, percent } => {
                if self.upload_pending != Some(seq) {
                    return false;
                }
                let percent = percent.clamp(0, 100) as u8;
                if percent <= self.upload_progress {
                    return false;
                }
                self.upload_progress = percent;
            }
            StoreEvent::UploadSucceeded { seq, image } => {
                if self.upload_pending != Some(seq) {
                    return false;
                }
                self.upload_pending = None;
                self.upload_progress = 100;
                self.last_error = None;
                match self.images.iter().position(|existing| existing.id == image.id) {
                    Some(index) => self.images[index] = image,
                    None => self.images.insert(0, image),
                }
            }
            StoreEvent::UploadFailed { seq, message } => {
                if self.upload_pending != Some(seq) {
                    return false;
                }
                self.upload_pending = None;
                self.upload_progress = 0;
                self.last_error = Some(message);
            }

            StoreEvent::DetailRequested { seq } => {
                self.detail_pending = Some(seq);
                self.last_error = None;
            }
            StoreEvent::DetailSucceeded { seq, image } => {
                if self.detail_pending != Some(seq) {
                    return false;
                }
                self.detail_pending = None;
                self.selected = Some(image);
                self.last_error = None;
            }
            StoreEvent::DetailFailed { seq, message } => {
                if self.detail_pending != Some(seq) {
                    return false;
                }
                self.detail_pending = None;
                self.last_error = Some(message);
            }

            StoreEvent::DeleteRequested => {
                self.deletes_pending += 1;
                self.last_error = None;
            }
            StoreEvent::DeleteSucceeded { id } => {
                self.deletes_pending = self.deletes_pending.saturating_sub(1);
                self.images.retain(|image| image.id != id);
                self.last_error = None;
            }
            StoreEvent::DeleteFailed { message } => {
                self.deletes_pending = self.deletes_pending.saturating_sub(1);
                self.last_error = Some(message);
            }

            StoreEvent::ErrorCleared => {
                self.last_error = None;
            }
            StoreEvent::UploadProgressReset => {
                // Progress only restarts with the next upload
                if self.upload_pending.is_some() {
                    return false;
                }
                self.upload_progress = 0;
            }
        }
        true
    }
}

/// Keeps the first occurrence of every id, preserving order.
fn dedup_by_id<P>(images: Vec<Image<P>>) -> Vec<Image<P>> {
    let mut seen = std::collections::HashSet::with_capacity(images.len());
    images
        .into_iter()
        .filter(|image| seen.insert(image.id.clone()))
        .collect()
}
