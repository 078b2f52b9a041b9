//! Image store.
//!
//! This module contains the client-side state container for the remote image
//! collection: the [`StoreState`] snapshot, its transition table, and the
//! async [`ImageStore`] that drives commands through an
//! [`medscan_core::image::ImageTransport`].

mod state;
mod store;


pub use state::StoreState;
pub use store::ImageStore;
