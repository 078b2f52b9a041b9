//! Application layer for MedScan.
//!
//! This crate provides the image store that coordinates the domain types with
//! a transport implementation from the infrastructure layer.

pub mod image_store;

pub use image_store::{ImageStore, StoreState};
