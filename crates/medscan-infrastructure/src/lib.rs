//! Infrastructure layer for MedScan.
//!
//! Provides the HTTP transport to the MedScan API and the client
//! configuration it is built from.

pub mod config;
pub mod http_transport;

pub use config::ApiConfig;
pub use http_transport::HttpImageTransport;
