//! ResumeStore library -- object storage gateway for a resume builder.
//!
//! This crate stores user pictures, resume previews and exported resume
//! PDFs in an S3-compatible object store and hands back public URLs for
//! them.  It provides the storage gateway, the object store clients it
//! runs on, image normalization, and the HTTP surface other services call.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod imaging;
pub mod metrics;
pub mod server;
pub mod storage;

use crate::config::Config;
use crate::storage::service::StorageService;

/// Shared application state passed to all handlers via `axum::extract::State`.
pub struct AppState {
    /// Service configuration.
    pub config: Config,
    /// Storage gateway over the shared object store client.
    pub storage: StorageService,
}
