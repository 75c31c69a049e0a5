//! Object storage.
//!
//! [`service::StorageService`] is the gateway the rest of the application
//! uses.  It runs on any [`client::ObjectStoreClient`]: the S3 client for
//! real deployments, the in-memory client for tests and local runs, and
//! the instrumenting decorator that wraps either.

pub mod client;
pub mod instrumented;
pub mod memory;
pub mod path;
pub mod policy;
pub mod s3;
pub mod service;
