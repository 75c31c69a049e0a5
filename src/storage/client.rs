//! Object store client trait.
//!
//! [`ObjectStoreClient`] is the narrow contract the storage gateway needs
//! from a bucket-oriented object store.  Implementations exist for S3 and
//! S3-compatible services, for an in-process store, and as an
//! instrumenting decorator over either.

use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;

use crate::errors::ClientError;

/// Maximum keys per bulk delete request (S3 limit).
pub const MAX_DELETE_BATCH: usize = 1000;

/// Body and metadata for a single object write.
#[derive(Debug, Clone)]
pub struct PutObject {
    pub data: Bytes,
    pub content_type: String,
    pub content_disposition: Option<String>,
}

/// Metadata returned by a HEAD request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub size: u64,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
}

/// A stored object's data plus its metadata.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub info: ObjectInfo,
}

/// Async object store contract.
pub trait ObjectStoreClient: Send + Sync + 'static {
    /// Check whether `bucket` exists.
    fn bucket_exists(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, ClientError>> + Send + '_>>;

    /// Create `bucket`.
    fn create_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + '_>>;

    /// Replace the access policy of `bucket` with the JSON document `policy`.
    fn put_bucket_policy(
        &self,
        bucket: &str,
        policy: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + '_>>;

    /// Write an object, replacing any existing one at `key`.
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        object: PutObject,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + '_>>;

    /// Fetch object metadata, or `None` if nothing is stored at `key`.
    fn head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ObjectInfo>, ClientError>> + Send + '_>>;

    /// Read the full object at `key`.
    ///
    /// The gateway never reads objects back; this exists to verify what
    /// was stored.
    fn get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<StoredObject, ClientError>> + Send + '_>>;

    /// Delete the object at `key`.  Deleting a missing key succeeds.
    fn delete_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + '_>>;

    /// List every key under `prefix`, recursively.
    fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, ClientError>> + Send + '_>>;

    /// Delete `keys` in one request.  Callers keep batches at or below
    /// [`MAX_DELETE_BATCH`].
    fn delete_objects(
        &self,
        bucket: &str,
        keys: &[String],
    ) -> Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + '_>>;
}
