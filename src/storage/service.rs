//! Object storage gateway.
//!
//! [`StorageService`] owns the shared object store client and the bucket
//! name.  It provisions the bucket once at startup and turns
//! `(owner, category, name)` triples into object paths for upload and
//! delete.  Every operation is an independent request against the store;
//! nothing is retried and nothing is cached.

use bytes::Bytes;
use metrics::counter;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::client::{ObjectStoreClient, PutObject, MAX_DELETE_BATCH};
use super::path::{Category, ObjectPath};
use super::policy::public_read_policy;
use crate::config::{ImageConfig, StorageConfig};
use crate::errors::{ClientError, ErrorKind, StorageError};
use crate::imaging;
use crate::metrics::BYTES_UPLOADED_TOTAL;

/// Category-aware upload and delete over a single bucket.
pub struct StorageService {
    client: Arc<dyn ObjectStoreClient>,
    bucket: String,
    public_url: String,
    skip_bucket_check: bool,
    image: ImageConfig,
}

impl StorageService {
    pub fn new(client: Arc<dyn ObjectStoreClient>, storage: &StorageConfig, image: ImageConfig) -> Self {
        Self {
            client,
            bucket: storage.bucket.clone(),
            public_url: storage.public_url.trim_end_matches('/').to_string(),
            skip_bucket_check: storage.skip_bucket_check,
            image,
        }
    }

    /// Externally reachable URL of `path`.
    pub fn public_url_for(&self, path: &ObjectPath) -> String {
        format!("{}/{}/{}", self.public_url, self.bucket, path.url_path())
    }

    /// Make sure the bucket exists and is publicly readable.
    ///
    /// A bucket that already exists is left as it is.  Any failure here
    /// should abort startup.
    pub async fn ensure_bucket(&self) -> Result<(), StorageError> {
        if self.skip_bucket_check {
            warn!(
                bucket = %self.bucket,
                "Skipping bucket check; make sure the bucket exists and is publicly readable"
            );
            return Ok(());
        }

        let provisioning = |source: ClientError| StorageError::Provisioning {
            bucket: self.bucket.clone(),
            source,
        };

        if self
            .client
            .bucket_exists(&self.bucket)
            .await
            .map_err(provisioning)?
        {
            info!(bucket = %self.bucket, "Bucket already exists");
            return Ok(());
        }

        self.client
            .create_bucket(&self.bucket)
            .await
            .map_err(provisioning)?;
        self.client
            .put_bucket_policy(&self.bucket, &public_read_policy(&self.bucket))
            .await
            .map_err(provisioning)?;

        info!(bucket = %self.bucket, "Created bucket with public-read policy");
        Ok(())
    }

    /// Store `data` for `owner` and return its public URL.
    ///
    /// Without a name a fresh id is generated.  Pictures and previews are
    /// normalized to a bounded JPEG first; documents are stored as given
    /// with a download disposition carrying the name.
    pub async fn upload(
        &self,
        owner: &str,
        category: Category,
        data: Bytes,
        name: Option<&str>,
    ) -> Result<String, StorageError> {
        let name = match name {
            Some(name) => name.to_string(),
            None => Uuid::new_v4().simple().to_string(),
        };
        let path = ObjectPath::new(owner, category, &name)?;
        let key = path.key();

        let data = if category.is_image() {
            let image = self.image;
            tokio::task::spawn_blocking(move || imaging::normalize(&data, &image))
                .await?
                .map_err(|e| {
                    warn!(path = %key, error = %e, "Image normalization failed");
                    StorageError::Image(e)
                })?
        } else {
            data
        };
        let size = data.len() as u64;

        let object = PutObject {
            data,
            content_type: category.content_type().to_string(),
            content_disposition: (!category.is_image()).then(|| path.content_disposition()),
        };

        self.client
            .put_object(&self.bucket, &key, object)
            .await
            .map_err(|source| StorageError::Upload {
                path: key.clone(),
                source,
            })?;

        counter!(BYTES_UPLOADED_TOTAL, "category" => category.segment()).increment(size);

        // Only reported; the write itself already succeeded.
        match self.client.head_object(&self.bucket, &key).await {
            Ok(Some(_)) => {}
            Ok(None) => warn!(path = %key, "Uploaded object not visible yet"),
            Err(e) => warn!(path = %key, error = %e, "Could not verify uploaded object"),
        }

        info!(path = %key, size, "Uploaded object");
        Ok(self.public_url_for(&path))
    }

    /// Remove the object at the path derived from the inputs.
    ///
    /// A missing object is reported as a [`ErrorKind::NotFound`] error.
    pub async fn delete(
        &self,
        owner: &str,
        category: Category,
        name: &str,
    ) -> Result<(), StorageError> {
        let path = ObjectPath::new(owner, category, name)?;
        let key = path.key();
        let delete_error = |source: ClientError| StorageError::Delete {
            path: key.clone(),
            source,
        };

        let exists = self
            .client
            .head_object(&self.bucket, &key)
            .await
            .map_err(delete_error)?;
        if exists.is_none() {
            return Err(delete_error(ClientError::new(
                ErrorKind::NotFound,
                format!("no object at {key}"),
            )));
        }

        self.client
            .delete_object(&self.bucket, &key)
            .await
            .map_err(delete_error)?;

        info!(path = %key, "Deleted object");
        Ok(())
    }

    /// Keys currently stored under `prefix`.
    pub async fn list_folder(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        validate_prefix(prefix)?;
        self.client
            .list_objects(&self.bucket, prefix)
            .await
            .map_err(|source| StorageError::List {
                bucket: self.bucket.clone(),
                prefix: prefix.to_string(),
                source,
            })
    }

    /// Remove every object under `prefix`, returning how many were removed.
    ///
    /// The listing and the removal are separate requests, so this is not
    /// atomic: an object written under `prefix` after the listing is left
    /// in place.
    pub async fn delete_folder(&self, prefix: &str) -> Result<usize, StorageError> {
        let keys = self.list_folder(prefix).await?;

        for batch in keys.chunks(MAX_DELETE_BATCH) {
            self.client
                .delete_objects(&self.bucket, batch)
                .await
                .map_err(|source| StorageError::DeleteFolder {
                    bucket: self.bucket.clone(),
                    prefix: prefix.to_string(),
                    source,
                })?;
        }

        info!(bucket = %self.bucket, prefix, count = keys.len(), "Deleted folder");
        Ok(keys.len())
    }
}

/// An empty prefix would address the whole bucket.
fn validate_prefix(prefix: &str) -> Result<(), StorageError> {
    if prefix.trim_matches('/').trim().is_empty() {
        return Err(StorageError::invalid_argument(
            "prefix must name at least one path component",
        ));
    }
    Ok(())
}

// -- Tests -------------------------------------------------------------------
