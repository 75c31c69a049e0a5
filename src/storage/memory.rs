//! In-memory object store client.
//!
//! Buckets and objects are held in a `tokio::sync::RwLock<HashMap<...>>`.
//! Semantics follow S3 where the gateway depends on them: deleting a
//! missing key succeeds, listing is sorted by key, and every operation on
//! a missing bucket fails with a not-found error.
//!
//! Individual operations can be made to fail with [`MemoryClient::fail`]
//! so error paths can be exercised without a remote store.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use super::client::{ObjectInfo, ObjectStoreClient, PutObject, StoredObject};
use crate::errors::{ClientError, ErrorKind};

#[derive(Debug, Default)]
struct Bucket {
    policy: Option<String>,
    objects: BTreeMap<String, StoredObject>,
}

/// Object store client that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryClient {
    buckets: tokio::sync::RwLock<HashMap<String, Bucket>>,
    /// Operation name -> kind of error to return instead of running it.
    failures: Mutex<HashMap<&'static str, ErrorKind>>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `operation` (the trait method name) fail with
    /// `kind` until [`MemoryClient::clear_failures`] is called.
    pub fn fail(&self, operation: &'static str, kind: ErrorKind) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(operation, kind);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.clear();
        }
    }

    /// Policy currently attached to `bucket`, if any.
    pub async fn bucket_policy(&self, bucket: &str) -> Option<String> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .and_then(|b| b.policy.clone())
    }

    fn injected(&self, operation: &'static str) -> Result<(), ClientError> {
        let kind = self
            .failures
            .lock()
            .ok()
            .and_then(|failures| failures.get(operation).copied());
        match kind {
            Some(kind) => Err(ClientError::new(
                kind,
                format!("injected failure for {operation}"),
            )),
            None => Ok(()),
        }
    }

    fn no_such_bucket(bucket: &str) -> ClientError {
        ClientError::not_found(format!("bucket {bucket} does not exist"))
    }
}

impl ObjectStoreClient for MemoryClient {
    fn bucket_exists(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, ClientError>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            self.injected("bucket_exists")?;
            Ok(self.buckets.read().await.contains_key(&bucket))
        })
    }

    fn create_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            self.injected("create_bucket")?;
            let mut buckets = self.buckets.write().await;
            if buckets.contains_key(&bucket) {
                return Err(ClientError::new(
                    ErrorKind::Internal,
                    format!("bucket {bucket} already exists"),
                ));
            }
            buckets.insert(bucket, Bucket::default());
            Ok(())
        })
    }

    fn put_bucket_policy(
        &self,
        bucket: &str,
        policy: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + '_>> {
        let bucket = bucket.to_string();
        let policy = policy.to_string();
        Box::pin(async move {
            self.injected("put_bucket_policy")?;
            if serde_json::from_str::<serde_json::Value>(&policy).is_err() {
                return Err(ClientError::new(
                    ErrorKind::PolicyDenied,
                    "policy is not valid JSON",
                ));
            }
            let mut buckets = self.buckets.write().await;
            let entry = buckets
                .get_mut(&bucket)
                .ok_or_else(|| Self::no_such_bucket(&bucket))?;
            entry.policy = Some(policy);
            Ok(())
        })
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        object: PutObject,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            self.injected("put_object")?;
            let mut buckets = self.buckets.write().await;
            let entry = buckets
                .get_mut(&bucket)
                .ok_or_else(|| Self::no_such_bucket(&bucket))?;
            let info = ObjectInfo {
                size: object.data.len() as u64,
                content_type: Some(object.content_type),
                content_disposition: object.content_disposition,
            };
            entry.objects.insert(
                key,
                StoredObject {
                    data: object.data,
                    info,
                },
            );
            Ok(())
        })
    }

    fn head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ObjectInfo>, ClientError>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            self.injected("head_object")?;
            let buckets = self.buckets.read().await;
            let entry = buckets
                .get(&bucket)
                .ok_or_else(|| Self::no_such_bucket(&bucket))?;
            Ok(entry.objects.get(&key).map(|o| o.info.clone()))
        })
    }

    fn get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<StoredObject, ClientError>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            self.injected("get_object")?;
            let buckets = self.buckets.read().await;
            let entry = buckets
                .get(&bucket)
                .ok_or_else(|| Self::no_such_bucket(&bucket))?;
            entry
                .objects
                .get(&key)
                .cloned()
                .ok_or_else(|| ClientError::not_found(format!("no object at {key}")))
        })
    }

    fn delete_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            self.injected("delete_object")?;
            let mut buckets = self.buckets.write().await;
            let entry = buckets
                .get_mut(&bucket)
                .ok_or_else(|| Self::no_such_bucket(&bucket))?;
            entry.objects.remove(&key);
            Ok(())
        })
    }

    fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, ClientError>> + Send + '_>> {
        let bucket = bucket.to_string();
        let prefix = prefix.to_string();
        Box::pin(async move {
            self.injected("list_objects")?;
            let buckets = self.buckets.read().await;
            let entry = buckets
                .get(&bucket)
                .ok_or_else(|| Self::no_such_bucket(&bucket))?;
            Ok(entry
                .objects
                .range(prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&prefix))
                .map(|(k, _)| k.clone())
                .collect())
        })
    }

    fn delete_objects(
        &self,
        bucket: &str,
        keys: &[String],
    ) -> Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + '_>> {
        let bucket = bucket.to_string();
        let keys = keys.to_vec();
        Box::pin(async move {
            self.injected("delete_objects")?;
            let mut buckets = self.buckets.write().await;
            let entry = buckets
                .get_mut(&bucket)
                .ok_or_else(|| Self::no_such_bucket(&bucket))?;
            for key in &keys {
                entry.objects.remove(key);
            }
            Ok(())
        })
    }
}

// -- Tests -------------------------------------------------------------------
