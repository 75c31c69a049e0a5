//! Observability decorator for object store clients.
//!
//! [`InstrumentedClient`] wraps any [`ObjectStoreClient`] and records a
//! tracing event, an operation counter and a latency histogram around
//! every call, so the gateway itself carries no logging between remote
//! calls beyond its own error context.

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, warn};

use super::client::{ObjectInfo, ObjectStoreClient, PutObject, StoredObject};
use crate::errors::ClientError;
use crate::metrics::{STORAGE_OPERATIONS_TOTAL, STORAGE_OPERATION_DURATION_SECONDS};

pub struct InstrumentedClient<C> {
    inner: C,
}

impl<C: ObjectStoreClient> InstrumentedClient<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

/// Run one client call, logging and recording its outcome.
async fn observe<T>(
    operation: &'static str,
    bucket: &str,
    target: &str,
    call: impl Future<Output = Result<T, ClientError>>,
) -> Result<T, ClientError> {
    debug!(operation, bucket, target, "object store call");
    let start = Instant::now();
    let result = call.await;
    let elapsed = start.elapsed();

    let status = match &result {
        Ok(_) => "ok",
        Err(e) => e.kind.as_str(),
    };
    counter!(STORAGE_OPERATIONS_TOTAL, "operation" => operation, "status" => status).increment(1);
    histogram!(STORAGE_OPERATION_DURATION_SECONDS, "operation" => operation)
        .record(elapsed.as_secs_f64());

    match &result {
        Ok(_) => debug!(
            operation,
            bucket,
            target,
            elapsed_ms = elapsed.as_millis() as u64,
            "object store call succeeded"
        ),
        Err(e) => warn!(
            operation,
            bucket,
            target,
            kind = %e.kind,
            error = %e.message,
            "object store call failed"
        ),
    }
    result
}

impl<C: ObjectStoreClient> ObjectStoreClient for InstrumentedClient<C> {
    fn bucket_exists(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, ClientError>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            observe("bucket_exists", &bucket, "", self.inner.bucket_exists(&bucket)).await
        })
    }

    fn create_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            observe("create_bucket", &bucket, "", self.inner.create_bucket(&bucket)).await
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
            observe(
                "put_bucket_policy",
                &bucket,
                "",
                self.inner.put_bucket_policy(&bucket, &policy),
            )
            .await
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
            observe("put_object", &bucket, &key, self.inner.put_object(&bucket, &key, object))
                .await
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
            observe("head_object", &bucket, &key, self.inner.head_object(&bucket, &key)).await
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
            observe("get_object", &bucket, &key, self.inner.get_object(&bucket, &key)).await
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
            observe("delete_object", &bucket, &key, self.inner.delete_object(&bucket, &key)).await
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
            observe(
                "list_objects",
                &bucket,
                &prefix,
                self.inner.list_objects(&bucket, &prefix),
            )
            .await
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
            let target = format!("{} keys", keys.len());
            observe(
                "delete_objects",
                &bucket,
                &target,
                self.inner.delete_objects(&bucket, &keys),
            )
            .await
        })
    }
}
