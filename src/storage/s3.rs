//! S3 object store client.
//!
//! Talks to AWS S3 or any S3-compatible service (MinIO, LocalStack) via
//! the AWS SDK for Rust.  Credentials come from the configuration when
//! both keys are set and from the standard AWS credential chain
//! (env vars, `~/.aws/credentials`, IAM role, etc.) otherwise.

use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, Delete, ObjectIdentifier,
};
use aws_sdk_s3::Client;
use std::future::Future;
use std::pin::Pin;
use tracing::info;

use super::client::{ObjectInfo, ObjectStoreClient, PutObject, StoredObject};
use crate::config::S3Config;
use crate::errors::{ClientError, ErrorKind};

/// Region that rejects an explicit location constraint on bucket creation.
const DEFAULT_REGION: &str = "us-east-1";

/// Object store client backed by the AWS SDK.
pub struct S3Client {
    client: Client,
    region: String,
}

impl S3Client {
    /// Build a client from configuration.
    pub async fn new(config: &S3Config) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if !config.endpoint_url.is_empty() {
            config_loader = config_loader.endpoint_url(&config.endpoint_url);
        }

        // If explicit credentials are provided, inject them as static credentials.
        if !config.access_key_id.is_empty() && !config.secret_access_key.is_empty() {
            let creds = aws_sdk_s3::config::Credentials::new(
                &config.access_key_id,
                &config.secret_access_key,
                None, // session_token
                None, // expiry
                "resumestore-config",
            );
            config_loader = config_loader.credentials_provider(creds);
        }

        let sdk_config = config_loader.load().await;

        let s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.use_path_style);

        let client = Client::from_conf(s3_config_builder.build());

        info!(
            region = %config.region,
            endpoint = %config.endpoint_url,
            path_style = config.use_path_style,
            "S3 client initialized"
        );

        Self {
            client,
            region: config.region.clone(),
        }
    }

    /// Map an SDK error to a classified [`ClientError`].
    fn map_sdk_error<E>(context: &str, err: SdkError<E, HttpResponse>) -> ClientError
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        let kind = match &err {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) | SdkError::ResponseError(_) => {
                ErrorKind::Network
            }
            _ => classify(err.code(), err.raw_response().map(|r| r.status().as_u16())),
        };
        ClientError::new(kind, format!("S3 {context}: {}", DisplayErrorContext(&err)))
    }

    fn map_build_error(context: &str, err: impl std::fmt::Display) -> ClientError {
        ClientError::new(ErrorKind::Internal, format!("S3 {context}: {err}"))
    }
}

/// Classify by error code, falling back to the HTTP status for
/// body-less responses such as HEAD.
fn classify(code: Option<&str>, status: Option<u16>) -> ErrorKind {
    match ErrorKind::from_s3_code(code) {
        ErrorKind::Internal if code.is_none() => match status {
            Some(404) => ErrorKind::NotFound,
            Some(401 | 403) => ErrorKind::PolicyDenied,
            Some(429 | 503 | 507) => ErrorKind::Quota,
            _ => ErrorKind::Internal,
        },
        kind => kind,
    }
}

impl ObjectStoreClient for S3Client {
    fn bucket_exists(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, ClientError>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            match self.client.head_bucket().bucket(&bucket).send().await {
                Ok(_) => Ok(true),
                Err(SdkError::ServiceError(e)) if e.err().is_not_found() => Ok(false),
                Err(e) => Err(Self::map_sdk_error("head_bucket", e)),
            }
        })
    }

    fn create_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            let location = (self.region != DEFAULT_REGION).then(|| {
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build()
            });

            self.client
                .create_bucket()
                .bucket(&bucket)
                .set_create_bucket_configuration(location)
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("create_bucket", e))?;

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
            self.client
                .put_bucket_policy()
                .bucket(&bucket)
                .policy(policy)
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("put_bucket_policy", e))?;

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
            self.client
                .put_object()
                .bucket(&bucket)
                .key(&key)
                .content_type(object.content_type)
                .set_content_disposition(object.content_disposition)
                .body(ByteStream::from(object.data))
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("put_object", e))?;

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
            match self.client.head_object().bucket(&bucket).key(&key).send().await {
                Ok(resp) => Ok(Some(ObjectInfo {
                    size: resp.content_length().unwrap_or(0).max(0) as u64,
                    content_type: resp.content_type().map(str::to_string),
                    content_disposition: resp.content_disposition().map(str::to_string),
                })),
                Err(SdkError::ServiceError(e)) if e.err().is_not_found() => Ok(None),
                Err(e) => Err(Self::map_sdk_error("head_object", e)),
            }
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
            let resp = self
                .client
                .get_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("get_object", e))?;

            let info = ObjectInfo {
                size: resp.content_length().unwrap_or(0).max(0) as u64,
                content_type: resp.content_type().map(str::to_string),
                content_disposition: resp.content_disposition().map(str::to_string),
            };

            let data = resp
                .body
                .collect()
                .await
                .map_err(|e| ClientError::new(ErrorKind::Network, format!("S3 get_object body: {e}")))?
                .into_bytes();

            Ok(StoredObject { data, info })
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
            // S3 delete_object is idempotent -- no error for missing keys.
            self.client
                .delete_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("delete_object", e))?;

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
            let mut keys = Vec::new();
            let mut continuation_token: Option<String> = None;
            loop {
                let resp = self
                    .client
                    .list_objects_v2()
                    .bucket(&bucket)
                    .prefix(&prefix)
                    .set_continuation_token(continuation_token.take())
                    .send()
                    .await
                    .map_err(|e| Self::map_sdk_error("list_objects_v2", e))?;

                keys.extend(
                    resp.contents()
                        .iter()
                        .filter_map(|obj| obj.key().map(str::to_string)),
                );

                if resp.is_truncated() == Some(true) {
                    continuation_token = resp.next_continuation_token().map(str::to_string);
                    if continuation_token.is_none() {
                        break;
                    }
                } else {
                    break;
                }
            }
            Ok(keys)
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
            if keys.is_empty() {
                return Ok(());
            }

            let objects = keys
                .iter()
                .map(|k| ObjectIdentifier::builder().key(k).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| Self::map_build_error("delete_objects build", e))?;

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| Self::map_build_error("delete_objects build", e))?;

            let resp = self
                .client
                .delete_objects()
                .bucket(&bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("delete_objects", e))?;

            // Quiet mode only reports the keys that failed.
            if let Some(first) = resp.errors().first() {
                return Err(ClientError::new(
                    classify(first.code(), None),
                    format!(
                        "S3 delete_objects: {} of {} keys failed, first {}: {}",
                        resp.errors().len(),
                        keys.len(),
                        first.key().unwrap_or("<unknown>"),
                        first.message().unwrap_or("no message"),
                    ),
                ));
            }

            Ok(())
        })
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prefers_code() {
        assert_eq!(classify(Some("NoSuchKey"), Some(500)), ErrorKind::NotFound);
        assert_eq!(
            classify(Some("AccessDenied"), Some(404)),
            ErrorKind::PolicyDenied
        );
    }

    #[test]
    fn test_classify_falls_back_to_status() {
        assert_eq!(classify(None, Some(404)), ErrorKind::NotFound);
        assert_eq!(classify(None, Some(403)), ErrorKind::PolicyDenied);
        assert_eq!(classify(None, Some(503)), ErrorKind::Quota);
        assert_eq!(classify(None, Some(500)), ErrorKind::Internal);
        assert_eq!(classify(None, None), ErrorKind::Internal);
    }

    #[test]
    fn test_classify_unknown_code_ignores_status() {
        assert_eq!(classify(Some("InternalError"), Some(404)), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_new_with_static_credentials() {
        let config = S3Config {
            region: "eu-central-1".to_string(),
            endpoint_url: "http://127.0.0.1:9000".to_string(),
            use_path_style: true,
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
        };
        let client = S3Client::new(&config).await;
        assert_eq!(client.region, "eu-central-1");
    }
}
