//! Storage error types.
//!
//! Object store clients return [`ClientError`], which carries an
//! [`ErrorKind`] classifying the underlying failure.  The gateway wraps
//! those in [`StorageError`], adding the bucket, path or prefix the
//! operation touched.  [`StorageError`] implements
//! [`axum::response::IntoResponse`] so handlers can return it directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Classification of a storage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The bucket or object does not exist.
    NotFound,
    /// Credentials were rejected or a policy denied the request.
    PolicyDenied,
    /// The store could not be reached or the connection failed mid-request.
    Network,
    /// A quota, size or rate limit was hit.
    Quota,
    /// The caller supplied an unusable owner, category or name.
    InvalidArgument,
    /// Image bytes could not be decoded or re-encoded.
    InvalidImage,
    /// Anything the store reported that fits no other kind.
    Internal,
}

impl ErrorKind {
    /// Stable identifier used in error bodies and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::PolicyDenied => "PolicyDenied",
            ErrorKind::Network => "Network",
            ErrorKind::Quota => "Quota",
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::InvalidImage => "InvalidImage",
            ErrorKind::Internal => "Internal",
        }
    }

    /// HTTP status reported for errors of this kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::PolicyDenied => StatusCode::FORBIDDEN,
            ErrorKind::Network => StatusCode::BAD_GATEWAY,
            ErrorKind::Quota => StatusCode::INSUFFICIENT_STORAGE,
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::InvalidImage => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map an S3 error code onto a kind.
    ///
    /// Unknown or missing codes are [`ErrorKind::Internal`].
    pub fn from_s3_code(code: Option<&str>) -> Self {
        match code {
            Some("NoSuchKey" | "NoSuchBucket" | "NotFound" | "NoSuchBucketPolicy") => {
                ErrorKind::NotFound
            }
            Some(
                "AccessDenied"
                | "AllAccessDisabled"
                | "InvalidAccessKeyId"
                | "SignatureDoesNotMatch"
                | "MalformedPolicy"
                | "Forbidden",
            ) => ErrorKind::PolicyDenied,
            Some(
                "QuotaExceeded" | "TooManyBuckets" | "EntityTooLarge" | "SlowDown"
                | "XMinioStorageFull",
            ) => ErrorKind::Quota,
            _ => ErrorKind::Internal,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call against an object store.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }
}

/// Gateway-level error, one variant per operation family.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Bucket existence check, creation or policy application failed.
    #[error("failed to provision bucket {bucket}: {source}")]
    Provisioning {
        bucket: String,
        #[source]
        source: ClientError,
    },

    /// Owner, category or name was rejected before touching the store.
    #[error("{message}")]
    InvalidArgument { message: String },

    /// Image bytes could not be normalized.
    #[error("failed to normalize image: {0}")]
    Image(#[from] image::ImageError),

    /// Writing the object failed.
    #[error("failed to upload {path}: {source}")]
    Upload {
        path: String,
        #[source]
        source: ClientError,
    },

    /// Removing a single object failed.
    #[error("failed to delete {path}: {source}")]
    Delete {
        path: String,
        #[source]
        source: ClientError,
    },

    /// Bulk removal under a prefix failed.
    #[error("failed to delete folder {prefix} in bucket {bucket}: {source}")]
    DeleteFolder {
        bucket: String,
        prefix: String,
        #[source]
        source: ClientError,
    },

    /// Listing a prefix failed.
    #[error("failed to list {prefix} in bucket {bucket}: {source}")]
    List {
        bucket: String,
        prefix: String,
        #[source]
        source: ClientError,
    },

    /// Normalization task panicked or was cancelled.
    #[error("image normalization task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StorageError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        StorageError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::Provisioning { source, .. }
            | StorageError::Upload { source, .. }
            | StorageError::Delete { source, .. }
            | StorageError::DeleteFolder { source, .. }
            | StorageError::List { source, .. } => source.kind,
            StorageError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            StorageError::Image(_) => ErrorKind::InvalidImage,
            StorageError::Task(_) => ErrorKind::Internal,
        }
    }

    /// Return the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }
}

impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "code": self.kind().as_str(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_s3_code_not_found() {
        assert_eq!(ErrorKind::from_s3_code(Some("NoSuchKey")), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_s3_code(Some("NoSuchBucket")), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_s3_code(Some("NotFound")), ErrorKind::NotFound);
    }

    #[test]
    fn test_from_s3_code_denied_and_quota() {
        assert_eq!(
            ErrorKind::from_s3_code(Some("AccessDenied")),
            ErrorKind::PolicyDenied
        );
        assert_eq!(
            ErrorKind::from_s3_code(Some("MalformedPolicy")),
            ErrorKind::PolicyDenied
        );
        assert_eq!(ErrorKind::from_s3_code(Some("SlowDown")), ErrorKind::Quota);
        assert_eq!(
            ErrorKind::from_s3_code(Some("TooManyBuckets")),
            ErrorKind::Quota
        );
    }

    #[test]
    fn test_from_s3_code_unknown() {
        assert_eq!(
            ErrorKind::from_s3_code(Some("InternalError")),
            ErrorKind::Internal
        );
        assert_eq!(ErrorKind::from_s3_code(None), ErrorKind::Internal);
    }

    #[test]
    fn test_storage_error_keeps_source_kind() {
        let err = StorageError::Delete {
            path: "u1/pictures/a.jpg".to_string(),
            source: ClientError::not_found("missing"),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains("u1/pictures/a.jpg"));
    }

    #[test]
    fn test_delete_folder_message_names_bucket_and_prefix() {
        let err = StorageError::DeleteFolder {
            bucket: "default".to_string(),
            prefix: "u1/".to_string(),
            source: ClientError::new(ErrorKind::Network, "connection reset"),
        };
        let msg = err.to_string();
        assert!(msg.contains("default"));
        assert!(msg.contains("u1/"));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_invalid_argument_status() {
        let err = StorageError::invalid_argument("owner id must not be empty");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
