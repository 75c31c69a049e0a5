//! Prefix-level handlers: list and bulk delete.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::errors::StorageError;
use crate::AppState;

/// `GET /folders/{prefix}` -- List keys under a prefix.
///
/// The prefix always names a folder: `u1` lists `u1/...` and never `u10/...`.
#[utoipa::path(
    get,
    path = "/folders/{prefix}",
    tag = "Folder",
    operation_id = "ListFolder",
    params(("prefix" = String, Path, description = "Folder, e.g. `u1` or `u1/pictures`; a trailing `/` is implied")),
    responses(
        (status = 200, description = "Keys under the prefix"),
        (status = 400, description = "Prefix addresses the whole bucket"),
        (status = 500, description = "Internal error")
    )
)]
pub async fn list_folder(state: Arc<AppState>, prefix: &str) -> Result<Response, StorageError> {
    let keys = state.storage.list_folder(&folder_prefix(prefix)).await?;
    Ok(Json(json!({ "keys": keys })).into_response())
}

/// `DELETE /folders/{prefix}` -- Delete every object under a prefix.
///
/// Not atomic: objects written while the delete runs may survive it.
#[utoipa::path(
    delete,
    path = "/folders/{prefix}",
    tag = "Folder",
    operation_id = "DeleteFolder",
    params(("prefix" = String, Path, description = "Folder, e.g. `u1`; a trailing `/` is implied")),
    responses(
        (status = 204, description = "Everything listed under the prefix was deleted"),
        (status = 400, description = "Prefix addresses the whole bucket"),
        (status = 500, description = "Internal error")
    )
)]
pub async fn delete_folder(state: Arc<AppState>, prefix: &str) -> Result<Response, StorageError> {
    state.storage.delete_folder(&folder_prefix(prefix)).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Terminate `prefix` with `/` so it cannot match sibling folders.
fn folder_prefix(prefix: &str) -> String {
    if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_prefix() {
        assert_eq!(folder_prefix("u1"), "u1/");
        assert_eq!(folder_prefix("u1/"), "u1/");
        assert_eq!(folder_prefix("u1/pictures"), "u1/pictures/");
        assert_eq!(folder_prefix(""), "/");
    }
}
