//! Object-level handlers: upload and delete by owner, category and name.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde_json::json;

use crate::errors::StorageError;
use crate::storage::path::Category;
use crate::AppState;

/// `PUT /objects/{owner}/{category}/{name}` -- Upload under an explicit name.
#[utoipa::path(
    put,
    path = "/objects/{owner}/{category}/{name}",
    tag = "Object",
    operation_id = "UploadObject",
    params(
        ("owner" = String, Path, description = "Owner (user) id"),
        ("category" = String, Path, description = "picture, preview or document"),
        ("name" = String, Path, description = "Object name without extension"),
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream", description = "Image or PDF bytes"),
    responses(
        (status = 201, description = "Object stored, body carries its public URL"),
        (status = 400, description = "Invalid owner, category or name"),
        (status = 422, description = "Body is not a decodable image"),
        (status = 500, description = "Internal error")
    )
)]
pub async fn upload_named(
    state: Arc<AppState>,
    owner: &str,
    category: &str,
    name: &str,
    body: Bytes,
) -> Result<Response, StorageError> {
    upload(state, owner, category, Some(name), body).await
}

/// `POST /objects/{owner}/{category}` -- Upload under a generated name.
#[utoipa::path(
    post,
    path = "/objects/{owner}/{category}",
    tag = "Object",
    operation_id = "UploadObjectGeneratedName",
    params(
        ("owner" = String, Path, description = "Owner (user) id"),
        ("category" = String, Path, description = "picture, preview or document"),
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream", description = "Image or PDF bytes"),
    responses(
        (status = 201, description = "Object stored, body carries its public URL"),
        (status = 400, description = "Invalid owner or category"),
        (status = 422, description = "Body is not a decodable image"),
        (status = 500, description = "Internal error")
    )
)]
pub async fn upload_generated(
    state: Arc<AppState>,
    owner: &str,
    category: &str,
    body: Bytes,
) -> Result<Response, StorageError> {
    upload(state, owner, category, None, body).await
}

async fn upload(
    state: Arc<AppState>,
    owner: &str,
    category: &str,
    name: Option<&str>,
    body: Bytes,
) -> Result<Response, StorageError> {
    let category: Category = category.parse()?;
    if body.is_empty() {
        return Err(StorageError::invalid_argument("request body must not be empty"));
    }
    let url = state.storage.upload(owner, category, body, name).await?;
    Ok((StatusCode::CREATED, Json(json!({ "url": url }))).into_response())
}

/// `DELETE /objects/{owner}/{category}/{name}` -- Delete a single object.
#[utoipa::path(
    delete,
    path = "/objects/{owner}/{category}/{name}",
    tag = "Object",
    operation_id = "DeleteObject",
    params(
        ("owner" = String, Path, description = "Owner (user) id"),
        ("category" = String, Path, description = "picture, preview or document"),
        ("name" = String, Path, description = "Object name without extension"),
    ),
    responses(
        (status = 204, description = "Object deleted"),
        (status = 404, description = "Object not found"),
        (status = 500, description = "Internal error")
    )
)]
pub async fn delete_object(
    state: Arc<AppState>,
    owner: &str,
    category: &str,
    name: &str,
) -> Result<Response, StorageError> {
    let category: Category = category.parse()?;
    state.storage.delete(owner, category, name).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
