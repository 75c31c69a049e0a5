//! Axum router construction.
//!
//! The [`app`] function wires every endpoint to its handler and returns a
//! ready-to-serve [`axum::Router`].  Thin `handle_*` functions extract the
//! request parts and dispatch to [`crate::handlers`].

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::errors::StorageError;
use crate::metrics::{metrics_handler, metrics_middleware};
use crate::AppState;

// -- OpenAPI specification ----------------------------------------------------

/// OpenAPI documentation for the ResumeStore API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ResumeStore API",
        version = "0.1.0",
        description = "Object storage gateway for resume pictures, previews and documents"
    ),
    paths(
        health_check,
        crate::handlers::object::upload_named,
        crate::handlers::object::upload_generated,
        crate::handlers::object::delete_object,
        crate::handlers::folder::list_folder,
        crate::handlers::folder::delete_folder,
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Object", description = "Single object operations"),
        (name = "Folder", description = "Prefix operations"),
    )
)]
struct ApiDoc;

/// Build the axum [`Router`] with all routes.
pub fn app(state: Arc<AppState>) -> Router {
    let max_upload_size = state.config.server.max_upload_size;

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_json))
        .route(
            "/objects/:owner/:category",
            post(handle_upload_generated),
        )
        .route(
            "/objects/:owner/:category/:name",
            put(handle_upload_named).delete(handle_delete_object),
        )
        .route(
            "/folders/*prefix",
            get(handle_list_folder).delete(handle_delete_folder),
        )
        .with_state(state)
        // Layer ordering: inner layers run first, outer layers wrap them.
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        // metrics_middleware is outermost (captures full request lifecycle).
        .layer(middleware::from_fn(metrics_middleware))
        .layer(DefaultBodyLimit::max(max_upload_size))
}

/// Adds an `x-request-id` header to every response that lacks one.
async fn request_id_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    if !headers.contains_key("x-request-id") {
        let request_id = uuid::Uuid::new_v4().simple().to_string();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert("x-request-id", value);
        }
    }
    response
}

// -- Health check ------------------------------------------------------------

/// `GET /health` -- Returns `{"status": "ok"}` with 200 OK.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "HealthCheck",
    responses(
        (status = 200, description = "Health check OK")
    )
)]
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"status":"ok"}"#,
    )
}

/// `GET /openapi.json`
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// -- Dispatch ----------------------------------------------------------------

async fn handle_upload_named(
    State(state): State<Arc<AppState>>,
    Path((owner, category, name)): Path<(String, String, String)>,
    body: Bytes,
) -> Result<Response, StorageError> {
    crate::handlers::object::upload_named(state, &owner, &category, &name, body).await
}

async fn handle_upload_generated(
    State(state): State<Arc<AppState>>,
    Path((owner, category)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response, StorageError> {
    crate::handlers::object::upload_generated(state, &owner, &category, body).await
}

async fn handle_delete_object(
    State(state): State<Arc<AppState>>,
    Path((owner, category, name)): Path<(String, String, String)>,
) -> Result<Response, StorageError> {
    crate::handlers::object::delete_object(state, &owner, &category, &name).await
}

async fn handle_list_folder(
    State(state): State<Arc<AppState>>,
    Path(prefix): Path<String>,
) -> Result<Response, StorageError> {
    crate::handlers::folder::list_folder(state, &prefix).await
}

async fn handle_delete_folder(
    State(state): State<Arc<AppState>>,
    Path(prefix): Path<String>,
) -> Result<Response, StorageError> {
    crate::handlers::folder::delete_folder(state, &prefix).await
}

// -- Tests -------------------------------------------------------------------
