//! HTTP API for slides and the error catalog.
//!
//! Provides:
//! - `/api/slide/list` - Ids of all slides
//! - `/api/slide/get?id=` - Markup of one slide
//! - `/api/slide/rm` - Delete a slide (`POST {"id": ...}`)
//! - `/api/err_codes` - Error code names and numbers
//! - `/api/err_msgs` - Short and long messages per error code
//! - `/api/schema/error` - JSON Schema of the error response body
//! - `/health` - Basic daemon health check

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    middleware,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use signage_common::api::{SlideMarkup, SlideRef, error_response_schema};
use signage_common::errors::{ErrorCode, error_code_table, error_message_table};
use signage_common::{ApiFailure, Translator};
use tracing::info;

use crate::boundary::{ApiError, error_boundary};
use crate::slides::SlideStore;

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Slide storage.
    pub store: Arc<SlideStore>,
    /// Daemon version.
    pub version: &'static str,
    /// Daemon start time.
    pub started_at: Instant,
}

#[derive(Debug, Deserialize)]
struct SlideQuery {
    id: String,
}

/// Create the HTTP router with the error boundary installed.
pub fn create_router(state: HttpState, translator: Translator) -> Router {
    Router::new()
        .route("/api/slide/list", get(slide_list_handler))
        .route("/api/slide/get", get(slide_get_handler))
        .route("/api/slide/rm", post(slide_rm_handler))
        .route("/api/err_codes", get(err_codes_handler))
        .route("/api/err_msgs", get(err_msgs_handler))
        .route("/api/schema/error", get(error_schema_handler))
        .route("/health", get(health_handler))
        .fallback(fallback_handler)
        .method_not_allowed_fallback(method_not_allowed_handler)
        .with_state(Arc::new(state))
        .layer(middleware::from_fn_with_state(
            Arc::new(translator),
            error_boundary,
        ))
}

/// Handler for `/api/slide/list`.
async fn slide_list_handler(State(state): State<Arc<HttpState>>) -> Json<Value> {
    Json(json!({ "slides": state.store.ids() }))
}

/// Handler for `/api/slide/get`.
async fn slide_get_handler(
    State(state): State<Arc<HttpState>>,
    query: Result<Query<SlideQuery>, QueryRejection>,
) -> Result<Json<SlideMarkup>, ApiError> {
    let Query(SlideQuery { id }) =
        query.map_err(|e| ApiFailure::argument(e.body_text()))?;
    let markup = state.store.get(&id)?;
    Ok(Json(SlideMarkup { id, markup }))
}

/// Handler for `/api/slide/rm`.
async fn slide_rm_handler(
    State(state): State<Arc<HttpState>>,
    body: Result<Json<SlideRef>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(SlideRef { id }) = body.map_err(|e| ApiFailure::argument(e.body_text()))?;
    state.store.remove(&id)?;
    info!(slide = %id, "Deleted slide");
    Ok(Json(json!({})))
}

/// Handler for `/api/err_codes`.
async fn err_codes_handler() -> Json<Value> {
    Json(json!({ "codes": error_code_table() }))
}

/// Handler for `/api/err_msgs`.
async fn err_msgs_handler() -> Json<Value> {
    Json(json!({ "messages": error_message_table() }))
}

/// Handler for `/api/schema/error`.
async fn error_schema_handler() -> Json<Value> {
    Json(json!(error_response_schema()))
}

/// Handler for `/health` - Basic daemon health check.
async fn health_handler(State(state): State<Arc<HttpState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": state.version,
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "slides": state.store.len(),
    }))
}

/// Unknown endpoints are invalid requests.
async fn fallback_handler() -> ApiError {
    ApiFailure::api(ErrorCode::InvalidRequest, "Unknown API endpoint.").into()
}

/// Known endpoints called with the wrong HTTP method.
async fn method_not_allowed_handler() -> ApiError {
    ApiFailure::api(
        ErrorCode::InvalidRequest,
        "HTTP method not allowed for this endpoint.",
    )
    .into()
}

/// Serve the API until `shutdown` resolves.
pub async fn serve(
    listener: tokio::net::TcpListener,
    router: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    info!("HTTP API listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
