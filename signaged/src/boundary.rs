//! The single error boundary of the HTTP API.
//!
//! Handlers return [`ApiError`]. Its `IntoResponse` renders a non-debug body
//! and stashes the failure in the response extensions; [`error_boundary`]
//! then re-renders it through the configured [`Translator`]. Error responses
//! axum builds on its own (method mismatch, body limits) are translated too,
//! and a panicking handler becomes the nested-failure fallback body, so every
//! failed request ends with exactly one JSON object.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use signage_common::api::classify;
use signage_common::{ApiFailure, TranslatedError, Translator};

/// Handler error type. Wraps the shared failure so axum can render it.
#[derive(Debug)]
pub struct ApiError(pub ApiFailure);

impl<E> From<E> for ApiError
where
    E: Into<ApiFailure>,
{
    #[track_caller]
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Clone)]
struct PendingFailure(Arc<ApiFailure>);

/// Render a translated failure as a JSON response.
pub fn render(translated: TranslatedError) -> Response {
    let status = StatusCode::from_u16(translated.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        translated.body,
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let failure = self.0;
        let code = classify(&failure);
        let body = Translator::new(false).serialize(code, &failure);
        let mut response = render(TranslatedError { code, body });
        response
            .extensions_mut()
            .insert(PendingFailure(Arc::new(failure)));
        response
    }
}

/// Middleware: translate failures and catch panics.
pub async fn error_boundary(
    State(translator): State<Arc<Translator>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => return render(translator.handle_panic(panic.as_ref())),
    };

    if let Some(PendingFailure(failure)) = response.extensions_mut().remove::<PendingFailure>() {
        return render(translator.handle(&failure));
    }

    // Rejections produced by axum itself never pass through `ApiError`.
    let status = response.status();
    if status.is_server_error() {
        render(translator.handle(&ApiFailure::internal(format!(
            "Request failed with status {status}."
        ))))
    } else if status.is_client_error() {
        render(translator.handle(&ApiFailure::argument(format!(
            "Request rejected with status {status}."
        ))))
    } else {
        response
    }
}
