//! Remote slide calls.
//!
//! [`SlideApi`] is the seam between the control panel and the daemon.
//! [`HttpSlideApi`] talks to `signaged` over HTTP.

use std::future::Future;

use serde_json::{Value, json};
use signage_common::api::{ErrorResponse, SlideMarkup, error_tag};
use signage_common::errors::ErrorCode;
use thiserror::Error;
use tracing::debug;

/// A failed remote call.
///
/// Transport failures and error-tagged responses are distinct variants but
/// the panel treats them the same way.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("API error {}: {}", .0.error.code_number(), .0.error.short())]
    Api(ErrorResponse),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// The API error code, for error-tagged responses.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Api(resp) => Some(resp.error),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

/// Slide-management endpoint.
pub trait SlideApi {
    /// Markup of slide `id`.
    fn fetch_slide(&self, id: &str) -> impl Future<Output = Result<String, RemoteError>> + Send;

    /// Delete slide `id`.
    fn delete_slide(&self, id: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Ids of all slides.
    fn list_slides(&self) -> impl Future<Output = Result<Vec<String>, RemoteError>> + Send;
}

/// [`SlideApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSlideApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSlideApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and decode its JSON body, failing on error-tagged bodies.
    ///
    /// Error responses carry a non-2xx status, so the body is inspected
    /// before the status.
    async fn call(&self, request: reqwest::RequestBuilder) -> Result<Value, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(format!("{status}: {e}")))?;

        if let Some(err) = error_tag(&body) {
            return Err(RemoteError::Api(err));
        }
        if !status.is_success() {
            return Err(RemoteError::Decode(format!(
                "status {status} without an error code"
            )));
        }
        debug!(%status, "API call succeeded");
        Ok(body)
    }
}

impl SlideApi for HttpSlideApi {
    async fn fetch_slide(&self, id: &str) -> Result<String, RemoteError> {
        let url = format!(
            "{}/api/slide/get?id={}",
            self.base_url,
            urlencoding::encode(id)
        );
        let body = self.call(self.client.get(url)).await?;
        let slide: SlideMarkup =
            serde_json::from_value(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(slide.markup)
    }

    async fn delete_slide(&self, id: &str) -> Result<(), RemoteError> {
        let url = format!("{}/api/slide/rm", self.base_url);
        self.call(self.client.post(url).json(&json!({ "id": id })))
            .await
            .map(|_| ())
    }

    async fn list_slides(&self) -> Result<Vec<String>, RemoteError> {
        let url = format!("{}/api/slide/list", self.base_url);
        let body = self.call(self.client.get(url)).await?;
        let slides = body
            .get("slides")
            .cloned()
            .ok_or_else(|| RemoteError::Decode("missing 'slides' field".to_string()))?;
        serde_json::from_value(slides).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Query,
        http::StatusCode,
        routing::{get, post},
    };
    use std::collections::HashMap;

    async fn spawn_server() -> String {
        async fn get_slide(Query(q): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
            match q.get("id").map(String::as_str) {
                Some("abc") => (
                    StatusCode::OK,
                    Json(json!({ "id": "abc", "markup": "<p>hi</p>" })),
                ),
                Some("a b") => (
                    StatusCode::OK,
                    Json(json!({ "id": "a b", "markup": "spaced" })),
                ),
                _ => (StatusCode::BAD_REQUEST, Json(json!({ "error": 2 }))),
            }
        }

        async fn rm_slide(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
            if body["id"] == "locked" {
                (
                    StatusCode::CONFLICT,
                    Json(json!({ "error": 9, "e_msg": "locked" })),
                )
            } else {
                (StatusCode::OK, Json(json!({})))
            }
        }

        async fn list() -> Json<Value> {
            Json(json!({ "slides": ["abc", "xyz"] }))
        }

        let router = Router::new()
            .route("/api/slide/get", get(get_slide))
            .route("/api/slide/rm", post(rm_slide))
            .route("/api/slide/list", get(list));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_fetch_slide() {
        let api = HttpSlideApi::new(spawn_server().await);
        assert!(!api.base_url().ends_with('/'));
        assert_eq!(api.fetch_slide("abc").await.unwrap(), "<p>hi</p>");
        assert_eq!(api.fetch_slide("a b").await.unwrap(), "spaced");
    }

    #[tokio::test]
    async fn test_fetch_slide_error_tagged() {
        let api = HttpSlideApi::new(spawn_server().await);
        let err = api.fetch_slide("missing").await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidRequest));
        assert_eq!(err.to_string(), "API error 2: Invalid request");
    }

    #[tokio::test]
    async fn test_delete_slide() {
        let api = HttpSlideApi::new(spawn_server().await);
        api.delete_slide("abc").await.unwrap();

        let err = api.delete_slide("locked").await.unwrap_err();
        match err {
            RemoteError::Api(resp) => {
                assert_eq!(resp.error, ErrorCode::Lock);
                assert_eq!(resp.e_msg.as_deref(), Some("locked"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_list_slides() {
        let api = HttpSlideApi::new(spawn_server().await);
        assert_eq!(api.list_slides().await.unwrap(), vec!["abc", "xyz"]);
    }

    #[tokio::test]
    async fn test_transport_failure() {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = HttpSlideApi::new(format!("http://{addr}"));
        let err = api.fetch_slide("abc").await.unwrap_err();
        assert!(matches!(err, RemoteError::Transport(_)));
        assert_eq!(err.code(), None);
    }
}
