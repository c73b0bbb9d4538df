//! Wire types shared by the daemon and its clients.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::ErrorCode;

/// Body of every failed API call.
///
/// The diagnostic fields are only present when the daemon runs in debug mode;
/// otherwise the object contains `error` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    /// Numeric API error code.
    #[schemars(with = "u8")]
    pub error: ErrorCode,
    /// `"<file> @ ln: <line>"` of the raise site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thrown_at: Option<String>,
    /// Failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e_msg: Option<String>,
    /// Backtrace text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e_trace: Option<String>,
}

impl ErrorResponse {
    /// Response carrying only the code.
    pub fn bare(error: ErrorCode) -> Self {
        Self {
            error,
            thrown_at: None,
            e_msg: None,
            e_trace: None,
        }
    }
}

/// Body of `fetch-slide`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SlideMarkup {
    pub id: String,
    pub markup: String,
}

/// Request body of `delete-slide`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SlideRef {
    pub id: String,
}

/// Extract the error from a response body, if it is error-tagged.
///
/// A body is error-tagged when it is an object with a non-zero `error` field.
/// An `error` value that is not a known code is reported as `Internal`.
pub fn error_tag(body: &serde_json::Value) -> Option<ErrorResponse> {
    let tag = body.get("error")?;
    if tag.as_u64() == Some(0) || tag.is_null() {
        return None;
    }
    match serde_json::from_value::<ErrorResponse>(body.clone()) {
        Ok(resp) => Some(resp),
        Err(_) => Some(ErrorResponse::bare(ErrorCode::Internal)),
    }
}

/// JSON Schema for [`ErrorResponse`].
#[must_use]
pub fn error_response_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(ErrorResponse)
}
