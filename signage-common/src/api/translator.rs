//! Translation of request failures into JSON error bodies.
//!
//! The [`Translator`] is the only place a failure is classified. It always
//! produces a well-formed body: if encoding fails it falls back to
//! [`ENCODE_FALLBACK_BODY`], and if classification or serialization panics
//! it falls back to [`NESTED_FALLBACK_BODY`]. Both are string constants so
//! neither fallback can fail in turn.

use std::panic::{AssertUnwindSafe, catch_unwind};

use thiserror::Error;
use tracing::{error, warn};

use super::failure::{ApiFailure, FailureKind};
use super::response::ErrorResponse;
use crate::errors::ErrorCode;

/// Body emitted when encoding the error response fails.
pub const ENCODE_FALLBACK_BODY: &str = r#"{"error":1}"#;

/// Body emitted when a failure is raised while translating another one.
pub const NESTED_FALLBACK_BODY: &str =
    r#"{"error":1,"e_msg":"Failure raised while translating an API error."}"#;

/// Map a failure to its API error code.
///
/// `Ok` and `Client` are never reported by the server; a failure tagged with
/// either is reported as `Internal`.
pub fn classify(failure: &ApiFailure) -> ErrorCode {
    match failure.kind() {
        FailureKind::Api(code) if code.is_server_producible() => code,
        FailureKind::Api(_) => ErrorCode::Internal,
        FailureKind::Argument => ErrorCode::InvalidRequest,
        FailureKind::Limit => ErrorCode::Limited,
        FailureKind::FileType => ErrorCode::InvalidFiletype,
        FailureKind::Internal => ErrorCode::Internal,
    }
}

/// Encoding an error response failed.
#[derive(Debug, Error)]
#[error("failed to encode error response: {0}")]
pub struct EncodeError(pub String);

/// Encodes error responses into a body.
pub trait ResponseEncoder {
    fn encode(&self, response: &ErrorResponse) -> Result<String, EncodeError>;
}

/// Default `serde_json` encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl ResponseEncoder for JsonEncoder {
    fn encode(&self, response: &ErrorResponse) -> Result<String, EncodeError> {
        serde_json::to_string(response).map_err(|e| EncodeError(e.to_string()))
    }
}

/// Result of handling one failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedError {
    pub code: ErrorCode,
    pub body: String,
}

impl TranslatedError {
    /// HTTP status to terminate the request with.
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    fn nested_fallback() -> Self {
        Self {
            code: ErrorCode::Internal,
            body: NESTED_FALLBACK_BODY.to_string(),
        }
    }
}

/// Converts failures into error bodies.
#[derive(Debug, Clone, Default)]
pub struct Translator<E = JsonEncoder> {
    debug: bool,
    encoder: E,
}

impl Translator<JsonEncoder> {
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            encoder: JsonEncoder,
        }
    }
}

impl<E: ResponseEncoder> Translator<E> {
    pub fn with_encoder(debug: bool, encoder: E) -> Self {
        Self { debug, encoder }
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Build the wire entity for `failure` under `code`.
    pub fn response(&self, code: ErrorCode, failure: &ApiFailure) -> ErrorResponse {
        if !self.debug {
            return ErrorResponse::bare(code);
        }
        let origin = failure.origin();
        ErrorResponse {
            error: code,
            thrown_at: Some(origin.to_string()),
            e_msg: Some(failure.message().to_string()),
            e_trace: Some(origin.trace()),
        }
    }

    /// Encode the error body for `failure` under `code`.
    pub fn serialize(&self, code: ErrorCode, failure: &ApiFailure) -> String {
        let response = self.response(code, failure);
        match self.encoder.encode(&response) {
            Ok(body) => body,
            Err(e) => {
                error!(code = code.code_number(), "{}", e);
                ENCODE_FALLBACK_BODY.to_string()
            }
        }
    }

    /// Classify and serialize `failure`. Never panics and never fails.
    pub fn handle(&self, failure: &ApiFailure) -> TranslatedError {
        let translated = catch_unwind(AssertUnwindSafe(|| {
            let code = classify(failure);
            let body = self.serialize(code, failure);
            TranslatedError { code, body }
        }));

        match translated {
            Ok(translated) => {
                if translated.code == ErrorCode::Internal {
                    error!(
                        code = translated.code.code_number(),
                        thrown_at = %failure.origin(),
                        "API request failed: {}",
                        failure.message()
                    );
                } else {
                    warn!(
                        code = translated.code.code_number(),
                        thrown_at = %failure.origin(),
                        "API request rejected: {}",
                        failure.message()
                    );
                }
                translated
            }
            Err(panic) => {
                error!(
                    panic = panic_message(panic.as_ref()),
                    "Failure raised while translating an API error"
                );
                TranslatedError::nested_fallback()
            }
        }
    }

    /// Body for a panic that escaped request handling.
    pub fn handle_panic(&self, panic: &(dyn std::any::Any + Send)) -> TranslatedError {
        error!(panic = panic_message(panic), "Request handler panicked");
        TranslatedError::nested_fallback()
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
