//! API failure model and error translation.
//!
//! Request handlers return [`ApiFailure`] through ordinary `Result`s. A single
//! boundary hands it to a [`Translator`], which classifies it into an
//! [`ErrorCode`](crate::errors::ErrorCode) and renders the [`ErrorResponse`]
//! wire body.

pub mod failure;
pub mod response;
pub mod translator;

pub use failure::{ApiFailure, FailureKind, Origin};
pub use response::{ErrorResponse, SlideMarkup, SlideRef, error_response_schema, error_tag};
pub use translator::{
    ENCODE_FALLBACK_BODY, EncodeError, JsonEncoder, NESTED_FALLBACK_BODY, ResponseEncoder,
    TranslatedError, Translator, classify,
};

/// Result alias for request handlers.
pub type ApiResult<T> = Result<T, ApiFailure>;
