//! Failures raised while handling an API request.

use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;

use thiserror::Error;

use crate::errors::ErrorCode;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What kind of failure was raised. Classification is a match over this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Explicitly tagged with an API error code.
    Api(ErrorCode),
    /// Invalid argument or failed validation.
    Argument,
    /// A configured limit was hit.
    Limit,
    /// A file had a rejected type.
    FileType,
    /// Anything else.
    Internal,
}

/// Where a failure was raised.
#[derive(Debug)]
pub struct Origin {
    location: &'static Location<'static>,
    backtrace: Backtrace,
}

impl Origin {
    #[track_caller]
    fn here() -> Self {
        Self {
            location: Location::caller(),
            backtrace: Backtrace::capture(),
        }
    }

    /// Source file of the raise site.
    pub fn file(&self) -> &'static str {
        self.location.file()
    }

    /// Source line of the raise site.
    pub fn line(&self) -> u32 {
        self.location.line()
    }

    /// Backtrace text. Empty capture unless `RUST_BACKTRACE` is set.
    pub fn trace(&self) -> String {
        self.backtrace.to_string()
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ ln: {}", self.file(), self.line())
    }
}

/// A failure surfaced during request handling.
///
/// Handlers return `Result<_, ApiFailure>` and let it propagate to the single
/// error boundary, which classifies it exactly once.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiFailure {
    kind: FailureKind,
    message: String,
    origin: Origin,
    #[source]
    source: Option<BoxError>,
}

impl ApiFailure {
    #[track_caller]
    fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            origin: Origin::here(),
            source: None,
        }
    }

    /// Failure carrying an explicit API error code.
    #[track_caller]
    pub fn api(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(FailureKind::Api(code), message)
    }

    /// Invalid argument or request.
    #[track_caller]
    pub fn argument(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Argument, message)
    }

    /// A configured limit would be exceeded.
    #[track_caller]
    pub fn limit(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Limit, message)
    }

    /// A file type was rejected.
    #[track_caller]
    pub fn file_type(message: impl Into<String>) -> Self {
        Self::new(FailureKind::FileType, message)
    }

    /// Unclassified internal fault.
    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Internal, message)
    }

    /// Attach the underlying error.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// What kind of failure this is.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Human-readable message, reported as `e_msg` in debug mode.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Where the failure was raised.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }
}

impl From<std::io::Error> for ApiFailure {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("I/O error: {err}")).with_source(err)
    }
}

impl From<serde_json::Error> for ApiFailure {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {err}")).with_source(err)
    }
}

impl From<anyhow::Error> for ApiFailure {
    #[track_caller]
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string()).with_source(err)
    }
}
