//! API Error Catalog
//!
//! This module defines the fixed catalog of API error codes. Each code has:
//! - A stable numeric value that is never reused
//! - A wire name (`API_E_*`) used by the error-code endpoint
//! - A short and a long human-readable message
//!
//! # Error Codes
//!
//! | Code | Name                     | Produced by            |
//! |------|--------------------------|------------------------|
//! | 0    | `API_E_OK`               | never (reserved)       |
//! | 1    | `API_E_INTERNAL`         | server                 |
//! | 2    | `API_E_INVALID_REQUEST`  | server                 |
//! | 3    | `API_E_NOT_AUTHORIZED`   | server                 |
//! | 4    | `API_E_QUOTA_EXCEEDED`   | server                 |
//! | 5    | `API_E_LIMITED`          | server                 |
//! | 6    | `API_E_CLIENT`           | client only            |
//! | 7    | `API_E_RATE`             | server                 |
//! | 8    | `API_E_INCORRECT_CREDS`  | server                 |
//! | 9    | `API_E_LOCK`             | server                 |
//! | 10   | `API_E_UPLOAD`           | server                 |
//! | 11   | `API_E_INVALID_FILETYPE` | server                 |
//!
//! # Example
//!
//! ```rust
//! use signage_common::errors::catalog::ErrorCode;
//!
//! let info = ErrorCode::Lock.info();
//! println!("Error {}: {}", ErrorCode::Lock.code_number(), info.short);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// API error code enumeration.
///
/// Encoded on the wire as its integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum ErrorCode {
    /// No error
    Ok = 0,
    /// Unclassified server-side fault
    Internal = 1,
    /// Malformed or semantically invalid input
    InvalidRequest = 2,
    /// Caller lacks permission
    NotAuthorized = 3,
    /// Resource quota exhausted
    QuotaExceeded = 4,
    /// A configured operational limit was hit
    Limited = 5,
    /// Reserved for client-only signaling
    Client = 6,
    /// Request throttled
    Rate = 7,
    /// Authentication credentials rejected
    IncorrectCreds = 8,
    /// Locking conflict on a slide
    Lock = 9,
    /// File upload failed
    Upload = 10,
    /// Uploaded file type rejected
    InvalidFiletype = 11,
}

/// Short and long human-readable messages for an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    /// One-line summary
    pub short: &'static str,
    /// Full sentence description
    pub long: &'static str,
}

/// Decoding an integer that is not in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown API error code {0}")]
pub struct UnknownErrorCode(pub u64);

impl ErrorCode {
    /// Returns the numeric error code.
    #[must_use]
    pub const fn code_number(&self) -> u8 {
        *self as u8
    }

    /// Returns the wire name (e.g., "API_E_LOCK").
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ok => "API_E_OK",
            Self::Internal => "API_E_INTERNAL",
            Self::InvalidRequest => "API_E_INVALID_REQUEST",
            Self::NotAuthorized => "API_E_NOT_AUTHORIZED",
            Self::QuotaExceeded => "API_E_QUOTA_EXCEEDED",
            Self::Limited => "API_E_LIMITED",
            Self::Client => "API_E_CLIENT",
            Self::Rate => "API_E_RATE",
            Self::IncorrectCreds => "API_E_INCORRECT_CREDS",
            Self::Lock => "API_E_LOCK",
            Self::Upload => "API_E_UPLOAD",
            Self::InvalidFiletype => "API_E_INVALID_FILETYPE",
        }
    }

    /// Returns the short message.
    #[must_use]
    pub const fn short(&self) -> &'static str {
        match self {
            Self::Ok => "No error",
            Self::Internal => "Internal server error",
            Self::InvalidRequest => "Invalid request",
            Self::NotAuthorized => "Not authorized",
            Self::QuotaExceeded => "Quota exceeded",
            Self::Limited => "Limited",
            Self::Client => "Client error",
            Self::Rate => "API rate limited",
            Self::IncorrectCreds => "Incorrect credentials received",
            Self::Lock => "Slide lock error",
            Self::Upload => "Upload error",
            Self::InvalidFiletype => "Invalid filetype",
        }
    }

    /// Returns the long message.
    #[must_use]
    pub const fn long(&self) -> &'static str {
        match self {
            Self::Ok => "No error occurred.",
            Self::Internal => "The server encountered an internal server error.",
            Self::InvalidRequest => {
                "The server responded with an invalid request error. \
                 This is probably due to a software bug."
            }
            Self::NotAuthorized => "You are not authorized to perform this action.",
            Self::QuotaExceeded => "You have exceeded your quota for this action.",
            Self::Limited => {
                "The server prevented this action because a server limit \
                 would have been exceeded."
            }
            Self::Client => "The client encountered an error.",
            Self::Rate => {
                "The server ignored an API call because the API rate limit was exceeded."
            }
            Self::IncorrectCreds => "The authentication system received incorrect credentials.",
            Self::Lock => "A slide locking error occurred.",
            Self::Upload => "An error occurred while uploading a file.",
            Self::InvalidFiletype => "An uploaded file had an invalid filetype.",
        }
    }

    /// Returns the message pair for this code.
    #[must_use]
    pub const fn info(&self) -> ErrorInfo {
        ErrorInfo {
            short: self.short(),
            long: self.long(),
        }
    }

    /// Whether the server may ever put this code in an error response.
    ///
    /// `Ok` is not an error and `Client` is reserved for client-side use.
    #[must_use]
    pub const fn is_server_producible(&self) -> bool {
        !matches!(self, Self::Ok | Self::Client)
    }

    /// HTTP status used when a request is terminated with this code.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::InvalidRequest | Self::InvalidFiletype => 400,
            Self::IncorrectCreds => 401,
            Self::NotAuthorized => 403,
            Self::Lock => 409,
            Self::Upload => 422,
            Self::QuotaExceeded | Self::Limited | Self::Rate => 429,
            Self::Internal | Self::Client => 500,
        }
    }

    /// Returns all error codes in numeric order.
    #[must_use]
    pub const fn all() -> &'static [ErrorCode] {
        &[
            Self::Ok,
            Self::Internal,
            Self::InvalidRequest,
            Self::NotAuthorized,
            Self::QuotaExceeded,
            Self::Limited,
            Self::Client,
            Self::Rate,
            Self::IncorrectCreds,
            Self::Lock,
            Self::Upload,
            Self::InvalidFiletype,
        ]
    }
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> Self {
        code.code_number()
    }
}

impl TryFrom<u8> for ErrorCode {
    type Error = UnknownErrorCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ErrorCode::all()
            .iter()
            .copied()
            .find(|code| code.code_number() == value)
            .ok_or(UnknownErrorCode(u64::from(value)))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code_number(), self.short())
    }
}

/// Wire name to number, as served by the error-code endpoint.
#[must_use]
pub fn error_code_table() -> BTreeMap<&'static str, u8> {
    ErrorCode::all()
        .iter()
        .map(|code| (code.name(), code.code_number()))
        .collect()
}

/// Number to message pair, as served by the error-message endpoint.
#[must_use]
pub fn error_message_table() -> BTreeMap<u8, ErrorInfo> {
    ErrorCode::all()
        .iter()
        .map(|code| (code.code_number(), code.info()))
        .collect()
}
