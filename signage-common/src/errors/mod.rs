//! API error catalog for the signage services
//!
//! Every failure the daemon reports is reduced to one [`ErrorCode`]. The codes
//! are stable across releases and each has a short/long message pair that
//! clients may fetch for display.

pub mod catalog;

pub use catalog::{ErrorCode, ErrorInfo, UnknownErrorCode, error_code_table, error_message_table};
