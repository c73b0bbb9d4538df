//! Shared types for the signage daemon and control panel.
//!
//! - [`errors`]: the API error code catalog
//! - [`api`]: the failure model, the error translator and wire types
//! - [`config`]: TOML + environment configuration
//! - [`testing`]: test logging helpers

pub mod api;
pub mod config;
pub mod errors;
pub mod testing;

pub use api::{ApiFailure, ApiResult, ErrorResponse, FailureKind, TranslatedError, Translator};
pub use config::{LoadedConfig, SignageConfig, load_config};
pub use errors::{ErrorCode, ErrorInfo};
