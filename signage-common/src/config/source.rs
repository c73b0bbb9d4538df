//! Provenance tracking for configuration values.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Built-in default.
    Default,
    /// Loaded from a TOML config file.
    File(PathBuf),
    /// Set by an environment variable.
    Environment,
    /// Passed on the command line.
    CommandLine,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::File(path) => write!(f, "file {}", path.display()),
            Self::Environment => write!(f, "environment"),
            Self::CommandLine => write!(f, "command line"),
        }
    }
}

/// A value paired with its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sourced<T> {
    pub value: T,
    pub source: ConfigSource,
    /// Environment variable name, when sourced from the environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub var: Option<String>,
}

impl<T> Sourced<T> {
    pub fn default_value(value: T) -> Self {
        Self {
            value,
            source: ConfigSource::Default,
            var: None,
        }
    }

    pub fn from_env(value: T, var: impl Into<String>) -> Self {
        Self {
            value,
            source: ConfigSource::Environment,
            var: Some(var.into()),
        }
    }

    /// True unless the value is the built-in default.
    pub fn is_overridden(&self) -> bool {
        self.source != ConfigSource::Default
    }
}
