//! `SIGNAGE_*` environment overrides.
//!
//! [`EnvParser`] reads typed values and keeps going past bad input, so a
//! misconfigured environment is reported in one pass.

use super::source::Sourced;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const PREFIX: &str = "SIGNAGE_";

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// A rejected environment value.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("Invalid value for {var}: expected {expected}, got '{value}'")]
    InvalidValue {
        var: String,
        expected: &'static str,
        value: String,
    },

    #[error("Value out of range for {var}: {value} (valid: {min}..={max})")]
    OutOfRange {
        var: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("Invalid log level for {var}: {value}")]
    InvalidLogLevel { var: String, value: String },
}

/// Collecting parser for `SIGNAGE_*` variables.
///
/// Every getter falls back to its default on bad input and records an
/// [`EnvError`].
#[derive(Debug, Default)]
pub struct EnvParser {
    errors: Vec<EnvError>,
}

impl EnvParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &[EnvError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn take_errors(&mut self) -> Vec<EnvError> {
        std::mem::take(&mut self.errors)
    }

    /// Full variable name and raw value, if set.
    fn lookup(name: &str) -> Option<(String, String)> {
        let var = format!("{PREFIX}{name}");
        env::var(&var).ok().map(|value| (var, value))
    }

    /// Parse `name` with `T::from_str`, recording `expected` on failure.
    fn parsed<T: FromStr>(&mut self, name: &str, default: T, expected: &'static str) -> Sourced<T> {
        let Some((var, value)) = Self::lookup(name) else {
            return Sourced::default_value(default);
        };
        match value.trim().parse() {
            Ok(parsed) => Sourced::from_env(parsed, var),
            Err(_) => {
                self.errors.push(EnvError::InvalidValue {
                    var,
                    expected,
                    value,
                });
                Sourced::default_value(default)
            }
        }
    }

    /// Boolean flag. Accepts 1/true/yes/on and 0/false/no/off/"".
    pub fn get_bool(&mut self, name: &str, default: bool) -> Sourced<bool> {
        let Some((var, value)) = Self::lookup(name) else {
            return Sourced::default_value(default);
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Sourced::from_env(true, var),
            "0" | "false" | "no" | "off" | "" => Sourced::from_env(false, var),
            _ => {
                self.errors.push(EnvError::InvalidValue {
                    var,
                    expected: "boolean (true/false/1/0/yes/no)",
                    value,
                });
                Sourced::default_value(default)
            }
        }
    }

    /// Unsigned integer within `min..=max`.
    pub fn get_usize_range(
        &mut self,
        name: &str,
        default: usize,
        min: usize,
        max: usize,
    ) -> Sourced<usize> {
        let sourced = self.parsed(name, default, "unsigned integer");
        if (min..=max).contains(&sourced.value) || !sourced.is_overridden() {
            return sourced;
        }
        self.errors.push(EnvError::OutOfRange {
            var: sourced.var.unwrap_or_default(),
            value: sourced.value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        });
        Sourced::default_value(default)
    }

    /// Socket address such as `127.0.0.1:8080`.
    pub fn get_socket_addr(&mut self, name: &str, default: SocketAddr) -> Sourced<SocketAddr> {
        self.parsed(name, default, "socket address (host:port)")
    }

    /// A `tracing` level name, lowercased.
    pub fn get_log_level(&mut self, name: &str, default: &str) -> Sourced<String> {
        let Some((var, value)) = Self::lookup(name) else {
            return Sourced::default_value(default.to_string());
        };
        let level = value.trim().to_ascii_lowercase();
        if LOG_LEVELS.contains(&level.as_str()) {
            return Sourced::from_env(level, var);
        }
        self.errors.push(EnvError::InvalidLogLevel { var, value });
        Sourced::default_value(default.to_string())
    }

    /// String value; set-but-empty counts as an explicit `None`.
    pub fn get_optional_string(&mut self, name: &str) -> Sourced<Option<String>> {
        match Self::lookup(name) {
            Some((var, value)) => Sourced::from_env((!value.is_empty()).then_some(value), var),
            None => Sourced::default_value(None),
        }
    }

    /// Path value with a leading `~/` expanded.
    pub fn get_optional_path(&mut self, name: &str) -> Sourced<Option<PathBuf>> {
        let Sourced { value, source, var } = self.get_optional_string(name);
        Sourced {
            value: value.map(|raw| expand_home(&raw)),
            source,
            var,
        }
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    match (raw.strip_prefix("~/"), directories::BaseDirs::new()) {
        (Some(rest), Some(base)) => base.home_dir().join(rest),
        _ => PathBuf::from(raw),
    }
}
