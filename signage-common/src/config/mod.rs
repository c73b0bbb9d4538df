//! Configuration system for the signage services.
//!
//! Values are resolved in order of increasing precedence:
//! - Built-in defaults
//! - The TOML config file (`signage.toml` in the user config directory, or an
//!   explicit path)
//! - `SIGNAGE_*` environment variables
//!
//! Command-line flags are applied on top by the binaries.

pub mod env;
pub mod source;

pub use env::{EnvError, EnvParser};
pub use source::{ConfigSource, Sourced};

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default upper bound on the number of slides the daemon will hold.
pub const DEFAULT_MAX_SLIDES: usize = 256;

/// Config file name looked up in the user config directory.
pub const CONFIG_FILE_NAME: &str = "signage.toml";

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid environment configuration: {}", format_env_errors(.0))]
    Env(Vec<EnvError>),
}

fn format_env_errors(errors: &[EnvError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Daemon settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP API listens on.
    pub listen: SocketAddr,
    /// Directory whose files seed the slide store.
    pub slides_dir: Option<PathBuf>,
    /// Maximum number of slides held in the store.
    pub max_slides: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            slides_dir: None,
            max_slides: DEFAULT_MAX_SLIDES,
        }
    }
}

/// API behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Include raise site, message and backtrace in error responses.
    pub debug: bool,
}

/// Control panel client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the signage daemon.
    pub server_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignageConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub client: ClientConfig,
}

/// Resolved configuration plus where the debug flag came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: SignageConfig,
    pub debug_source: ConfigSource,
    pub file: Option<PathBuf>,
}

impl SignageConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Apply `SIGNAGE_*` overrides. Returns the debug flag's provenance.
    pub fn apply_env(&mut self, parser: &mut EnvParser) -> Option<ConfigSource> {
        let debug = parser.get_bool("DEBUG", self.api.debug);
        self.api.debug = debug.value;

        let listen = parser.get_socket_addr("LISTEN", self.server.listen);
        self.server.listen = listen.value;

        let max_slides = parser.get_usize_range("MAX_SLIDES", self.server.max_slides, 1, 100_000);
        self.server.max_slides = max_slides.value;

        if let Some(dir) = parser.get_optional_path("SLIDES_DIR").value {
            self.server.slides_dir = Some(dir);
        }
        if let Some(url) = parser.get_optional_string("SERVER_URL").value {
            self.client.server_url = url;
        }

        debug.is_overridden().then_some(debug.source)
    }
}

/// Default config file location in the user config directory.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "signage")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Load configuration from `path` (or the default location) and the
/// environment.
///
/// An explicit `path` must exist; the default location is optional.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let (mut config, file) = match path {
        Some(p) => (SignageConfig::from_file(p)?, Some(p.to_path_buf())),
        None => match default_config_path() {
            Some(p) if p.is_file() => (SignageConfig::from_file(&p)?, Some(p)),
            _ => (SignageConfig::default(), None),
        },
    };

    let mut debug_source = match (&file, config.api.debug) {
        (Some(p), true) => ConfigSource::File(p.clone()),
        _ => ConfigSource::Default,
    };

    let mut parser = EnvParser::new();
    if let Some(source) = config.apply_env(&mut parser) {
        debug_source = source;
    }
    if parser.has_errors() {
        return Err(ConfigError::Env(parser.take_errors()));
    }

    debug!(
        file = ?file,
        debug = config.api.debug,
        debug_source = %debug_source,
        "Configuration loaded"
    );

    Ok(LoadedConfig {
        config,
        debug_source,
        file,
    })
}

#[cfg(test)]
pub(crate) fn env_test_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use std::io::Write;

    fn clear_signage_env() {
        for var in [
            "SIGNAGE_DEBUG",
            "SIGNAGE_LISTEN",
            "SIGNAGE_MAX_SLIDES",
            "SIGNAGE_SLIDES_DIR",
            "SIGNAGE_SERVER_URL",
        ] {
            // SAFETY: guarded by env_test_lock
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    fn test_defaults() {
        let config = SignageConfig::default();
        assert!(!config.api.debug);
        assert_eq!(config.server.listen.port(), 8080);
        assert_eq!(config.server.max_slides, DEFAULT_MAX_SLIDES);
        assert_eq!(config.client.server_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SignageConfig::from_toml_str(
            "[api]\ndebug = true\n\n[server]\nslides_dir = \"/srv/slides\"\n",
            Path::new("signage.toml"),
        )
        .unwrap();
        assert!(config.api.debug);
        assert_eq!(config.server.slides_dir, Some(PathBuf::from("/srv/slides")));
        assert_eq!(config.server.max_slides, DEFAULT_MAX_SLIDES);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = SignageConfig::from_toml_str("[api\ndebug = ", Path::new("bad.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_missing_explicit_file_is_read_error() {
        let err = load_config(Some(Path::new("/nonexistent/signage.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_env_overrides_file() {
        let _guard = env_test_lock();
        clear_signage_env();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\ndebug = false\n[server]\nmax_slides = 3").unwrap();

        // SAFETY: guarded by env_test_lock
        unsafe { std::env::set_var("SIGNAGE_DEBUG", "1") };
        let loaded = load_config(Some(file.path())).unwrap();
        clear_signage_env();

        assert!(loaded.config.api.debug);
        assert_eq!(loaded.debug_source, ConfigSource::Environment);
        assert_eq!(loaded.config.server.max_slides, 3);
        assert_eq!(loaded.file.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_debug_from_file_is_tracked() {
        let _guard = env_test_lock();
        clear_signage_env();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\ndebug = true").unwrap();

        let loaded = load_config(Some(file.path())).unwrap();
        assert!(loaded.config.api.debug);
        assert_eq!(
            loaded.debug_source,
            ConfigSource::File(file.path().to_path_buf())
        );
    }

    #[test]
    fn test_invalid_env_is_reported() {
        let _guard = env_test_lock();
        clear_signage_env();

        let file = tempfile::NamedTempFile::new().unwrap();
        // SAFETY: guarded by env_test_lock
        unsafe { std::env::set_var("SIGNAGE_DEBUG", "sometimes") };
        let err = load_config(Some(file.path())).unwrap_err();
        clear_signage_env();

        match err {
            ConfigError::Env(errors) => assert_eq!(errors.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }
}
