//! Test logging.
//!
//! [`init_global_test_logging`] installs one process-wide subscriber that
//! writes every `tracing` event twice: as JSONL to a file under the target
//! directory, and as compact text to the libtest-captured output. Call it
//! at the top of any test whose logs are worth keeping.
//!
//! - `SIGNAGE_TEST_LOG_FILE` overrides the JSONL path
//!   (default `target/test-logs/signage_tests.jsonl`).
//! - `SIGNAGE_TEST_LOG_LEVEL` sets the level for the workspace crates
//!   (default `info`).

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;

const WORKSPACE_TARGETS: [&str; 3] = ["signage", "signaged", "signage_common"];

static LOG_PATH: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Install the test subscriber. Idempotent.
///
/// Returns the JSONL file path, or `None` if the file could not be created
/// (events then only reach the test output).
pub fn init_global_test_logging() -> Option<&'static Path> {
    LOG_PATH
        .get_or_init(|| {
            let path = log_file_path();
            let file = open_log_file(&path);
            let opened = file.is_some();

            let json = file.map(|file| {
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(Mutex::new(file))
                    .with_span_events(FmtSpan::CLOSE)
                    .with_file(true)
                    .with_line_number(true)
            });
            let text = tracing_subscriber::fmt::layer()
                .with_test_writer()
                .compact();

            let registry = tracing_subscriber::registry()
                .with(test_filter())
                .with(json)
                .with(text);
            // Another subscriber may already be installed by the test binary.
            let _ = tracing::subscriber::set_global_default(registry);

            opened.then_some(path)
        })
        .as_deref()
}

fn test_filter() -> EnvFilter {
    let level = std::env::var("SIGNAGE_TEST_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let directives = WORKSPACE_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn log_file_path() -> PathBuf {
    match std::env::var_os("SIGNAGE_TEST_LOG_FILE") {
        Some(custom) => PathBuf::from(custom),
        None => target_dir().join("test-logs").join("signage_tests.jsonl"),
    }
}

fn open_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok()?;
    }
    File::create(path).ok()
}

/// `CARGO_TARGET_DIR`, else the nearest `target/` above the working directory.
fn target_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("CARGO_TARGET_DIR") {
        return PathBuf::from(dir);
    }
    std::env::current_dir()
        .ok()
        .and_then(|cwd| {
            cwd.ancestors()
                .map(|dir| dir.join("target"))
                .find(|target| target.is_dir())
        })
        .unwrap_or_else(|| PathBuf::from("target"))
}
