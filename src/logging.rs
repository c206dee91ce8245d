//! Structured logging to a file; the terminal belongs to the UI.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, Result};

/// Resolve the log file path: CLI flag, then `NOTETREE_LOG_FILE`, then the
/// platform data directory.
pub fn resolve_log_file(cli_file: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(p) = cli_file.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(p);
    }
    if let Ok(env_path) = std::env::var("NOTETREE_LOG_FILE") {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    dirs::data_local_dir()
        .map(|d| d.join("notetree").join("notetree.log"))
        .ok_or_else(|| AppError::Config("could not determine a log file location".into()))
}

/// Install the global subscriber. Level comes from `RUST_LOG`, default `info`.
pub fn init(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .map_err(|e| AppError::Config(format!("logging already initialised: {}", e)))
}
