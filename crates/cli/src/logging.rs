//! Logging setup.
//!
//! Human output goes to stdout; tracing goes to stderr and, when requested,
//! to `relay.log` in a log directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE: &str = "relay.log";

/// Platform-specific log directory.
///
/// - macOS: `~/Library/Caches/proof-relay/logs`
/// - Linux: `~/.cache/proof-relay/logs` (or `$XDG_CACHE_HOME/proof-relay/logs`)
/// - Windows: `%LOCALAPPDATA%\proof-relay\logs`
/// - Fallback: `/tmp/proof-relay/logs`
pub fn default_log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "proof-relay")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/proof-relay"))
        .join("logs")
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `info`, or `debug` with
/// `verbose`. The returned guard flushes the file writer on drop and must be
/// held until exit.
pub fn init(verbose: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter());

    let Some(dir) = log_dir else {
        tracing_subscriber::registry().with(stderr_layer).init();
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_filter(filter());

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::debug!("Log file: {}", dir.join(LOG_FILE).display());
    Ok(Some(guard))
}
