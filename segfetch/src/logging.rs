//! Tracing subscriber setup.
//!
//! Logs go to `<log dir>/segfetch.log` through a non-blocking writer and,
//! when verbose, to stderr as well. Nothing is ever written to stdout, which
//! carries the progress line.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "segfetch=info";

/// Log file name inside the log directory.
pub const LOG_FILE_NAME: &str = "segfetch.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open log file: {0}")]
    Appender(String),

    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Default log directory (`<data dir>/segfetch/logs`).
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("segfetch")
        .join("logs")
}

/// Full path of the log file inside `log_dir`.
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

/// Build the filter from `RUST_LOG`, falling back to `default`.
pub fn build_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer when dropped and must be held
/// until the process exits.
pub fn init_logging(log_dir: &Path, verbose: bool) -> Result<WorkerGuard, LoggingError> {
    std::fs::create_dir_all(log_dir).map_err(|e| LoggingError::CreateDir {
        path: log_dir.to_path_buf(),
        source: e,
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("segfetch")
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| LoggingError::Appender(e.to_string()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_timer(UtcTime::rfc_3339());

    let stderr_layer = verbose.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(build_filter(DEFAULT_LOG_FILTER))
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path() {
        let path = log_file_path(Path::new("/var/log/segfetch"));
        assert_eq!(path, PathBuf::from("/var/log/segfetch/segfetch.log"));
    }

    #[test]
    fn test_default_log_dir_is_app_scoped() {
        let dir = default_log_dir();
        assert!(dir.ends_with("segfetch/logs"));
    }

    #[test]
    fn test_build_filter_accepts_default() {
        let filter = build_filter(DEFAULT_LOG_FILTER);
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn test_init_logging_writes_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let guard = init_logging(dir.path(), false).unwrap();

        tracing::info!(target: "segfetch", "logging smoke test");
        drop(guard);

        let content = std::fs::read_to_string(log_file_path(dir.path())).unwrap();
        assert!(content.contains("logging smoke test"));

        let err = init_logging(dir.path(), false).unwrap_err();
        assert!(matches!(err, LoggingError::Install(_)));
    }
}
