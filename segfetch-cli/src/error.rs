//! CLI error type.

use std::fmt;

use segfetch::download::{DownloadError, ErrorKind};
use segfetch::filter::FilterError;
use segfetch::settings::SettingsError;

/// Errors surfaced to the user by the command line front end.
#[derive(Debug)]
pub enum CliError {
    /// The download itself failed.
    Download(DownloadError),

    /// The URL was rejected by the extension allow-list.
    Filter(FilterError),

    /// Settings could not be loaded, saved or edited.
    Settings(SettingsError),

    /// Invalid command line or configuration input.
    Config(String),

    /// Failed to create the Tokio runtime.
    Runtime(std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Download(e) => match e.kind() {
                ErrorKind::InvalidInput => 2,
                ErrorKind::Unreachable | ErrorKind::SizeUnknown => 3,
                ErrorKind::Http => 4,
                ErrorKind::Io => 5,
            },
            CliError::Filter(_) | CliError::Config(_) => 2,
            CliError::Settings(_) | CliError::Runtime(_) => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Download(e) => {
                let label = match e.kind() {
                    ErrorKind::InvalidInput => "Invalid input",
                    ErrorKind::Unreachable => "Resource unreachable",
                    ErrorKind::SizeUnknown => "Size unknown",
                    ErrorKind::Http => "Segment download failed",
                    ErrorKind::Io => "File error",
                };
                write!(f, "{}: {}", label, e)
            }
            CliError::Filter(e) => write!(f, "URL rejected: {}", e),
            CliError::Settings(e) => write!(f, "Settings error: {}", e),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to create Tokio runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Download(e) => Some(e),
            CliError::Filter(e) => Some(e),
            CliError::Settings(e) => Some(e),
            CliError::Config(_) => None,
            CliError::Runtime(e) => Some(e),
        }
    }
}

impl From<DownloadError> for CliError {
    fn from(e: DownloadError) -> Self {
        CliError::Download(e)
    }
}

impl From<FilterError> for CliError {
    fn from(e: FilterError) -> Self {
        CliError::Filter(e)
    }
}

impl From<SettingsError> for CliError {
    fn from(e: SettingsError) -> Self {
        CliError::Settings(e)
    }
}
