//! Error types for segmented downloads.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Coarse classification of a download failure.
///
/// Front ends use this to tell the user which kind of failure occurred
/// without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The URL, segment count or client configuration was rejected before
    /// any network activity.
    InvalidInput,
    /// The size probe failed or returned a non-success status.
    Unreachable,
    /// The server did not report a content length.
    SizeUnknown,
    /// A segment's ranged request failed.
    Http,
    /// Local file creation, sizing, seek, or write failed.
    Io,
}

/// Errors that can occur while downloading a resource.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The URL is not an absolute HTTP(S) URL.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Segment count must be positive.
    #[error("segment count must be at least 1")]
    InvalidSegmentCount,

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// The metadata request failed.
    #[error("resource {url} is unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    /// The server omitted (or sent a malformed) Content-Length.
    #[error("server did not report a size for {url}")]
    SizeUnknown { url: String },

    /// A segment's ranged request failed or returned a bad status.
    #[error("segment {segment} failed: {reason}")]
    Http { segment: usize, reason: String },

    /// Local file I/O failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A segment task panicked or was aborted.
    #[error("segment {segment} task did not complete: {reason}")]
    TaskFailed { segment: usize, reason: String },
}

impl DownloadError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl { .. } | Self::InvalidSegmentCount | Self::Client(_) => {
                ErrorKind::InvalidInput
            }
            Self::Unreachable { .. } => ErrorKind::Unreachable,
            Self::SizeUnknown { .. } => ErrorKind::SizeUnknown,
            Self::Http { .. } | Self::TaskFailed { .. } => ErrorKind::Http,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Whether retrying the same segment could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
