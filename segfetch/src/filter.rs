//! Extension allow-list applied to URLs before a download starts.

use reqwest::Url;
use thiserror::Error;

/// File name used when a URL path has no usable last segment.
pub const DEFAULT_FILE_NAME: &str = "download.bin";

/// Why a URL was rejected by an [`ExtensionFilter`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("'{url}' has no file extension")]
    MissingExtension { url: String },

    #[error("extension '{extension}' is not allowed (from '{url}')")]
    Disallowed { url: String, extension: String },
}

/// Case-insensitive allow-list of file extensions.
///
/// Entries may be single (`iso`) or compound (`tar.gz`). An empty list
/// allows every URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionFilter {
    allowed: Vec<String>,
}

impl ExtensionFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { allowed }
    }

    /// Whether the filter accepts every URL.
    pub fn allows_all(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Normalized allowed extensions.
    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    /// Accept or reject `url` by the extension of its last path segment.
    pub fn check(&self, url: &str) -> Result<(), FilterError> {
        if self.allows_all() {
            return Ok(());
        }

        let parsed = Url::parse(url).map_err(|e| FilterError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let name = last_segment(&parsed)
            .map(|s| s.to_ascii_lowercase())
            .ok_or_else(|| FilterError::MissingExtension {
                url: url.to_string(),
            })?;

        if self
            .allowed
            .iter()
            .any(|ext| name.len() > ext.len() + 1 && name.ends_with(&format!(".{}", ext)))
        {
            return Ok(());
        }

        match name.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() && !extension.is_empty() => {
                Err(FilterError::Disallowed {
                    url: url.to_string(),
                    extension: extension.to_string(),
                })
            }
            _ => Err(FilterError::MissingExtension {
                url: url.to_string(),
            }),
        }
    }
}

fn last_segment(url: &Url) -> Option<&str> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
}

/// Destination file name for `url`: its last path segment, or
/// [`DEFAULT_FILE_NAME`].
pub fn file_name_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| last_segment(&u).map(str::to_string))
        .filter(|name| name != "." && name != "..")
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
}
