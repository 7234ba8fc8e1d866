//! Size probe: a HEAD request that learns the resource length.

use std::time::Duration;

use reqwest::header::{HeaderMap, ACCEPT_RANGES, CONTENT_LENGTH};
use reqwest::{Client, Url};
use tracing::debug;

use super::error::{DownloadError, DownloadResult};

/// What the server told us about the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceInfo {
    /// Exact size in bytes, from `Content-Length`.
    pub size: u64,
    /// Whether the server advertised `Accept-Ranges: bytes`.
    ///
    /// Informational only. Segments are requested with ranges regardless and
    /// the fetcher checks each response status.
    pub accepts_ranges: bool,
}

/// Check that `url` is an absolute HTTP or HTTPS URL.
pub fn validate_url(url: &str) -> DownloadResult<Url> {
    let parsed = Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(DownloadError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Issue a HEAD request for `url` and read its size.
///
/// `timeout` bounds the whole request, response headers included.
///
/// # Errors
///
/// - [`DownloadError::InvalidUrl`] if the URL is not absolute HTTP(S)
/// - [`DownloadError::Unreachable`] on network failure or a non-2xx status
/// - [`DownloadError::SizeUnknown`] if `Content-Length` is absent or malformed
pub async fn probe_size(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> DownloadResult<ResourceInfo> {
    let parsed = validate_url(url)?;

    let response = client
        .head(parsed)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| DownloadError::Unreachable {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Unreachable {
            url: url.to_string(),
            reason: format!("HEAD request failed with status {}", status),
        });
    }

    let headers = response.headers();
    let size = content_length(headers).ok_or_else(|| DownloadError::SizeUnknown {
        url: url.to_string(),
    })?;
    let accepts_ranges = accepts_byte_ranges(headers);

    debug!(url, size, accepts_ranges, "Probed resource");
    Ok(ResourceInfo {
        size,
        accepts_ranges,
    })
}

/// `Content-Length` as a byte count, if present and well-formed.
fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

fn accepts_byte_ranges(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').any(|unit| unit.trim().eq_ignore_ascii_case("bytes")))
        .unwrap_or(false)
}
