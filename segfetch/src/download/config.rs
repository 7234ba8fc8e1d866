//! Configuration for the segmented downloader.

use std::time::Duration;

use super::error::{DownloadError, DownloadResult};
use super::progress::{DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL};

// ==================== Defaults ====================

/// Default overall timeout for the size probe.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default idle timeout: the longest wait for the next bytes on a connection.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default size of the slices a segment body is written in (8 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Default number of extra attempts per failed segment.
///
/// Zero means a failed segment fails the download immediately.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 0;

/// Default pause between segment retries.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("segfetch/", env!("CARGO_PKG_VERSION"));

/// Tunables for a [`Downloader`](super::Downloader).
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Overall timeout for the HEAD probe.
    ///
    /// Segment requests have no overall limit, since a large segment may
    /// stream for much longer than any fixed deadline.
    pub request_timeout: Duration,

    /// Idle timeout for every connection.
    ///
    /// A segment fails only when no bytes arrive for this long.
    pub read_timeout: Duration,

    /// TCP connect timeout.
    pub connect_timeout: Duration,

    /// Maximum bytes per write into the output file.
    ///
    /// Progress is recorded after every write, so this is also the
    /// granularity of progress updates.
    pub chunk_size: usize,

    /// How often the progress reporter polls the byte counter.
    pub poll_interval: Duration,

    /// Extra attempts for a segment whose ranged request fails.
    ///
    /// A retry resumes from the first byte the segment has not written.
    pub retry_attempts: u32,

    /// Pause between retries of the same segment.
    pub retry_delay: Duration,

    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl DownloadConfig {
    /// Set the probe timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the idle timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the write chunk size. Values below 1 are raised to 1.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the progress poll interval. Raised to at least 1 ms.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Set retry attempts and the delay between them.
    pub fn with_retries(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the HTTP client shared by the probe and every segment.
    ///
    /// Only connect and idle timeouts are set here. The probe applies
    /// `request_timeout` to its own request.
    pub fn build_client(&self) -> DownloadResult<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .read_timeout(self.read_timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|e| DownloadError::Client(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DownloadConfig::default();
        assert_eq!(config.chunk_size, 8192);
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.retry_attempts, 0);
        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert!(config.user_agent.starts_with("segfetch/"));
    }

    #[test]
    fn test_builder_overrides() {
        let config = DownloadConfig::default()
            .with_chunk_size(0)
            .with_retries(3, Duration::from_millis(10))
            .with_poll_interval(Duration::from_millis(50))
            .with_user_agent("test-agent");

        assert_eq!(config.chunk_size, 1);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(10));
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn test_zero_poll_interval_is_raised() {
        let config = DownloadConfig::default().with_poll_interval(Duration::ZERO);
        assert_eq!(config.poll_interval, Duration::from_millis(1));
    }

    #[test]
    fn test_build_client() {
        let config = DownloadConfig::default()
            .with_request_timeout(Duration::from_secs(5))
            .with_read_timeout(Duration::from_secs(5));
        assert!(config.build_client().is_ok());
    }
}
