//! Per-segment ranged fetch.
//!
//! A [`SegmentFetcher`] requests one byte range, streams the body into the
//! shared output file at the segment's offset and records every write in the
//! progress counter. Writes are capped at the segment length, so a segment
//! never touches bytes owned by another segment.

use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::config::DownloadConfig;
use super::error::{DownloadError, DownloadResult};
use super::output::OutputFile;
use super::plan::{ByteRange, SegmentTask};
use super::progress::ProgressCounter;

/// Fetches segments into a shared output file.
///
/// Cloning is cheap; every segment task gets its own clone.
#[derive(Debug, Clone)]
pub struct SegmentFetcher {
    client: Client,
    output: OutputFile,
    counter: ProgressCounter,
    chunk_size: usize,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl SegmentFetcher {
    /// Create a fetcher writing into `output` and counting into `counter`.
    pub fn new(
        client: Client,
        output: OutputFile,
        counter: ProgressCounter,
        config: &DownloadConfig,
    ) -> Self {
        Self {
            client,
            output,
            counter,
            chunk_size: config.chunk_size.max(1),
            retry_attempts: config.retry_attempts,
            retry_delay: config.retry_delay,
        }
    }

    /// Fetch one segment, retrying HTTP failures if configured.
    ///
    /// Returns the number of bytes written, which equals the segment length
    /// on success. A retry resumes from the first unwritten byte, so bytes
    /// already counted are never counted twice.
    pub async fn fetch(&self, task: &SegmentTask) -> DownloadResult<u64> {
        let mut written = 0u64;
        let mut attempt = 0u32;

        debug!(
            segment = task.index,
            range = %task.range.header_value(),
            "Segment starting"
        );

        loop {
            match self.fetch_remaining(task, &mut written).await {
                Ok(()) => {
                    debug!(segment = task.index, bytes = written, "Segment complete");
                    return Ok(written);
                }
                Err(e) if e.is_retryable() && attempt < self.retry_attempts => {
                    attempt += 1;
                    warn!(
                        segment = task.index,
                        attempt,
                        max_attempts = self.retry_attempts,
                        resume_at = task.range.start + written,
                        error = %e,
                        "Segment failed, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One request for the part of the segment not yet written.
    async fn fetch_remaining(&self, task: &SegmentTask, written: &mut u64) -> DownloadResult<()> {
        let range = task.range;
        let expected = range.len();
        if *written >= expected {
            return Ok(());
        }

        let request = ByteRange::new(range.start + *written, range.end);
        let response = self
            .client
            .get(&task.url)
            .header(RANGE, request.header_value())
            .send()
            .await
            .map_err(|e| http_error(task.index, format!("request failed: {}", e)))?;

        // Bytes at the front of the body that precede `request.start`.
        let mut skip = match response.status() {
            StatusCode::PARTIAL_CONTENT => {
                if let Some(start) = response
                    .headers()
                    .get(CONTENT_RANGE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(content_range_start)
                {
                    if start != request.start {
                        return Err(http_error(
                            task.index,
                            format!(
                                "server returned range starting at {}, expected {}",
                                start, request.start
                            ),
                        ));
                    }
                }
                0
            }
            // Range ignored: the body is the whole resource, usable only by
            // the segment that starts at offset 0.
            StatusCode::OK if range.start == 0 => request.start,
            StatusCode::OK => {
                return Err(http_error(
                    task.index,
                    "server ignored the range request".to_string(),
                ))
            }
            status => return Err(http_error(task.index, format!("HTTP {}", status))),
        };

        let mut stream = response.bytes_stream();
        while *written < expected {
            let Some(item) = stream.next().await else {
                break;
            };
            let mut data: Bytes =
                item.map_err(|e| http_error(task.index, format!("body read failed: {}", e)))?;

            if skip > 0 {
                let n = skip.min(data.len() as u64) as usize;
                data = data.slice(n..);
                skip -= n as u64;
            }

            let remaining = expected - *written;
            if data.len() as u64 > remaining {
                data.truncate(remaining as usize);
            }

            for chunk in data.chunks(self.chunk_size) {
                self.output.write_at(range.start + *written, chunk).await?;
                *written += chunk.len() as u64;
                self.counter.add(chunk.len() as u64);
            }
        }

        if *written < expected {
            return Err(http_error(
                task.index,
                format!(
                    "incomplete body: expected {} bytes, received {}",
                    expected, *written
                ),
            ));
        }

        Ok(())
    }
}

fn http_error(segment: usize, reason: String) -> DownloadError {
    DownloadError::Http { segment, reason }
}

/// First byte offset of a `Content-Range: bytes start-end/total` value.
fn content_range_start(value: &str) -> Option<u64> {
    let rest = value.trim().strip_prefix("bytes")?.trim_start();
    let (start, _) = rest.split_once('-')?;
    start.trim().parse().ok()
}
