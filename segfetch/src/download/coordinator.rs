//! Top-level download orchestration.
//!
//! [`Downloader::download`] runs probe, plan, pre-size, fan-out and join, in
//! that order. The progress reporter (if any) is stopped and awaited after
//! every segment has finished and before the result is returned, so nothing
//! renders after the caller sees the outcome. If the `download` future is
//! dropped early, the reporter is cancelled and the segment tasks aborted.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use reqwest::Client;
use tokio::task::AbortHandle;
use tracing::{error, info, warn};

use super::config::DownloadConfig;
use super::error::{DownloadError, DownloadResult};
use super::fetcher::SegmentFetcher;
use super::output::OutputFile;
use super::plan::DownloadPlan;
use super::probe::probe_size;
use super::progress::{ProgressCallback, ProgressCounter, ProgressReporter};

/// Outcome of a successful download.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSummary {
    /// Where the resource was written.
    pub path: PathBuf,
    /// Resource size in bytes.
    pub total_bytes: u64,
    /// Effective segment count (after clamping).
    pub segments: usize,
    /// Wall-clock time from probe to completion.
    pub elapsed: Duration,
}

impl DownloadSummary {
    /// Average bytes per second over the whole download.
    pub fn average_throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_bytes as f64 / secs
        } else {
            0.0
        }
    }
}

/// Segmented HTTP downloader.
///
/// Holds the HTTP client, the byte counter and an optional progress
/// callback. The counter is reset at the start of every download, so one
/// `Downloader` should run one download at a time.
pub struct Downloader {
    config: DownloadConfig,
    client: Client,
    counter: ProgressCounter,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("config", &self.config)
            .field("counter", &self.counter)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Downloader {
    /// Create a downloader without progress reporting.
    pub fn new(config: DownloadConfig) -> DownloadResult<Self> {
        let client = config.build_client()?;
        Ok(Self {
            config,
            client,
            counter: ProgressCounter::new(),
            progress: None,
        })
    }

    /// Report progress to `callback` while downloads run.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Byte counter for the current (or last) download.
    pub fn counter(&self) -> &ProgressCounter {
        &self.counter
    }

    /// Download `url` into `dest` using up to `segments` concurrent ranges.
    ///
    /// # Errors
    ///
    /// Probe and planning failures are returned before `dest` is created.
    /// If any segment fails, all segments are still awaited, every failure
    /// is logged, and the error of the lowest-indexed failed segment is
    /// returned. The partially written file stays on disk.
    pub async fn download(
        &self,
        url: &str,
        dest: impl AsRef<Path>,
        segments: usize,
    ) -> DownloadResult<DownloadSummary> {
        let dest = dest.as_ref();
        let started = Instant::now();

        let resource = probe_size(&self.client, url, self.config.request_timeout).await?;
        let plan = DownloadPlan::new(resource.size, segments)?;

        if plan.segment_count() < segments {
            warn!(
                requested = segments,
                effective = plan.segment_count(),
                "Fewer bytes than segments, segment count clamped"
            );
        }
        info!(
            url,
            dest = %dest.display(),
            total_bytes = plan.total_bytes(),
            segments = plan.segment_count(),
            "Starting download"
        );

        let output = OutputFile::create(dest, plan.total_bytes()).await?;
        self.counter.reset();

        let reporter = self.progress.clone().map(|callback| {
            ProgressReporter::start(
                self.counter.clone(),
                plan.total_bytes(),
                self.config.poll_interval,
                callback,
            )
        });

        let fetcher = SegmentFetcher::new(
            self.client.clone(),
            output.clone(),
            self.counter.clone(),
            &self.config,
        );

        let tasks = plan.tasks(url);
        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let fetcher = fetcher.clone();
                tokio::spawn(async move { fetcher.fetch(&task).await })
            })
            .collect();
        let _abort = AbortOnDrop(handles.iter().map(|h| h.abort_handle()).collect());

        // Results come back in segment order.
        let mut first_failure = None;
        for (index, joined) in join_all(handles).await.into_iter().enumerate() {
            let result = joined.unwrap_or_else(|e| {
                Err(DownloadError::TaskFailed {
                    segment: index,
                    reason: e.to_string(),
                })
            });

            if let Err(e) = result {
                error!(segment = index, error = %e, "Segment failed");
                first_failure.get_or_insert(e);
            }
        }

        if let Some(reporter) = reporter {
            reporter.stop().await;
        }

        if let Some(e) = first_failure {
            if let Err(flush_err) = output.flush().await {
                warn!(error = %flush_err, "Failed to flush partial download");
            }
            error!(url, dest = %dest.display(), "Download failed, partial file left in place");
            return Err(e);
        }

        output.flush().await?;

        let summary = DownloadSummary {
            path: dest.to_path_buf(),
            total_bytes: plan.total_bytes(),
            segments: plan.segment_count(),
            elapsed: started.elapsed(),
        };
        info!(
            dest = %dest.display(),
            total_bytes = summary.total_bytes,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Download complete"
        );
        Ok(summary)
    }
}

/// Aborts the segment tasks if `download` is dropped before they finish.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}
