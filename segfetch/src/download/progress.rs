//! Progress reporting for segmented downloads.
//!
//! Segment fetchers add to a shared atomic [`ProgressCounter`]. A background
//! [`ProgressReporter`] task polls the counter on a fixed interval, derives
//! percentage, throughput and ETA, and hands a [`ProgressSnapshot`] to a
//! callback. The reporter is stopped through a cancellation token and always
//! renders one final snapshot before its task ends.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default poll interval for the reporter.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Shortest poll interval; shorter values are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Progress callback invoked on every reporter tick and once on stop.
pub type ProgressCallback = Arc<dyn Fn(&ProgressSnapshot) + Send + Sync>;

/// Cumulative bytes written across all segments.
///
/// Only atomic add/read; no lock.
#[derive(Debug, Clone, Default)]
pub struct ProgressCounter {
    bytes: Arc<AtomicU64>,
}

impl ProgressCounter {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to zero at the start of a download.
    pub fn reset(&self) {
        self.bytes.store(0, Ordering::SeqCst);
    }

    /// Record `bytes` more bytes written. Returns the new total.
    pub fn add(&self, bytes: u64) -> u64 {
        self.bytes.fetch_add(bytes, Ordering::SeqCst) + bytes
    }

    /// Current cumulative byte count.
    pub fn get(&self) -> u64 {
        self.bytes.load(Ordering::SeqCst)
    }
}

/// Point-in-time view of a download's progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Bytes written so far.
    pub downloaded: u64,
    /// Total bytes expected.
    pub total: u64,
    /// Wall-clock time since the reporter started.
    pub elapsed: Duration,
    /// True for the final snapshot emitted on stop.
    pub finished: bool,
}

impl ProgressSnapshot {
    /// Completion percentage (0 when the total is 0).
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.downloaded as f64 / self.total as f64 * 100.0
        }
    }

    /// Average throughput in bytes per second since the start.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.downloaded as f64 / secs
        } else {
            0.0
        }
    }

    /// Estimated time remaining at the current average throughput.
    pub fn eta(&self) -> Duration {
        let throughput = self.throughput();
        if throughput > 0.0 {
            let remaining = self.total.saturating_sub(self.downloaded);
            Duration::from_secs_f64(remaining as f64 / throughput)
        } else {
            Duration::ZERO
        }
    }
}

/// Background task reporting progress on a fixed interval.
///
/// Dropping the reporter without calling [`stop`](Self::stop) cancels it too;
/// the task still emits its final snapshot but is not awaited.
pub struct ProgressReporter {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl ProgressReporter {
    /// Start a reporter.
    ///
    /// # Arguments
    ///
    /// * `counter` - Shared byte counter to poll
    /// * `total` - Total expected bytes
    /// * `interval` - How often to poll (at least [`MIN_POLL_INTERVAL`])
    /// * `callback` - Receives every snapshot
    pub fn start(
        counter: ProgressCounter,
        total: u64,
        interval: Duration,
        callback: ProgressCallback,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let started = Instant::now();
        let interval = interval.max(MIN_POLL_INTERVAL);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;

                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        callback(&ProgressSnapshot {
                            downloaded: counter.get(),
                            total,
                            elapsed: started.elapsed(),
                            finished: false,
                        });
                    }
                }
            }

            callback(&ProgressSnapshot {
                downloaded: counter.get(),
                total,
                elapsed: started.elapsed(),
                finished: true,
            });
            debug!("Progress reporter stopped");
        });

        Self { handle, cancel }
    }

    /// Signal the reporter to stop and wait for its final render.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.handle).await {
            debug!(error = %e, "Progress reporter task ended abnormally");
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
