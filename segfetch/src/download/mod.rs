//! Segmented HTTP download engine.
//!
//! This module downloads one remote resource over several concurrent ranged
//! requests, including:
//! - Size discovery via HEAD (`probe`)
//! - Partitioning of the byte range into segments (`plan`)
//! - A pre-sized output file with a single write lock (`output`)
//! - Per-segment ranged fetch with optional retry (`fetcher`)
//! - A shared byte counter and background reporter (`progress`)
//! - Status line rendering (`render`)
//! - Orchestration of all of the above (`coordinator`)
//!
//! # Architecture
//!
//! ```text
//! Downloader (coordinator)
//!         │
//!         ├── probe_size ──► ResourceInfo { size }
//!         │
//!         ├── DownloadPlan ──► [SegmentTask; N]
//!         │
//!         ├── OutputFile (pre-sized, Mutex<File>)
//!         │       ▲
//!         │       │ write_at(offset, chunk)
//!         │       │
//!         ├── SegmentFetcher × N ──► ProgressCounter (AtomicU64)
//!         │                                 │
//!         └── ProgressReporter ◄────────────┘ polls every 500 ms
//! ```
//!
//! # Example
//!
//! ```ignore
//! use segfetch::download::{ConsoleProgress, DownloadConfig, Downloader};
//!
//! let downloader = Downloader::new(DownloadConfig::default())?
//!     .with_progress(ConsoleProgress.into_callback());
//!
//! let summary = downloader
//!     .download("https://example.com/file.iso", "/tmp/file.iso", 4)
//!     .await?;
//! println!("{} bytes in {:?}", summary.total_bytes, summary.elapsed);
//! ```

mod config;
mod coordinator;
mod error;
mod fetcher;
mod output;
mod plan;
mod probe;
mod progress;
mod render;

pub use config::{
    DownloadConfig, DEFAULT_CHUNK_SIZE, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY, DEFAULT_USER_AGENT,
};
pub use coordinator::{DownloadSummary, Downloader};
pub use error::{DownloadError, DownloadResult, ErrorKind};
pub use fetcher::SegmentFetcher;
pub use output::OutputFile;
pub use plan::{ByteRange, DownloadPlan, SegmentTask};
pub use probe::{probe_size, validate_url, ResourceInfo};
pub use progress::{
    ProgressCallback, ProgressCounter, ProgressReporter, ProgressSnapshot, DEFAULT_POLL_INTERVAL,
};
pub use render::{format_bytes, format_hms, render_status_line, ConsoleProgress, BAR_WIDTH};
