//! Segfetch - segmented HTTP downloads
//!
//! This library downloads a single remote resource over several concurrent
//! HTTP range requests, writing each range straight into its offset of one
//! pre-sized output file while a background task reports progress.
//!
//! The engine lives in [`download`]. [`settings`], [`filter`] and
//! [`logging`] support front ends such as the `segfetch` command line tool.

pub mod download;
pub mod filter;
pub mod logging;
pub mod settings;

pub use download::{DownloadConfig, DownloadError, DownloadSummary, Downloader};
