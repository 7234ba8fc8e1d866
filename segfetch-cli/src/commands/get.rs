//! Get command - download a URL in segments.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use console::style;
use segfetch::download::{
    format_bytes, ConsoleProgress, DownloadConfig, DownloadError, Downloader, DEFAULT_RETRY_DELAY,
};
use segfetch::filter::file_name_from_url;
use segfetch::settings::Settings;
use tracing::info;

use crate::error::CliError;

/// Arguments for `segfetch get`.
#[derive(Debug, Args)]
pub struct GetArgs {
    /// URL to download (absolute http or https)
    pub url: String,

    /// Output file (defaults to the URL's file name in the download directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of concurrent segments (overrides download.segments)
    #[arg(short, long)]
    pub segments: Option<usize>,

    /// Download directory (overrides download.directory)
    #[arg(short = 'd', long = "dir")]
    pub directory: Option<PathBuf>,

    /// Extra attempts for each failed segment
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Seconds to wait between segment retries
    #[arg(long, value_name = "SECS")]
    pub retry_delay: Option<u64>,

    /// Fail a segment after this many seconds without data
    #[arg(long, value_name = "SECS")]
    pub idle_timeout: Option<u64>,

    /// Skip the extension allow-list
    #[arg(long)]
    pub no_filter: bool,

    /// Suppress the progress line and summary
    #[arg(short, long)]
    pub quiet: bool,
}

/// Run the get command.
pub async fn run(args: GetArgs) -> Result<(), CliError> {
    let settings = Settings::load()?;

    if !args.no_filter {
        settings.extension_filter().check(&args.url)?;
    }

    let segments = resolve_segments(&args, &settings)?;
    let dest = resolve_destination(&args, &settings);
    ensure_parent_dir(&dest)?;

    let retry_delay = args
        .retry_delay
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_DELAY);
    let mut config = DownloadConfig::default().with_retries(args.retries, retry_delay);
    if let Some(secs) = args.idle_timeout {
        config = config.with_read_timeout(Duration::from_secs(secs.max(1)));
    }

    let mut downloader = Downloader::new(config)?;
    if !args.quiet {
        downloader = downloader.with_progress(ConsoleProgress.into_callback());
    }

    info!(url = %args.url, dest = %dest.display(), segments, "Download requested");
    let summary = downloader.download(&args.url, &dest, segments).await?;

    if !args.quiet {
        println!(
            "{} {} ({} in {:.1}s, {}/s, {} segments)",
            style("Downloaded").green().bold(),
            summary.path.display(),
            format_bytes(summary.total_bytes),
            summary.elapsed.as_secs_f64(),
            format_bytes(summary.average_throughput() as u64),
            summary.segments,
        );
    }

    Ok(())
}

/// Segment count: CLI flag, else settings. Zero is rejected.
fn resolve_segments(args: &GetArgs, settings: &Settings) -> Result<usize, CliError> {
    match args.segments.unwrap_or(settings.segments) {
        0 => Err(CliError::Config(
            "segment count must be at least 1".to_string(),
        )),
        n => Ok(n),
    }
}

/// Destination path: explicit output, else `<dir>/<file name from URL>`.
fn resolve_destination(args: &GetArgs, settings: &Settings) -> PathBuf {
    if let Some(output) = &args.output {
        return output.clone();
    }

    let dir = args
        .directory
        .clone()
        .unwrap_or_else(|| settings.download_dir.clone());
    dir.join(file_name_from_url(&args.url))
}

fn ensure_parent_dir(dest: &std::path::Path) -> Result<(), CliError> {
    match dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) if !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|e| {
                CliError::Download(DownloadError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(url: &str) -> GetArgs {
        GetArgs {
            url: url.to_string(),
            output: None,
            segments: None,
            directory: None,
            retries: 0,
            retry_delay: None,
            idle_timeout: None,
            no_filter: false,
            quiet: true,
        }
    }

    fn settings() -> Settings {
        Settings {
            segments: 6,
            download_dir: PathBuf::from("/downloads"),
            allowed_extensions: vec!["iso".to_string()],
        }
    }

    #[test]
    fn test_segments_from_settings_unless_overridden() {
        let mut a = args("https://example.com/a.iso");
        assert_eq!(resolve_segments(&a, &settings()).unwrap(), 6);

        a.segments = Some(2);
        assert_eq!(resolve_segments(&a, &settings()).unwrap(), 2);

        a.segments = Some(0);
        assert!(matches!(
            resolve_segments(&a, &settings()),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_destination_resolution() {
        let mut a = args("https://example.com/pub/debian.iso");
        assert_eq!(
            resolve_destination(&a, &settings()),
            PathBuf::from("/downloads/debian.iso")
        );

        a.directory = Some(PathBuf::from("/tmp/x"));
        assert_eq!(
            resolve_destination(&a, &settings()),
            PathBuf::from("/tmp/x/debian.iso")
        );

        a.output = Some(PathBuf::from("out.iso"));
        assert_eq!(resolve_destination(&a, &settings()), PathBuf::from("out.iso"));
    }

    #[test]
    fn test_destination_without_file_name() {
        let a = args("https://example.com/");
        assert_eq!(
            resolve_destination(&a, &settings()),
            PathBuf::from("/downloads/download.bin")
        );
    }

    #[test]
    fn test_ensure_parent_dir_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("a").join("b").join("file.iso");

        ensure_parent_dir(&dest).unwrap();
        assert!(dir.path().join("a").join("b").is_dir());

        ensure_parent_dir(std::path::Path::new("relative.iso")).unwrap();
    }
}
