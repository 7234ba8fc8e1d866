//! Single-line textual progress display.

use std::io::{self, Write};
use std::time::Duration;

use super::progress::{ProgressCallback, ProgressSnapshot};

/// Width of the progress bar in cells.
pub const BAR_WIDTH: usize = 30;

/// Format a byte count with binary units (e.g. `1.50 MiB`).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}

/// Format a duration as `HH:MM:SS`.
pub fn format_hms(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Render the status line for a snapshot (without carriage return).
///
/// ```text
/// [#############-----------------]  45.0% 4.39 KiB/9.77 KiB 1.10 KiB/s ETA 00:00:04
/// ```
pub fn render_status_line(snapshot: &ProgressSnapshot) -> String {
    let percent = snapshot.percent().clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled));

    format!(
        "[{}] {:>5.1}% {}/{} {}/s ETA {}",
        bar,
        percent,
        format_bytes(snapshot.downloaded),
        format_bytes(snapshot.total),
        format_bytes(snapshot.throughput() as u64),
        format_hms(snapshot.eta()),
    )
}

/// Renders snapshots to standard output, overwriting the previous line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ConsoleProgress {
    /// Render one snapshot.
    pub fn render(&self, snapshot: &ProgressSnapshot) {
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "\r{}", render_status_line(snapshot));
        if snapshot.finished {
            let _ = writeln!(stdout);
        }
        let _ = stdout.flush();
    }

    /// Wrap this renderer as a reporter callback.
    pub fn into_callback(self) -> ProgressCallback {
        std::sync::Arc::new(move |snapshot: &ProgressSnapshot| self.render(snapshot))
    }
}
