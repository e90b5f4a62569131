//! Colored terminal output for the `ffwrap` runner.
//!
//! Everything here goes to stderr; stdout carries the bytes `ffmpeg` wrote.

use std::io::{self, Write};

use chrono::{TimeDelta, Utc};
use owo_colors::OwoColorize;

use crate::error::FfmpegError;
use crate::progress::Statistics;

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Maximum length for truncated display strings.
const DEFAULT_MAX_LEN: usize = 120;

/// Truncate a string to a maximum length in characters, adding an ellipsis.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

/// Format a duration as `[-]HH:MM:SS.mmm`.
#[must_use]
pub fn format_time(time: TimeDelta) -> String {
    let millis = time.num_milliseconds();
    let sign = if millis < 0 { "-" } else { "" };
    let millis = millis.unsigned_abs();
    format!(
        "{sign}{:02}:{:02}:{:02}.{:03}",
        millis / 3_600_000,
        (millis / 60_000) % 60,
        (millis / 1000) % 60,
        millis % 1000
    )
}

/// Format a byte count using binary units.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes}B")
    } else {
        format!("{value:.1}{}", UNITS[unit])
    }
}

/// Print the command about to run.
pub fn print_start(command: &str) {
    eprintln!(
        "{} {} {}",
        timestamp().dimmed(),
        "[START]".blue().bold(),
        truncate(command, DEFAULT_MAX_LEN).cyan()
    );
    let _ = io::stderr().flush();
}

/// Print one progress snapshot.
pub fn print_progress(statistics: &Statistics) {
    eprintln!(
        "{} {} frame={} fps={:.1} size={} time={} bitrate={:.1}kbits/s speed={:.2}x",
        timestamp().dimmed(),
        "[PROGRESS]".green(),
        statistics.frame,
        statistics.fps,
        format_size(statistics.size),
        format_time(statistics.time),
        statistics.bitrate,
        statistics.speed
    );
    let _ = io::stderr().flush();
}

/// Print one progress snapshot as a JSON line.
pub fn print_progress_json(statistics: &Statistics) {
    match serde_json::to_string(statistics) {
        Ok(json) => eprintln!("{json}"),
        Err(e) => tracing::warn!(error = %e, "Failed to serialize progress"),
    }
    let _ = io::stderr().flush();
}

/// Print successful completion.
pub fn print_completed(output_len: usize) {
    eprintln!(
        "{} {} Completed ({} on stdout)",
        timestamp().dimmed(),
        "[DONE]".green().bold(),
        format_size(output_len as u64)
    );
    let _ = io::stderr().flush();
}

/// Print that the run stopped after a termination request.
pub fn print_terminated() {
    eprintln!(
        "{} {} Terminated",
        timestamp().dimmed(),
        "[DONE]".yellow().bold()
    );
    let _ = io::stderr().flush();
}

/// Print a classified failure.
pub fn print_error(error: &FfmpegError) {
    let last_line = error.message().lines().last().unwrap_or_default();
    eprintln!(
        "{} {} {} {}",
        timestamp().dimmed(),
        "[ERROR]".red().bold(),
        error.kind().to_string().red(),
        truncate(last_line, DEFAULT_MAX_LEN).red()
    );
    let _ = io::stderr().flush();
}
