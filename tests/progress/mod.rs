//! Progress line parsing.

use chrono::TimeDelta;
use ffwrap::progress::{LineSplitter, Statistics};

#[test]
fn parses_full_progress_line() {
    let stats = Statistics::from_line(
        "frame=0 fps=0.0 size=0kB time=00:00:00.33 bitrate=1.1kbits/s speed=22.8x",
    )
    .unwrap();

    assert_eq!(stats.frame, 0);
    assert!(stats.fps.abs() < f64::EPSILON);
    assert_eq!(stats.size, 0);
    assert_eq!(stats.time, TimeDelta::milliseconds(330));
    assert!((stats.bitrate - 1.1).abs() < 1e-9);
    assert!((stats.speed - 22.8).abs() < 1e-9);
}

#[test]
fn padded_progress_line_is_accepted() {
    let stats = Statistics::from_line(
        "frame=  120 fps= 30 q=28.0 size=     256KiB time=00:00:04.00 bitrate= 524.3kbits/s speed=1.01x",
    )
    .unwrap();

    assert_eq!(stats.frame, 120);
    assert_eq!(stats.size, 256 * 1024);
    assert_eq!(stats.time, TimeDelta::seconds(4));
}

#[test]
fn not_available_fields_keep_defaults() {
    let stats = Statistics::from_line(
        "frame=10 fps=5.0 size=1kB time=00:00:01.00 bitrate=N/A speed=N/A",
    )
    .unwrap();

    assert_eq!(stats.frame, 10);
    assert_eq!(stats.size, 1024);
    assert!(stats.bitrate.abs() < f64::EPSILON);
    assert!(stats.speed.abs() < f64::EPSILON);
}

#[test]
fn banner_lines_are_not_progress() {
    assert!(Statistics::from_line("  configuration: --enable-gpl --enable-libx264").is_none());
    assert!(Statistics::from_line("    encoder         : Lavf60.16.100").is_none());
    assert!(Statistics::from_line("frame=1 fps=2 size=3kB").is_none());
}

#[test]
fn unknown_size_unit_is_rejected() {
    assert!(Statistics::parse_line("frame=1 fps=1 size=1MB time=00:00:01.00").is_err());
    assert!(Statistics::from_line("frame=1 fps=1 size=1MB time=00:00:01.00").is_none());
}

#[test]
fn splitter_feeds_parser_across_chunks() {
    let mut splitter = LineSplitter::new();
    let mut lines = splitter.push(b"frame=1 fps=1 size=1kB ti");
    assert!(lines.is_empty());

    lines.extend(splitter.push(b"me=00:00:00.04 bitrate=1.0kbits/s speed=1x\rframe=2"));
    lines.extend(splitter.finish());

    let parsed: Vec<Option<Statistics>> = lines
        .iter()
        .map(|line| Statistics::from_line(&String::from_utf8_lossy(line)))
        .collect();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].map(|s| s.frame), Some(1));
    assert!(parsed[1].is_none());
}
