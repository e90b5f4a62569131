//! Progress statistics parsed from `ffmpeg` status lines.
//!
//! A status line looks like
//! `frame=  109 fps=0.0 q=-1.0 size=     793kB time=00:00:04.02 bitrate=1613.7kbits/s speed=7.73x`.
//! Audio-only runs omit `frame` and `fps`, so only a subset of the keys is
//! required for a line to count as progress.

use std::sync::LazyLock;

use chrono::TimeDelta;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Minimum number of distinct recognized keys for a progress line.
pub const MIN_PROGRESS_KEYS: usize = 4;

const NOT_AVAILABLE: &str = "N/A";

static FIELD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(frame|fps|size|time|bitrate|speed)\s*=\s*(\S+)").expect("valid field pattern")
});

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-)?(\d+):(\d{2}):(\d{2})\.(\d{2})$").expect("valid time pattern")
});

/// Error type for statistics parsing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StatisticsError {
    /// A numeric field could not be parsed.
    #[error("Invalid {field} value: {value}")]
    InvalidNumber {
        /// Name of the field.
        field: &'static str,
        /// Raw text of the value.
        value: String,
    },
    /// The size field carried an unknown unit.
    #[error("Unknown size format: {0}")]
    UnknownSizeUnit(String),
    /// The time field was not `[-]H:MM:SS.CC`.
    #[error("Invalid time format: {0}")]
    InvalidTime(String),
}

/// One progress snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of processed frames.
    pub frame: u64,
    /// Processing rate in frames per second.
    pub fps: f64,
    /// Current output size in bytes.
    pub size: u64,
    /// Current media timestamp.
    #[serde(with = "millis")]
    pub time: TimeDelta,
    /// Output bitrate in kilobits per second.
    pub bitrate: f64,
    /// Processing speed as a multiple of real time.
    pub speed: f64,
}

impl Statistics {
    /// Parse a status line, returning `None` for anything that is not progress
    /// or that fails to convert.
    #[must_use]
    pub fn from_line(line: &str) -> Option<Self> {
        match Self::parse_line(line) {
            Ok(statistics) => statistics,
            Err(e) => {
                tracing::debug!(error = %e, line, "Ignoring malformed progress line");
                None
            }
        }
    }

    /// Parse a status line.
    ///
    /// Returns `Ok(None)` when the line has fewer than [`MIN_PROGRESS_KEYS`]
    /// recognized keys. `N/A` values leave the field at its default.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsError` if a recognized value cannot be converted.
    pub fn parse_line(line: &str) -> Result<Option<Self>, StatisticsError> {
        let fields: Vec<(&str, &str)> = FIELD_PATTERN
            .captures_iter(line)
            .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
            .collect();

        let mut keys: Vec<&str> = fields.iter().map(|(key, _)| *key).collect();
        keys.sort_unstable();
        keys.dedup();
        if keys.len() < MIN_PROGRESS_KEYS {
            return Ok(None);
        }

        let mut statistics = Self::default();
        for (key, value) in fields {
            if value == NOT_AVAILABLE {
                continue;
            }
            match key {
                "frame" => statistics.frame = parse_number("frame", value)?,
                "fps" => statistics.fps = parse_number("fps", value)?,
                "size" => statistics.size = parse_size(value)?,
                "time" => statistics.time = parse_time(value)?,
                "bitrate" => {
                    statistics.bitrate =
                        parse_number("bitrate", value.trim_end_matches("kbits/s"))?;
                }
                "speed" => statistics.speed = parse_number("speed", value.trim_end_matches('x'))?,
                _ => {}
            }
        }

        Ok(Some(statistics))
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, StatisticsError> {
    value.parse().map_err(|_| StatisticsError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Convert a size such as `793kB` or `793KiB` into bytes.
///
/// # Errors
///
/// Returns `StatisticsError::UnknownSizeUnit` for any other unit.
pub fn parse_size(value: &str) -> Result<u64, StatisticsError> {
    let number = value
        .strip_suffix("KiB")
        .or_else(|| value.strip_suffix("kB"))
        .ok_or_else(|| StatisticsError::UnknownSizeUnit(value.to_string()))?;

    let kilobytes: u64 = parse_number("size", number.trim())?;
    Ok(kilobytes.saturating_mul(1024))
}

/// Convert `[-]H:MM:SS.CC` into a duration with millisecond precision.
///
/// # Errors
///
/// Returns `StatisticsError::InvalidTime` if the text does not match.
pub fn parse_time(value: &str) -> Result<TimeDelta, StatisticsError> {
    let invalid = || StatisticsError::InvalidTime(value.to_string());
    let caps = TIME_PATTERN.captures(value).ok_or_else(invalid)?;

    let part = |index: usize| -> Result<i64, StatisticsError> {
        caps.get(index)
            .and_then(|m| m.as_str().parse().ok())
            .ok_or_else(invalid)
    };

    let millis = part(2)?
        .saturating_mul(3_600_000)
        .saturating_add(part(3)?.saturating_mul(60_000))
        .saturating_add(part(4)?.saturating_mul(1_000))
        .saturating_add(part(5)?.saturating_mul(10));

    let signed = if caps.get(1).is_some() { -millis } else { millis };
    TimeDelta::try_milliseconds(signed).ok_or_else(invalid)
}

mod millis {
    use chrono::TimeDelta;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let ms = i64::deserialize(deserializer)?;
        TimeDelta::try_milliseconds(ms).ok_or_else(|| D::Error::custom("time out of range"))
    }
}
