//! Error taxonomy for `ffmpeg` runs.

use serde::{Deserialize, Serialize};

use crate::options::render_command;

/// Closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The instance was already executed once.
    AlreadyExecuted,
    /// The output file exists and overwriting was not allowed.
    FileExists,
    /// An input file could not be found or opened.
    FileNotFound,
    /// Invalid options or arguments were passed.
    InvalidCommand,
    /// An encoder or decoder is not available.
    UnsupportedCodec,
    /// The process did not exit within the timeout.
    Timeout,
    /// Termination was requested without a running process.
    NotRunning,
    /// Any other non-zero exit.
    Generic,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::AlreadyExecuted => "already executed",
            Self::FileExists => "file exists",
            Self::FileNotFound => "file not found",
            Self::InvalidCommand => "invalid command",
            Self::UnsupportedCodec => "unsupported codec",
            Self::Timeout => "timeout",
            Self::NotRunning => "not running",
            Self::Generic => "error",
        };
        f.write_str(name)
    }
}

/// A categorized `ffmpeg` failure with the command that produced it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{}\nCommand: {}", .message, render_command(.arguments))]
pub struct FfmpegError {
    kind: ErrorKind,
    message: String,
    arguments: Vec<String>,
}

impl FfmpegError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            arguments,
        }
    }

    #[must_use]
    pub fn already_executed(arguments: Vec<String>) -> Self {
        Self::new(ErrorKind::AlreadyExecuted, "FFmpeg is already executed", arguments)
    }

    #[must_use]
    pub fn not_running(arguments: Vec<String>) -> Self {
        Self::new(ErrorKind::NotRunning, "FFmpeg is not running", arguments)
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The diagnostic text, usually the captured stderr.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The full argument vector, executable first.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }
}
