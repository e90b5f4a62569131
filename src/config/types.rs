//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default size of each chunk written to the process's stdin.
pub const DEFAULT_STDIN_CHUNK_SIZE: usize = 8192;

/// How classified failures are surfaced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Return the error from `execute`.
    #[default]
    Raise,
    /// Emit the error as an `error` event instead of returning it.
    Emit,
}

/// Configuration for an `ffmpeg` wrapper instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FfmpegConfig {
    /// Executable name or path.
    pub executable: PathBuf,
    /// Raise or emit classified failures.
    pub error_mode: ErrorMode,
    /// Bytes read from the input per stdin write.
    pub stdin_chunk_size: usize,
}

impl FfmpegConfig {
    /// Use a different executable.
    #[must_use]
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Set the error mode.
    #[must_use]
    pub fn with_error_mode(mut self, error_mode: ErrorMode) -> Self {
        self.error_mode = error_mode;
        self
    }

    /// Set the stdin chunk size. Zero is treated as one byte.
    #[must_use]
    pub fn with_stdin_chunk_size(mut self, size: usize) -> Self {
        self.stdin_chunk_size = size.max(1);
        self
    }
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("ffmpeg"),
            error_mode: ErrorMode::default(),
            stdin_chunk_size: DEFAULT_STDIN_CHUNK_SIZE,
        }
    }
}
