//! Lifecycle events emitted during an `ffmpeg` run.

use serde::{Deserialize, Serialize};

use crate::error::FfmpegError;
use crate::progress::Statistics;

/// Event names, used as subscription keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Start,
    Stderr,
    Progress,
    Completed,
    Terminated,
    Error,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Stderr => "stderr",
            Self::Progress => "progress",
            Self::Completed => "completed",
            Self::Terminated => "terminated",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// An event together with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The process is about to be spawned with these arguments.
    Start(Vec<String>),
    /// One decoded line of diagnostic output.
    Stderr(String),
    /// A progress snapshot parsed from a diagnostic line.
    Progress(Statistics),
    /// The process exited successfully.
    Completed,
    /// The process exited after a termination request.
    Terminated,
    /// A classified failure, only emitted in emit error mode.
    Error(FfmpegError),
}

impl Event {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Start(_) => EventKind::Start,
            Self::Stderr(_) => EventKind::Stderr,
            Self::Progress(_) => EventKind::Progress,
            Self::Completed => EventKind::Completed,
            Self::Terminated => EventKind::Terminated,
            Self::Error(_) => EventKind::Error,
        }
    }

    /// Returns the progress snapshot if this is a `Progress` event.
    #[must_use]
    pub fn statistics(&self) -> Option<&Statistics> {
        match self {
            Self::Progress(statistics) => Some(statistics),
            _ => None,
        }
    }

    /// Returns the line if this is a `Stderr` event.
    #[must_use]
    pub fn line(&self) -> Option<&str> {
        match self {
            Self::Stderr(line) => Some(line),
            _ => None,
        }
    }
}
