//! ffwrap - async wrapper around the `ffmpeg` command-line tool.

pub mod config;
pub mod display;
pub mod error;
pub mod events;
pub mod options;
pub mod process;
pub mod progress;

pub use error::{ErrorKind, FfmpegError};
pub use events::{Event, EventKind};
pub use process::{ExecuteError, ExecuteOptions, Ffmpeg};
pub use progress::Statistics;
