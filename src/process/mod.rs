//! Process orchestration.

mod ffmpeg;
mod input;
mod signal;
mod state;

pub use ffmpeg::*;
pub use input::*;
pub use state::ExecutionState;
