//! Progress parsing for `ffmpeg` diagnostic output.

mod lines;
mod statistics;

pub use lines::*;
pub use statistics::*;
