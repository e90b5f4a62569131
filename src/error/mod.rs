//! Error taxonomy and diagnostic classification.

mod classifier;
mod types;

pub use classifier::*;
pub use types::*;
