//! Event types and the listener registry.

mod notifier;
mod types;

pub use notifier::*;
pub use types::*;
