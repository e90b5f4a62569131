//! Option model and command-line builder.

mod command;
mod file;
mod option;

pub use command::*;
pub use file::*;
pub use option::*;
