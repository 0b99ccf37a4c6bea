//! Command-line interface module.

mod args;
pub mod edit;
pub mod query;
pub mod watch;

pub use args::{Cli, Commands};
