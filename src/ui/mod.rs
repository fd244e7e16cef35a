//! User interface
//!
//! Command-line parsing for the `urlchecker` binary.

pub mod cli;

// Re-export commonly used items
pub use cli::{Cli, parse_args};
