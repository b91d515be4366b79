//! Tooling & Integration Layer
//!
//! Command-line entry points and their text rendering.

pub mod cli;
pub mod format;
pub mod status;

pub use cli::{Cli, CliContext, Commands};
