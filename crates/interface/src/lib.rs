//! BOPS Interface - command line surface
//!
//! Responsibilities:
//! - replay captured agent event streams through the transcript assembler
//! - print the transcript as text, JSON or counters
//! - show the effective assembler configuration

pub mod cli;


pub use cli::{CliConfig, CliError, OutputFormat, run_cli};
