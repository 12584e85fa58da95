//! Acceptor CLI library
//!
//! Command-line runner for storefront and booking API feature files.

pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod output;

pub use commands::{Cli, Commands};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, ProgressReporter};
