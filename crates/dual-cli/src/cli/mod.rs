//! Command-line interface definition.
//!
//! - `dual targets` - show the resolved browser matrix and the modern-pass decision
//! - `dual cache-key` - print the transform cache identifier for a compilation axis
//! - `dual build` - run the primary build, plus the modern pass when enabled

mod commands;
pub mod enums;
mod tests;

use clap::Parser;

pub use commands::{BuildArgs, CacheKeyArgs, Command, TargetsArgs};
pub use enums::*;

/// Dual - differential legacy/modern bundling
#[derive(Parser, Debug)]
#[command(
    name = "dual",
    version,
    about = "Differential legacy/modern bundling",
    long_about = "Dual builds a broadly compatible bundle and, when the declared browser\n\
                  targets mix legacy and modern engines, a second modern-only bundle whose\n\
                  files are merged into the first build's output."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    ///
    /// Shows the modern pass state transitions, chunk layout and merge reports.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
