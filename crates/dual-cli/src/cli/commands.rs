use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::enums::*;

/// Available dual subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the browser matrix and whether a modern pass would run
    ///
    /// Reads the transform configuration that applies to `<cwd>/pages`,
    /// normalizes its declared targets and compares them with the modern
    /// engine baseline.
    Targets(TargetsArgs),

    /// Print the transform cache identifier for a compilation axis
    ///
    /// The identifier changes whenever the flags or the project's transform
    /// configuration change.
    CacheKey(CacheKeyArgs),

    /// Build the project
    ///
    /// Produces the legacy bundle and, when enabled, the modern bundle, then
    /// writes the merged output.
    Build(BuildArgs),
}

impl Command {
    /// Project directory the command works in.
    pub fn cwd(&self) -> PathBuf {
        match self {
            Command::Targets(args) => args.cwd.clone(),
            Command::CacheKey(args) => args.cwd.clone(),
            Command::Build(args) => args.cwd.clone(),
        }
    }
}

/// Arguments for the targets command
#[derive(Args, Debug)]
pub struct TargetsArgs {
    /// Project directory
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub cwd: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the cache-key command
#[derive(Args, Debug)]
pub struct CacheKeyArgs {
    /// Project directory
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub cwd: PathBuf,

    /// Server-side compilation
    #[arg(long)]
    pub server: bool,

    /// The modern variant itself
    #[arg(long)]
    pub modern: bool,

    /// A modern variant is built alongside the legacy one
    #[arg(long)]
    pub has_modern: bool,
}

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Project directory
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub cwd: PathBuf,

    /// Override `differential.enabled` from dual.toml
    #[arg(long, value_enum, value_name = "MODE")]
    pub differential: Option<Differential>,

    /// Minify output regardless of dual.toml
    #[arg(long)]
    pub minify: bool,

    /// Output directory, overriding `build.out_dir`
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}
