//! Dual CLI - differential legacy/modern builds.
//!
//! Parses arguments, sets up logging and dispatches to the command.

use clap::Parser;
use dual_cli::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // Project settings can lower verbosity or disable colors; flags win.
    let settings = dual_config::DualConfig::load(&args.command.cwd())
        .map(|config| config.settings)
        .unwrap_or_default();
    let no_color = args.no_color || settings.no_color;
    logger::init_logger(
        args.verbose,
        args.quiet,
        no_color,
        settings.log_level.as_deref(),
    );
    ui::init_colors(no_color);

    let result = match args.command {
        cli::Command::Targets(targets_args) => commands::targets_execute(targets_args),
        cli::Command::CacheKey(cache_key_args) => commands::cache_key_execute(cache_key_args),
        cli::Command::Build(build_args) => commands::build_execute(build_args, args.quiet).await,
    };

    result.map_err(error::cli_error_to_miette)
}
