//! Miette report conversion for CLI errors.

use crate::error::CliError;
use miette::Report;

/// Convert a [`CliError`] into a report for the terminal.
///
/// Bundler errors carry their own diagnostic codes and help text, so they
/// are reported as-is.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => Report::new(e),
        CliError::Config(e) => miette::miette!(
            help = "Check dual.toml, babel.config.json and .babelrc for syntax errors",
            "Configuration error: {}",
            e
        ),
        CliError::FileNotFound(path) => miette::miette!(
            help = "Pass the project directory with --cwd",
            "File not found: {}",
            path.display()
        ),
        _ => miette::miette!("{}", err),
    }
}

/// Report a modern-pass failure recorded on an otherwise successful build.
pub fn degraded_to_miette(err: dual_bundler::Error) -> Report {
    Report::new(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_errors_keep_their_code() {
        let report = cli_error_to_miette(CliError::Build(dual_bundler::Error::Aborted));
        let code = report.code().map(|code| code.to_string());
        assert_eq!(code.as_deref(), Some("ABORTED"));
    }

    #[test]
    fn degraded_builds_are_warnings() {
        let inner = dual_bundler::Error::Engine("boom".into());
        let report = degraded_to_miette(dual_bundler::Error::secondary(inner));
        assert_eq!(report.severity(), Some(miette::Severity::Warning));
    }
}
