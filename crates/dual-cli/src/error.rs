//! Error handling for the dual CLI.
//!
//! [`CliError`] wraps the configuration and bundler errors and adds the few
//! failures that only the command line can produce. [`ResultExt`] attaches
//! paths and hints to foreign errors at the call site.
//!
//! # Example
//!
//! ```rust,no_run
//! use dual_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_entry(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path).with_path(path)
//! }
//! ```

pub mod miette;

use std::path::PathBuf;
use thiserror::Error;

pub use self::miette::cli_error_to_miette;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// `dual.toml` or transform configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] dual_config::ConfigError),

    /// The primary build failed
    #[error("Build error: {0}")]
    Build(#[from] dual_bundler::Error),

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Result type alias for CLI operations.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Attach context to foreign errors.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;

    /// Prefix the error with a hint for the user.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<CliError>,
{
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|err| match err.into() {
            CliError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.into())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|err| CliError::Custom(format!("{}\n\nHint: {hint}", err.into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn not_found_becomes_file_not_found() {
        let result: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = result.with_path("/app/dual.toml").unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(path) if path == PathBuf::from("/app/dual.toml")));
    }

    #[test]
    fn other_io_errors_pass_through() {
        let result: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
        assert!(matches!(result.with_path("/app").unwrap_err(), CliError::Io(_)));
    }

    #[test]
    fn hint_is_appended() {
        let result: std::result::Result<(), CliError> =
            Err(CliError::InvalidArgument("--cwd".into()));
        let err = result.with_hint("Pass an existing directory").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument: --cwd\n\nHint: Pass an existing directory"
        );
    }

    #[test]
    fn bundler_errors_convert() {
        let err: CliError = dual_bundler::Error::Aborted.into();
        assert!(matches!(err, CliError::Build(dual_bundler::Error::Aborted)));
    }
}
