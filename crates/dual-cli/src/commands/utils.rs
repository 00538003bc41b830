//! Shared helpers for command implementations.

use crate::error::{CliError, Result};
use std::path::{Path, PathBuf};

/// Resolve `path` against `cwd` unless it is already absolute.
pub fn resolve_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Canonical project directory for `--cwd`.
///
/// The transform configuration is looked up relative to this path, so it must
/// exist and be a directory.
pub fn project_root(cwd: &Path) -> Result<PathBuf> {
    let current = std::env::current_dir()?;
    let root = resolve_path(cwd, &current);
    if !root.exists() {
        return Err(CliError::FileNotFound(root));
    }
    if !root.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "Project directory is not a directory: {}",
            root.display()
        )));
    }
    Ok(root.canonicalize()?)
}
