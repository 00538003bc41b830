//! Decides whether a second, modern-only pass is worth building.

use std::path::Path;

use dual_config::TransformDiscovery;
use serde::Serialize;

use crate::baseline::baseline_version;
use crate::matrix::{NormalizedMatrix, resolve_targets};
use crate::resolver::{MatrixResolver, QueryResolver};

/// Directory, relative to the working directory, whose config decides the targets.
pub const PAGES_DIR: &str = "pages";

/// How much of a matrix is already modern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Coverage {
    /// No declared engine meets the baseline.
    None,
    /// Some, but not all, declared engines meet the baseline.
    Partial,
    /// Every declared engine meets the baseline.
    Full,
}

impl Coverage {
    /// Only a mixed matrix gains anything from two bundles.
    pub fn wants_secondary_pass(self) -> bool {
        matches!(self, Coverage::Partial)
    }
}

/// Count declared engines at or above their modern baseline.
///
/// Engines without a baseline entry are ignored.
pub fn count_modern_engines(matrix: &NormalizedMatrix) -> usize {
    matrix
        .iter()
        .filter(|(engine, version)| {
            baseline_version(engine).is_some_and(|baseline| *version >= baseline)
        })
        .count()
}

pub fn classify(matrix: &NormalizedMatrix) -> Coverage {
    let modern = count_modern_engines(matrix);
    if modern == 0 {
        Coverage::None
    } else if modern == matrix.len() {
        Coverage::Full
    } else {
        Coverage::Partial
    }
}

/// [`should_enable_secondary_pass_with`] using the built-in [`QueryResolver`].
pub fn should_enable_secondary_pass(working_directory: &Path) -> bool {
    should_enable_secondary_pass_with(working_directory, &QueryResolver::new())
}

/// Decide from the transform config that applies to `<working_directory>/pages`.
///
/// No config at all means `true`. Load or normalization failures also mean
/// `true`: an unneeded pass costs build time, a skipped one costs users.
pub fn should_enable_secondary_pass_with(
    working_directory: &Path,
    resolver: &dyn MatrixResolver,
) -> bool {
    let discovery = TransformDiscovery::new(working_directory);
    let loaded = match discovery.load_partial(&working_directory.join(PAGES_DIR)) {
        Ok(Some(loaded)) => loaded,
        Ok(None) => {
            tracing::debug!(cwd = %working_directory.display(), "no transform config; enabling modern pass");
            return true;
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to load transform config; enabling modern pass");
            return true;
        }
    };

    let targets = resolve_targets(&loaded.options);
    let matrix = match resolver.resolve(&targets) {
        Ok(matrix) => matrix,
        Err(err) => {
            tracing::warn!(error = %err, "failed to resolve browser targets; enabling modern pass");
            return true;
        }
    };

    let coverage = classify(&matrix);
    tracing::debug!(
        engines = matrix.len(),
        modern = count_modern_engines(&matrix),
        ?coverage,
        "classified browser matrix"
    );
    coverage.wants_secondary_pass()
}
