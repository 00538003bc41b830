use std::fmt;

use dual_config::TransformConfig;
use serde::{Deserialize, Serialize};

/// The flags a module is transformed under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationAxis {
    pub is_server: bool,
    pub is_modern: bool,
    /// A modern variant is built alongside the legacy one.
    pub has_modern: bool,
}

impl CompilationAxis {
    pub const fn new(is_server: bool, is_modern: bool, has_modern: bool) -> Self {
        Self {
            is_server,
            is_modern,
            has_modern,
        }
    }

    pub const fn client() -> Self {
        Self::new(false, false, false)
    }

    pub const fn server() -> Self {
        Self::new(true, false, false)
    }

    pub fn with_modern(mut self, is_modern: bool) -> Self {
        self.is_modern = is_modern;
        self
    }

    pub fn with_has_modern(mut self, has_modern: bool) -> Self {
        self.has_modern = has_modern;
        self
    }

    /// Cache identifier suffix, e.g. `-server-modern`.
    pub fn suffix(&self) -> String {
        let mut suffix = String::new();
        if self.is_server {
            suffix.push_str("-server");
        }
        if self.is_modern {
            suffix.push_str("-modern");
        }
        if self.has_modern {
            suffix.push_str("-has-modern");
        }
        suffix
    }
}

impl fmt::Display for CompilationAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}{}",
            if self.is_server { "server" } else { "client" },
            if self.is_modern { "modern" } else { "legacy" },
            if self.has_modern { "+modern" } else { "" }
        )
    }
}

/// Axis flags plus a fingerprint of the external configuration.
///
/// Two keys are equal exactly when the flags are equal and the configurations
/// serialize to the same canonical JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompilationAxisKey {
    pub axis: CompilationAxis,
    pub config_fingerprint: String,
}

impl CompilationAxisKey {
    pub fn new(axis: CompilationAxis, config: &TransformConfig) -> Self {
        let canonical = config.to_canonical_json();
        Self {
            axis,
            config_fingerprint: blake3::hash(canonical.as_bytes()).to_hex().to_string(),
        }
    }
}
