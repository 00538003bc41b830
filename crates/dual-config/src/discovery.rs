//! File-based discovery of transform configuration.
//!
//! Two kinds of files are recognised, in the same way the transform pipeline
//! itself resolves them:
//!
//! - a project-wide `babel.config.json` at the project root
//! - a file-relative `.babelrc` / `.babelrc.json` (or a `babel` field in
//!   `package.json`), searched from the compiled file's directory upwards and
//!   stopping at the first package boundary
//!
//! The project-wide file is applied first, the file-relative one on top.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{ConfigError, Result};
use crate::transform::TransformConfig;

/// Project-wide configuration file name.
pub const ROOT_CONFIG_FILE: &str = "babel.config.json";

/// File-relative configuration file names, in lookup order.
pub const RELATIVE_CONFIG_FILES: &[&str] = &[".babelrc", ".babelrc.json"];

const PACKAGE_JSON: &str = "package.json";
const PACKAGE_JSON_FIELD: &str = "babel";

/// The configuration that applies to one file, plus where it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedConfig {
    pub options: TransformConfig,
    /// Project-wide config file, if any.
    pub config: Option<PathBuf>,
    /// File-relative config file, if any.
    pub babelrc: Option<PathBuf>,
}

impl LoadedConfig {
    /// A config with no file behind it.
    pub fn empty(cwd: impl Into<PathBuf>, filename: impl Into<PathBuf>) -> Self {
        Self {
            options: TransformConfig {
                cwd: Some(cwd.into()),
                filename: Some(filename.into()),
                ..TransformConfig::default()
            },
            config: None,
            babelrc: None,
        }
    }

    /// True when a user-supplied file contributed to this config.
    pub fn has_filesystem_config(&self) -> bool {
        self.config.is_some() || self.babelrc.is_some()
    }

    /// Files that contributed, relative file last.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.babelrc
            .iter()
            .chain(self.config.iter())
            .map(PathBuf::as_path)
    }
}

/// Transform configuration discovery rooted at a project directory.
///
/// # Example
///
/// ```no_run
/// use dual_config::TransformDiscovery;
///
/// let discovery = TransformDiscovery::new(".");
/// match discovery.load_partial("./pages".as_ref()).unwrap() {
///     Some(loaded) => println!("{} presets", loaded.options.presets.len()),
///     None => println!("no transform config"),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TransformDiscovery {
    root: PathBuf,
}

impl TransformDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Locate the project-wide config file.
    pub fn find_root_config(&self) -> Option<PathBuf> {
        let path = self.root.join(ROOT_CONFIG_FILE);
        path.is_file().then_some(path)
    }

    /// Locate the file-relative config for `filename`.
    ///
    /// Walks from the file's directory towards the root. A directory holding
    /// `package.json` is a package boundary: it is searched, then the walk stops.
    pub fn find_relative_config(&self, filename: &Path) -> Option<PathBuf> {
        let start = filename.parent().unwrap_or(&self.root);
        let start = if start.starts_with(&self.root) {
            start
        } else {
            self.root.as_path()
        };

        for dir in start.ancestors() {
            for name in RELATIVE_CONFIG_FILES {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }

            let package_json = dir.join(PACKAGE_JSON);
            if package_json.is_file() {
                if package_has_config(&package_json) {
                    return Some(package_json);
                }
                break;
            }

            if dir == self.root {
                break;
            }
        }

        None
    }

    /// Load the configuration that applies to `filename`.
    ///
    /// Returns `Ok(None)` when no config file applies at all.
    pub fn load_partial(&self, filename: &Path) -> Result<Option<LoadedConfig>> {
        let config = self.find_root_config();
        let babelrc = self.find_relative_config(filename);

        if config.is_none() && babelrc.is_none() {
            tracing::debug!(filename = %filename.display(), "no transform config found");
            return Ok(None);
        }

        let mut options = TransformConfig::default();
        for path in config.iter().chain(babelrc.iter()) {
            options.merge_from(read_config_file(path)?);
        }
        options.cwd = Some(self.root.clone());
        options.filename = Some(filename.to_path_buf());

        Ok(Some(LoadedConfig {
            options,
            config,
            babelrc,
        }))
    }

    /// Like [`load_partial`](Self::load_partial) but falls back to an empty config.
    pub fn load(&self, filename: &Path) -> Result<LoadedConfig> {
        Ok(self
            .load_partial(filename)?
            .unwrap_or_else(|| LoadedConfig::empty(&self.root, filename)))
    }
}

fn package_has_config(path: &Path) -> bool {
    fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str::<Value>(&content).ok())
        .is_some_and(|parsed| {
            parsed
                .get(PACKAGE_JSON_FIELD)
                .is_some_and(|field| !field.is_null())
        })
}

fn read_config_file(path: &Path) -> Result<TransformConfig> {
    let content = fs::read_to_string(path)?;
    let parsed: Value =
        serde_json::from_str(&content).map_err(|e| ConfigError::parse(path, e))?;

    let value = if path.file_name() == Some(std::ffi::OsStr::new(PACKAGE_JSON)) {
        parsed
            .get(PACKAGE_JSON_FIELD)
            .cloned()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: PACKAGE_JSON_FIELD.to_string(),
                hint: Some(format!("{} has no '{}' field", path.display(), PACKAGE_JSON_FIELD)),
            })?
    } else {
        parsed
    };

    serde_json::from_value(value).map_err(|e| ConfigError::parse(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_partial_returns_none_without_files() {
        let dir = TempDir::new().unwrap();
        let discovery = TransformDiscovery::new(dir.path());
        let loaded = discovery
            .load_partial(&dir.path().join("pages"))
            .unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn load_falls_back_to_empty_config() {
        let dir = TempDir::new().unwrap();
        let discovery = TransformDiscovery::new(dir.path());
        let loaded = discovery.load(&dir.path().join("noop.js")).unwrap();
        assert!(!loaded.has_filesystem_config());
        assert_eq!(loaded.options.cwd.as_deref(), Some(dir.path()));
    }

    #[test]
    fn finds_babelrc_next_to_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".babelrc"), r#"{ "presets": ["a"] }"#).unwrap();

        let discovery = TransformDiscovery::new(dir.path());
        let loaded = discovery
            .load_partial(&dir.path().join("pages"))
            .unwrap()
            .unwrap();

        assert_eq!(loaded.babelrc, Some(dir.path().join(".babelrc")));
        assert!(loaded.config.is_none());
        assert_eq!(loaded.options.presets[0].name, "a");
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(ROOT_CONFIG_FILE), "{ not json").unwrap();

        let discovery = TransformDiscovery::new(dir.path());
        let err = discovery
            .load_partial(&dir.path().join("noop.js"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
