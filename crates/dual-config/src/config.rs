//! Project configuration (`dual.toml`).
//!
//! Layered with figment. Priority: `DUAL_*` environment variables > `dual.toml` > defaults.
//! Nested keys use a double underscore in the environment, e.g.
//! `DUAL_DIFFERENTIAL__ENABLED=off`.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, Result};
use crate::settings::GlobalSettings;

/// Project config file name.
pub const CONFIG_FILE: &str = "dual.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DualConfig {
    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub differential: DifferentialSection,

    #[serde(default)]
    pub optimization: OptimizationSection,

    #[serde(default)]
    pub settings: GlobalSettings,
}

impl DualConfig {
    /// Load the layered configuration for a project root.
    pub fn load(root: &Path) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(DualConfig::default()));

        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading project config");
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("DUAL_").split("__"));

        figment.extract().map_err(|e| ConfigError::InvalidValue {
            field: CONFIG_FILE.to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Build from an in-memory value (for programmatic use and tests).
    ///
    /// ```
    /// use dual_config::DualConfig;
    /// use serde_json::json;
    ///
    /// let config = DualConfig::from_value(json!({
    ///     "build": { "entry": { "main": "src/main.js" } }
    /// })).unwrap();
    /// assert_eq!(config.build.out_dir.to_str(), Some("dist"));
    /// ```
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSection {
    #[serde(default)]
    pub entry: EntryConfig,

    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    #[serde(default = "default_filename")]
    pub filename: String,

    #[serde(default = "default_chunk_filename")]
    pub chunk_filename: String,

    /// Directory for build state such as the transform cache.
    #[serde(default = "default_dist_dir")]
    pub dist_dir: PathBuf,

    #[serde(default = "default_true")]
    pub cache: bool,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            entry: EntryConfig::default(),
            out_dir: default_out_dir(),
            filename: default_filename(),
            chunk_filename: default_chunk_filename(),
            dist_dir: default_dist_dir(),
            cache: true,
        }
    }
}

/// Entry declaration: one path, or named entries of one or many paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryConfig {
    Single(String),
    Named(IndexMap<String, EntryTarget>),
}

impl Default for EntryConfig {
    fn default() -> Self {
        EntryConfig::Single("src/index.js".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryTarget {
    Single(String),
    Multiple(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferentialSection {
    #[serde(default)]
    pub enabled: DifferentialMode,

    #[serde(default = "default_modern_filename")]
    pub filename: String,

    #[serde(default = "default_modern_chunk_filename")]
    pub chunk_filename: String,

    /// Plugin ids never re-applied to the modern pass.
    #[serde(default)]
    pub excluded_plugins: Vec<String>,
}

impl Default for DifferentialSection {
    fn default() -> Self {
        Self {
            enabled: DifferentialMode::Auto,
            filename: default_modern_filename(),
            chunk_filename: default_modern_chunk_filename(),
            excluded_plugins: Vec::new(),
        }
    }
}

/// Whether the modern pass runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifferentialMode {
    /// Decide from the browser targets.
    #[default]
    Auto,
    On,
    Off,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSection {
    #[serde(default)]
    pub minimize: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_chunk: Option<RuntimeChunkMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_chunks: Option<SplitChunksSection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeChunkMode {
    Single,
    Multiple,
}

/// Which chunks shared-module extraction considers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitChunksMode {
    All,
    #[default]
    Async,
    Initial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitChunksSection {
    #[serde(default)]
    pub chunks: SplitChunksMode,

    #[serde(default = "default_min_size")]
    pub min_size: usize,
}

fn default_true() -> bool {
    true
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_dist_dir() -> PathBuf {
    PathBuf::from(".dual")
}

fn default_filename() -> String {
    "[name].js".to_string()
}

fn default_chunk_filename() -> String {
    "[id].js".to_string()
}

fn default_modern_filename() -> String {
    "[name].es6.js".to_string()
}

fn default_modern_chunk_filename() -> String {
    "[id].es6.js".to_string()
}

fn default_min_size() -> usize {
    20_000
}
