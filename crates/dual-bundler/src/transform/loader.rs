use std::path::PathBuf;

use serde_json::{Map, Value};

use super::axis::CompilationAxis;
use crate::{Error, Result};

const IS_SERVER: &str = "isServer";
/// Loader option the modern pass sets on the transform loader.
pub const IS_MODERN_OPTION: &str = "isModern";
const HAS_MODERN: &str = "hasModern";
const CACHE: &str = "cache";
const DIST_DIR: &str = "distDir";
const CWD: &str = "cwd";

/// Options carried on the transform loader of a module rule.
///
/// The axis flags and cache switches are consumed here; everything else is
/// passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformLoaderOptions {
    pub axis: CompilationAxis,
    pub cwd: PathBuf,
    pub dist_dir: PathBuf,
    pub cache: bool,
    /// Options for the transform pipeline itself, `cwd` included.
    pub passthrough: Map<String, Value>,
}

impl TransformLoaderOptions {
    pub fn new(cwd: impl Into<PathBuf>, dist_dir: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        let mut passthrough = Map::new();
        passthrough.insert(CWD.into(), Value::String(cwd.to_string_lossy().into_owned()));
        Self {
            axis: CompilationAxis::default(),
            cwd,
            dist_dir: dist_dir.into(),
            cache: true,
            passthrough,
        }
    }

    pub fn axis(mut self, axis: CompilationAxis) -> Self {
        self.axis = axis;
        self
    }

    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Split raw loader options.
    ///
    /// `cwd` is required; `distDir` defaults to `.dual` under it, `cache` to true.
    pub fn from_options(options: &Map<String, Value>) -> Result<Self> {
        let flag = |key: &str| -> Result<bool> {
            match options.get(key) {
                None | Some(Value::Null) => Ok(false),
                Some(Value::Bool(value)) => Ok(*value),
                Some(other) => Err(Error::InvalidConfig(format!(
                    "transform loader option '{key}' must be a boolean, got {other}"
                ))),
            }
        };

        let cwd = options
            .get(CWD)
            .and_then(Value::as_str)
            .map(PathBuf::from)
            .ok_or_else(|| Error::InvalidConfig("transform loader option 'cwd' is required".into()))?;
        let dist_dir = options
            .get(DIST_DIR)
            .and_then(Value::as_str)
            .map(PathBuf::from)
            .unwrap_or_else(|| cwd.join(".dual"));
        let cache = match options.get(CACHE) {
            None | Some(Value::Null) => true,
            Some(Value::Bool(value)) => *value,
            Some(other) => {
                return Err(Error::InvalidConfig(format!(
                    "transform loader option 'cache' must be a boolean, got {other}"
                )));
            }
        };

        let axis = CompilationAxis::new(flag(IS_SERVER)?, flag(IS_MODERN_OPTION)?, flag(HAS_MODERN)?);

        let passthrough = options
            .iter()
            .filter(|(key, _)| ![IS_SERVER, IS_MODERN_OPTION, HAS_MODERN, CACHE, DIST_DIR].contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            axis,
            cwd,
            dist_dir,
            cache,
            passthrough,
        })
    }

    /// Raw loader options, the inverse of [`from_options`](Self::from_options).
    pub fn to_options(&self) -> Map<String, Value> {
        let mut options = self.passthrough.clone();
        options.insert(CWD.into(), Value::String(self.cwd.to_string_lossy().into_owned()));
        options.insert(
            DIST_DIR.into(),
            Value::String(self.dist_dir.to_string_lossy().into_owned()),
        );
        options.insert(CACHE.into(), Value::Bool(self.cache));
        options.insert(IS_SERVER.into(), Value::Bool(self.axis.is_server));
        options.insert(IS_MODERN_OPTION.into(), Value::Bool(self.axis.is_modern));
        options.insert(HAS_MODERN.into(), Value::Bool(self.axis.has_modern));
        options
    }
}

/// Loader settings after the axis flags were split off.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoaderSettings {
    /// `None` when caching is disabled.
    pub cache_directory: Option<PathBuf>,
    pub cache_identifier: Option<String>,
    pub cache_compression: bool,
    pub passthrough: Map<String, Value>,
}
