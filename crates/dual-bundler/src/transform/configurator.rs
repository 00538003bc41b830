use std::path::{Path, PathBuf};

use dual_config::{
    CallerMetadata, ConfigItem, DEFAULT_PRESET, LoadedConfig, OverrideRule, TransformConfig,
    TransformDiscovery,
};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::json;

use super::axis::{CompilationAxis, CompilationAxisKey};
use super::loader::{LoaderSettings, TransformLoaderOptions};
use crate::Result;
use crate::rules::TRANSFORM_LOADER;

/// Bump to invalidate every transform cache entry.
pub const CACHE_VERSION: &str = "1";

const CACHE_PREFIX: &str = "dual-transform-";
const CACHE_SUBDIR: &str = "dual-transform";
const PLACEHOLDER_FILE: &str = "noop.js";
const PAGES_DIR: &str = "pages";

/// Extracts page-level config from routed page files.
pub const PAGE_CONFIG_PLUGIN: &str = "dual/page-config";
/// Keys server-side data fetching per module.
pub const DATA_KEY_PLUGIN: &str = "dual/data-key";
/// Rewrites mixed CommonJS/ES module files to CommonJS.
pub const COMMONJS_PLUGIN: &str = "dual/commonjs";
/// Plain ES module to CommonJS transform.
pub const MODULES_COMMONJS_PLUGIN: &str = "transform-modules-commonjs";

/// Source marker that enables [`DATA_KEY_PLUGIN`] on the server.
pub const DATA_MARKER: &str = "dual/data";
/// Source marker for CommonJS exports.
pub const COMMONJS_MARKER: &str = "module.exports";

/// Internal runtime modules that keep state and must stay CommonJS in every variant.
pub const INTERNAL_RUNTIME_PATTERNS: &[&str] = &[
    r"dual[\\/]dist[\\/]runtime",
    r"dual[\\/]dist[\\/]client",
    r"dual[\\/]dist[\\/]pages",
];

/// State shared by every transform in one build.
///
/// Dropped with the build; nothing in it outlives a build.
#[derive(Debug, Default)]
pub struct ConfigSession {
    announced: Mutex<FxHashSet<PathBuf>>,
    cache_identifiers: Mutex<FxHashMap<(PathBuf, CompilationAxis), String>>,
}

impl ConfigSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` as announced. True the first time only.
    pub fn announce(&self, path: &Path) -> bool {
        self.announced.lock().insert(path.to_path_buf())
    }

    /// Configuration files announced so far, sorted.
    pub fn announced(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.announced.lock().iter().cloned().collect();
        paths.sort();
        paths
    }
}

/// One module to configure.
#[derive(Debug, Clone, Copy)]
pub struct TransformRequest<'a> {
    pub filename: &'a Path,
    pub source: &'a str,
    pub options: &'a TransformLoaderOptions,
}

/// The configuration a module is transformed with.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformPlan {
    pub axis: CompilationAxis,
    pub config: TransformConfig,
    pub settings: LoaderSettings,
}

impl TransformPlan {
    pub fn cache_identifier(&self) -> Option<&str> {
        self.settings.cache_identifier.as_deref()
    }

    pub fn axis_key(&self) -> CompilationAxisKey {
        CompilationAxisKey::new(self.axis, &self.config)
    }

    /// Plugins that run on this file: the configured ones, then those of every
    /// matching override.
    pub fn effective_plugins(&self) -> Vec<&ConfigItem> {
        let mut plugins: Vec<&ConfigItem> = self.config.plugins.iter().collect();
        if let Some(filename) = &self.config.filename {
            for rule in self.config.overrides.iter().filter(|rule| rule.matches(filename)) {
                plugins.extend(rule.plugins.iter());
            }
        }
        plugins
    }
}

/// Builds per-module transform configuration.
#[derive(Debug, Clone)]
pub struct TransformConfigurator {
    default_preset: ConfigItem,
}

impl Default for TransformConfigurator {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformConfigurator {
    pub fn new() -> Self {
        Self {
            default_preset: ConfigItem::new(DEFAULT_PRESET),
        }
    }

    /// Replace the preset injected into projects without configuration.
    pub fn with_default_preset(mut self, preset: ConfigItem) -> Self {
        self.default_preset = preset;
        self
    }

    /// Cache identifier for `axis` in project `cwd`.
    ///
    /// `dual-transform-<version>-` followed by the axis suffix and the canonical
    /// JSON of the configuration resolved for `<cwd>/noop.js`. Memoized per
    /// session.
    pub fn cache_identifier(
        &self,
        session: &ConfigSession,
        cwd: &Path,
        axis: CompilationAxis,
    ) -> Result<String> {
        let memo_key = (cwd.to_path_buf(), axis);
        if let Some(id) = session.cache_identifiers.lock().get(&memo_key) {
            return Ok(id.clone());
        }

        let baseline = TransformDiscovery::new(cwd).load(&cwd.join(PLACEHOLDER_FILE))?;
        let id = format!(
            "{CACHE_PREFIX}{CACHE_VERSION}-{}{}",
            axis.suffix(),
            baseline.options.to_canonical_json()
        );

        session
            .cache_identifiers
            .lock()
            .insert(memo_key, id.clone());
        Ok(id)
    }

    /// Loader settings for `options`: cache location and identity, axis flags removed.
    pub fn loader_settings(
        &self,
        session: &ConfigSession,
        options: &TransformLoaderOptions,
    ) -> Result<LoaderSettings> {
        if !options.cache {
            return Ok(LoaderSettings {
                passthrough: options.passthrough.clone(),
                ..LoaderSettings::default()
            });
        }

        Ok(LoaderSettings {
            cache_directory: Some(options.dist_dir.join("cache").join(CACHE_SUBDIR)),
            cache_identifier: Some(self.cache_identifier(session, &options.cwd, options.axis)?),
            cache_compression: false,
            passthrough: options.passthrough.clone(),
        })
    }

    /// Configure one module.
    pub fn configure(
        &self,
        session: &ConfigSession,
        request: TransformRequest<'_>,
    ) -> Result<TransformPlan> {
        let TransformRequest {
            filename,
            source,
            options,
        } = request;
        let axis = options.axis;
        let cwd = options.cwd.as_path();

        let loaded = TransformDiscovery::new(cwd).load(filename)?;
        let mut config = self.base_config(session, loaded, axis);

        config.caller = Some(CallerMetadata {
            name: TRANSFORM_LOADER.to_string(),
            is_server: axis.is_server,
            is_modern: axis.is_modern,
        });

        if !axis.is_server && filename.starts_with(cwd.join(PAGES_DIR)) {
            config.plugins.push(ConfigItem::new(PAGE_CONFIG_PLUGIN));
        }

        if axis.is_server && source.contains(DATA_MARKER) {
            config.plugins.push(ConfigItem::with_options(
                DATA_KEY_PLUGIN,
                json!({ "key": data_key(filename) }),
            ));
        }

        if !axis.has_modern && source.contains(COMMONJS_MARKER) {
            config.plugins.push(ConfigItem::new(COMMONJS_PLUGIN));
        }

        config.overrides.push(OverrideRule {
            test: INTERNAL_RUNTIME_PATTERNS.iter().map(|p| p.to_string()).collect(),
            presets: Vec::new(),
            plugins: vec![ConfigItem::new(MODULES_COMMONJS_PLUGIN)],
        });

        let settings = self.loader_settings(session, options)?;
        tracing::trace!(file = %filename.display(), %axis, "configured transform");

        Ok(TransformPlan {
            axis,
            config,
            settings,
        })
    }

    /// User configuration when there is any, the default preset otherwise.
    fn base_config(
        &self,
        session: &ConfigSession,
        loaded: LoadedConfig,
        axis: CompilationAxis,
    ) -> TransformConfig {
        if !loaded.has_filesystem_config() {
            let mut config = loaded.options;
            config.presets.push(self.default_preset.clone());
            return config;
        }

        // Server builds stay quiet; the client build already announced the file.
        if !axis.is_server {
            for file in loaded.files() {
                if session.announce(file) {
                    tracing::info!(location = %file.display(), "using external transform configuration");
                }
            }
        }
        loaded.options
    }
}

/// `<basename>-<hash>` of a module path.
fn data_key(filename: &Path) -> String {
    let basename = filename
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let hash = blake3::hash(filename.to_string_lossy().as_bytes()).to_hex();
    format!("{basename}-{}", &hash[..8])
}
