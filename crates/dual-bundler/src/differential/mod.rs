//! Differential legacy/modern builds.
//!
//! [`DifferentialPlugin`] hooks the primary compiler's make phase. There it
//! builds a second compiler that mirrors the primary (same context, entries,
//! module rules and plugins, minus exclusions) but emits flat, modern-only
//! chunks under their own filenames. The modern compiler runs while the
//! primary finalizes, and its files are merged into the primary's artifacts.
//!
//! A failing modern pass never fails the primary build: its error is recorded
//! on the primary compilation, wrapped in [`Error::SecondaryCompilation`], and
//! the legacy output is kept as is.
//!
//! [`Error::SecondaryCompilation`]: crate::Error::SecondaryCompilation

mod pass;

pub use pass::{PassState, PassTracker};

use std::fmt;
use std::sync::Arc;

use dual_config::DifferentialSection;

use crate::Result;
use crate::compiler::Compiler;
use crate::output::FilenameTemplate;
use crate::plugin::{Plugin, PluginId};
use pass::SecondaryPass;

/// How the modern pass differs from the primary.
#[derive(Clone)]
pub struct DifferentialOptions {
    /// Entry chunk template, fixed or derived from the primary's.
    pub filename: FilenameTemplate,
    /// Non-entry chunk template, fixed or derived from the primary's.
    pub chunk_filename: FilenameTemplate,
    /// Primary plugins not re-applied to the modern compiler.
    pub excluded_plugins: Vec<PluginId>,
    /// Same, by id string. Used for exclusions coming from `dual.toml`.
    pub excluded_plugin_names: Vec<String>,
    /// Plugins applied to the modern compiler only, after the re-applied ones.
    pub additional_plugins: Vec<Arc<dyn Plugin>>,
}

impl Default for DifferentialOptions {
    fn default() -> Self {
        Self {
            filename: FilenameTemplate::from("[name].es6.js"),
            chunk_filename: FilenameTemplate::from("[id].es6.js"),
            excluded_plugins: Vec::new(),
            excluded_plugin_names: Vec::new(),
            additional_plugins: Vec::new(),
        }
    }
}

impl DifferentialOptions {
    pub fn from_config(config: &DifferentialSection) -> Self {
        Self {
            filename: FilenameTemplate::from(config.filename.as_str()),
            chunk_filename: FilenameTemplate::from(config.chunk_filename.as_str()),
            excluded_plugin_names: config.excluded_plugins.clone(),
            ..Self::default()
        }
    }

    pub fn filename(mut self, template: impl Into<FilenameTemplate>) -> Self {
        self.filename = template.into();
        self
    }

    pub fn chunk_filename(mut self, template: impl Into<FilenameTemplate>) -> Self {
        self.chunk_filename = template.into();
        self
    }

    pub fn exclude(mut self, id: PluginId) -> Self {
        self.excluded_plugins.push(id);
        self
    }

    pub fn additional_plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.additional_plugins.push(plugin);
        self
    }

    /// The differential plugin itself is always excluded.
    pub(crate) fn is_excluded(&self, id: PluginId) -> bool {
        id == DifferentialPlugin::ID
            || self.excluded_plugins.contains(&id)
            || self.excluded_plugin_names.iter().any(|name| name == id.as_str())
    }
}

impl fmt::Debug for DifferentialOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DifferentialOptions")
            .field("filename", &self.filename)
            .field("chunk_filename", &self.chunk_filename)
            .field("excluded_plugins", &self.excluded_plugins)
            .field("excluded_plugin_names", &self.excluded_plugin_names)
            .field(
                "additional_plugins",
                &self.additional_plugins.iter().map(|p| p.id()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Adds a modern pass to the compiler it is applied to.
#[derive(Debug, Clone, Default)]
pub struct DifferentialPlugin {
    options: DifferentialOptions,
    tracker: PassTracker,
}

impl DifferentialPlugin {
    pub const ID: PluginId = PluginId::new("differential");

    pub fn new(options: DifferentialOptions) -> Self {
        Self {
            options,
            tracker: PassTracker::new(),
        }
    }

    pub fn options(&self) -> &DifferentialOptions {
        &self.options
    }

    /// Handle on the modern pass state of the latest build.
    pub fn tracker(&self) -> PassTracker {
        self.tracker.clone()
    }
}

impl Plugin for DifferentialPlugin {
    fn id(&self) -> PluginId {
        Self::ID
    }

    fn apply(&self, compiler: &mut Compiler) -> Result<()> {
        tracing::debug!(compiler = %compiler.name(), "modern pass enabled");
        compiler.tap_make(Arc::new(SecondaryPass {
            options: self.options.clone(),
            tracker: self.tracker.clone(),
        }));
        Ok(())
    }
}
