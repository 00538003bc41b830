//! Variant-aware transform configuration.
//!
//! Each module is transformed under a [`CompilationAxis`]: server or client,
//! modern or legacy, and whether a modern variant exists at all. The
//! [`TransformConfigurator`] turns the project's transform configuration plus
//! those flags into a [`TransformPlan`] with a cache identifier that changes
//! whenever either input changes.

mod axis;
mod configurator;
mod loader;

pub use axis::{CompilationAxis, CompilationAxisKey};
pub use configurator::{
    CACHE_VERSION, COMMONJS_MARKER, COMMONJS_PLUGIN, ConfigSession, DATA_KEY_PLUGIN, DATA_MARKER,
    INTERNAL_RUNTIME_PATTERNS, MODULES_COMMONJS_PLUGIN, PAGE_CONFIG_PLUGIN, TransformConfigurator,
    TransformPlan, TransformRequest,
};
pub use loader::{IS_MODERN_OPTION, LoaderSettings, TransformLoaderOptions};
