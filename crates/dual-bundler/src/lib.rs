#![cfg_attr(docsrs, feature(doc_cfg))]

//! # dual-bundler
//!
//! Differential legacy/modern bundling.
//!
//! A primary [`Compiler`] produces the broadly compatible bundle. When the
//! [`DifferentialPlugin`] is installed, it prepares a second, modern-only
//! compilation during the primary's make phase, runs it while the primary
//! finalizes its assets, and merges the modern files into the primary's
//! [`ArtifactSet`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use dual_bundler::{
//!     Bindings, CompilerOptions, DifferentialPlugin, EntrySpec, FlatEngine, NativeRuntime,
//!     UnboundCompiler,
//! };
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fs = Arc::new(NativeRuntime::new("."));
//! let options = CompilerOptions::new(".", EntrySpec::single("./src/index.js"))
//!     .plugin(Arc::new(DifferentialPlugin::default()));
//!
//! let mut compiler = UnboundCompiler::new(options)
//!     .bind(Bindings::shared(fs), Arc::new(FlatEngine::new()));
//! compiler.activate()?;
//!
//! let compilation = compiler.run().await?;
//! compiler.emit(&compilation.artifacts).await?;
//! # Ok(()) }
//! ```

pub mod artifact;
pub mod builtins;
pub mod compiler;
pub mod differential;
pub mod engine;
pub mod entry;
pub mod optimization;
pub mod output;
pub mod plugin;
pub mod querystring;
pub mod rules;
pub mod runtime;
pub mod transform;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{LogLevel, init_logging, init_logging_from_env};

pub use artifact::{Artifact, ArtifactSet, Chunk, ChunkGroup, MergeReport, ModuleRecord, merge};
pub use builtins::{EntryPlugin, FlatChunkFormatPlugin, RuntimeChunkPlugin, SplitChunksPlugin};
pub use compiler::{
    Bindings, BoundEntry, BuildAbort, ChunkFormat, Compilation, Compiler, CompilerOptions,
    UnboundCompiler,
};
pub use differential::{DifferentialOptions, DifferentialPlugin, PassState, PassTracker};
pub use engine::{Engine, FlatEngine};
pub use entry::{EntryMap, EntryResolver, EntrySpec, EntryValue};
pub use optimization::{
    ChunksFilter, Minimizer, OptimizationOptions, RuntimeChunk, SplitChunksOptions,
    WhitespaceMinimizer,
};
pub use output::{FilenameTemplate, OutputOptions};
pub use plugin::{FinalizeTask, MakeHook, Plugin, PluginId};
pub use rules::{LoaderSpec, ModuleRule, RuleUse, TRANSFORM_LOADER};
pub use runtime::{MemoryRuntime, NativeRuntime, Runtime, RuntimeError};
pub use transform::{
    CompilationAxis, CompilationAxisKey, ConfigSession, LoaderSettings, TransformConfigurator,
    TransformLoaderOptions, TransformPlan, TransformRequest,
};

/// Error types for dual-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No transform loader among the module rules.
    #[error("Transform loader not found: {0}")]
    PluginDiscovery(String),

    /// Entry specification could not be resolved to files.
    #[error("Entry resolution failed: {0}")]
    EntryResolution(String),

    /// Filesystem runtime failure.
    #[error("Filesystem error: {0}")]
    FileSystem(#[from] RuntimeError),

    /// Compilation engine failure.
    #[error("Engine error: {0}")]
    Engine(String),

    /// The modern compilation failed; the primary build is degraded, not failed.
    #[error("Modern compilation failed: {0}")]
    SecondaryCompilation(#[source] Box<Error>),

    /// The build was aborted by the host.
    #[error("Build aborted")]
    Aborted,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading error.
    #[error("Configuration error: {0}")]
    Config(#[from] dual_config::ConfigError),
}

/// Result type alias for dual-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an error raised inside the modern compilation.
    pub fn secondary(inner: Error) -> Self {
        match inner {
            already @ Error::SecondaryCompilation(_) => already,
            other => Error::SecondaryCompilation(Box::new(other)),
        }
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::PluginDiscovery(_) => "PLUGIN_DISCOVERY",
            Error::EntryResolution(_) => "ENTRY_RESOLUTION",
            Error::FileSystem(_) => "FILESYSTEM_ERROR",
            Error::Engine(_) => "ENGINE_ERROR",
            Error::SecondaryCompilation(_) => "SECONDARY_COMPILATION",
            Error::Aborted => "ABORTED",
            Error::Io(_) => "IO_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self {
            Error::SecondaryCompilation(_) => miette::Severity::Warning,
            _ => miette::Severity::Error,
        })
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::InvalidConfig(msg) => Some(Box::new(format!(
                "Check your configuration file for syntax errors.\nError: {}",
                msg
            ))),
            Error::PluginDiscovery(_) => Some(Box::new(format!(
                "Add a module rule that uses '{}' so the modern pass can be configured.",
                rules::TRANSFORM_LOADER
            ))),
            Error::EntryResolution(msg) => Some(Box::new(format!(
                "Check the entry paths in dual.toml.\nError: {}",
                msg
            ))),
            Error::SecondaryCompilation(_) => Some(Box::new(
                "The legacy bundle was still produced. Fix the error above to get the modern bundle back."
                    .to_string(),
            )),
            Error::Config(_) => Some(Box::new(
                "Check babel.config.json, .babelrc and dual.toml for syntax errors.".to_string(),
            )),
            _ => None,
        }
    }
}
