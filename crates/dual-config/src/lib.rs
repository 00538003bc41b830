//! # dual-config
//!
//! Configuration for the `dual` differential bundler:
//!
//! - [`TransformDiscovery`] finds the transform-pipeline configuration
//!   (`babel.config.json`, `.babelrc`, `package.json#babel`) that applies to a file
//! - [`DualConfig`] is the layered project configuration (`dual.toml`)

pub mod config;
pub mod discovery;
pub mod error;
pub mod settings;
pub mod transform;

pub use config::*;
pub use discovery::{LoadedConfig, ROOT_CONFIG_FILE, RELATIVE_CONFIG_FILES, TransformDiscovery};
pub use error::*;
pub use settings::*;
pub use transform::*;
