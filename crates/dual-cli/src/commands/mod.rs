//! Command implementations.
//!
//! - [`targets`] - browser matrix and the modern-pass decision
//! - [`cache_key`] - transform cache identifier for one axis
//! - [`build`] - primary build plus the optional modern pass
//!
//! Each module provides an `execute` function taking its parsed arguments.

pub mod build;
pub mod cache_key;
pub mod targets;
pub(crate) mod utils;

pub use build::execute as build_execute;
pub use cache_key::execute as cache_key_execute;
pub use targets::execute as targets_execute;
