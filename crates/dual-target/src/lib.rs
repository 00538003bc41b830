//! # dual-target
//!
//! Browser target classification for the `dual` differential bundler.
//!
//! A project declares the browsers it supports as a query, a list of queries,
//! or a per-engine minimum-version map. This crate normalizes that declaration,
//! compares it against [`MODERN_ENGINE_BASELINE`] and decides whether a second,
//! modern-only build pass is worth running.
//!
//! ```
//! use dual_target::{Coverage, EngineVersion, NormalizedMatrix, classify};
//!
//! let mut matrix = NormalizedMatrix::new();
//! matrix.insert("chrome", EngineVersion::new(90, 0, 0));
//! matrix.insert("ie", EngineVersion::new(11, 0, 0));
//! assert_eq!(classify(&matrix), Coverage::Partial);
//! ```

pub mod baseline;
pub mod classifier;
pub mod error;
pub mod matrix;
pub mod resolver;
pub mod version;

pub use baseline::{MODERN_ENGINE_BASELINE, baseline_version};
pub use classifier::{
    Coverage, PAGES_DIR, classify, count_modern_engines, should_enable_secondary_pass,
    should_enable_secondary_pass_with,
};
pub use error::{Result, TargetError};
pub use matrix::{BrowserTargets, NormalizedMatrix, resolve_targets};
pub use resolver::{DEFAULT_QUERY, MatrixResolver, QueryResolver};
pub use version::EngineVersion;
