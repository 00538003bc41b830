//! Minimum engine versions that load native ES modules.

use phf::phf_map;

use crate::version::EngineVersion;

/// Engine name to the first version considered modern.
///
/// Engines missing from this table never count as modern.
pub static MODERN_ENGINE_BASELINE: phf::Map<&'static str, EngineVersion> = phf_map! {
    "chrome" => EngineVersion::new(61, 0, 0),
    "edge" => EngineVersion::new(16, 0, 0),
    "firefox" => EngineVersion::new(60, 0, 0),
    "ios" => EngineVersion::new(10, 3, 0),
    "opera" => EngineVersion::new(48, 0, 0),
    "safari" => EngineVersion::new(10, 1, 0),
};

/// Baseline version for `engine`, if it has one.
pub fn baseline_version(engine: &str) -> Option<EngineVersion> {
    MODERN_ENGINE_BASELINE.get(engine).copied()
}
