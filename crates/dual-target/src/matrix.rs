//! Declared and normalized browser matrices.

use std::collections::BTreeMap;

use dual_config::{DEFAULT_PRESET, TransformConfig};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::version::EngineVersion;

/// Key path of the targets declaration inside the default preset's options.
const TARGETS_PATH: &[&str] = &["preset-env", "targets"];

/// A browser support declaration as written by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BrowserTargets {
    /// A single query, e.g. `"chrome 61, firefox 60"`. Empty means environment defaults.
    Query(String),
    /// Several queries, unioned.
    Queries(Vec<String>),
    /// Engine name to minimum version.
    Engines(IndexMap<String, String>),
}

impl BrowserTargets {
    /// The empty query.
    pub fn empty() -> Self {
        BrowserTargets::Query(String::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            BrowserTargets::Query(query) => query.trim().is_empty(),
            BrowserTargets::Queries(queries) => queries.iter().all(|q| q.trim().is_empty()),
            BrowserTargets::Engines(engines) => engines.is_empty(),
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::String(query) => BrowserTargets::Query(query.clone()),
            Value::Array(items) => BrowserTargets::Queries(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_owned))
                    .collect(),
            ),
            Value::Object(map) => BrowserTargets::Engines(
                map.iter()
                    .filter_map(|(engine, version)| {
                        let version = match version {
                            Value::String(s) => s.clone(),
                            Value::Number(n) => n.to_string(),
                            _ => {
                                tracing::debug!(%engine, "skipping non-version target entry");
                                return None;
                            }
                        };
                        Some((engine.clone(), version))
                    })
                    .collect(),
            ),
            _ => BrowserTargets::empty(),
        }
    }
}

impl Default for BrowserTargets {
    fn default() -> Self {
        BrowserTargets::empty()
    }
}

/// Engine name to a single minimum version.
///
/// Ordered by engine name so that listings are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedMatrix(BTreeMap<String, EngineVersion>);

impl NormalizedMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a version, keeping the lower one if the engine is already present.
    pub fn insert(&mut self, engine: impl Into<String>, version: EngineVersion) {
        self.0
            .entry(engine.into())
            .and_modify(|existing| *existing = (*existing).min(version))
            .or_insert(version);
    }

    pub fn get(&self, engine: &str) -> Option<EngineVersion> {
        self.0.get(engine).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, EngineVersion)> {
        self.0.iter().map(|(engine, version)| (engine.as_str(), *version))
    }

    /// Fold another matrix in, lowest version per engine winning.
    pub fn union(&mut self, other: NormalizedMatrix) {
        for (engine, version) in other.0 {
            self.insert(engine, version);
        }
    }
}

impl<S: Into<String>> FromIterator<(S, EngineVersion)> for NormalizedMatrix {
    fn from_iter<I: IntoIterator<Item = (S, EngineVersion)>>(iter: I) -> Self {
        let mut matrix = NormalizedMatrix::new();
        for (engine, version) in iter {
            matrix.insert(engine, version);
        }
        matrix
    }
}

/// Read the declared targets from a transform configuration.
///
/// Looks at the default preset's `preset-env.targets` option. A missing preset
/// or a missing declaration yields the empty query. Never fails.
pub fn resolve_targets(config: &TransformConfig) -> BrowserTargets {
    config
        .preset(DEFAULT_PRESET)
        .and_then(|preset| preset.option_at(TARGETS_PATH))
        .map(BrowserTargets::from_value)
        .unwrap_or_default()
}
