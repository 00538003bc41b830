//! Transform pipeline configuration as read from `.babelrc`-style files.
//!
//! The shapes mirror what the transform pipeline accepts: presets and plugins
//! are either a bare name or a `[name, options]` pair, overrides carry a list
//! of path patterns. Anything this crate does not model is kept verbatim in
//! [`TransformConfig::extra`] so it survives a load/serialize round trip.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use parking_lot::Mutex;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Name of the preset injected when a project has no configuration of its own.
pub const DEFAULT_PRESET: &str = "dual/preset";

/// Fully resolved transform configuration for one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<PathBuf>,

    #[serde(default)]
    pub presets: Vec<ConfigItem>,

    #[serde(default)]
    pub plugins: Vec<ConfigItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<OverrideRule>,

    /// Metadata stamped by the caller so transform plugins can branch on it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<CallerMetadata>,

    /// Keys this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransformConfig {
    /// Find a preset by name.
    pub fn preset(&self, name: &str) -> Option<&ConfigItem> {
        self.presets.iter().find(|item| item.name == name)
    }

    /// Fold a later config file on top of this one.
    ///
    /// Presets, plugins and overrides accumulate in load order; scalar keys
    /// from `other` replace ours.
    pub fn merge_from(&mut self, other: TransformConfig) {
        self.presets.extend(other.presets);
        self.plugins.extend(other.plugins);
        self.overrides.extend(other.overrides);
        if other.caller.is_some() {
            self.caller = other.caller;
        }
        for (key, value) in other.extra {
            self.extra.insert(key, value);
        }
    }

    /// Canonical JSON form: object keys sorted at every depth, so equal
    /// configurations always serialize to identical bytes.
    pub fn to_canonical_json(&self) -> String {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        sort_keys_deep(&mut value);
        value.to_string()
    }
}

fn sort_keys_deep(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.sort_keys();
            for child in map.values_mut() {
                sort_keys_deep(child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sort_keys_deep),
        _ => {}
    }
}

/// A preset or plugin reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawConfigItem", into = "RawConfigItem")]
pub struct ConfigItem {
    pub name: String,
    /// `Value::Null` when the item was declared without options.
    pub options: Value,
}

impl ConfigItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Value::Null,
        }
    }

    pub fn with_options(name: impl Into<String>, options: Value) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    /// Look up a nested option by key path, e.g. `["preset-env", "targets"]`.
    pub fn option_at(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(&self.options, |value, key| value.get(*key))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawConfigItem {
    Name(String),
    WithOptions(String, Value),
}

impl From<RawConfigItem> for ConfigItem {
    fn from(raw: RawConfigItem) -> Self {
        match raw {
            RawConfigItem::Name(name) => ConfigItem::new(name),
            RawConfigItem::WithOptions(name, options) => ConfigItem::with_options(name, options),
        }
    }
}

impl From<ConfigItem> for RawConfigItem {
    fn from(item: ConfigItem) -> Self {
        if item.options.is_null() {
            RawConfigItem::Name(item.name)
        } else {
            RawConfigItem::WithOptions(item.name, item.options)
        }
    }
}

/// Extra presets/plugins applied to files whose path matches `test`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideRule {
    /// Regex sources matched against the file path.
    #[serde(default, deserialize_with = "one_or_many")]
    pub test: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub presets: Vec<ConfigItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<ConfigItem>,
}

/// Compiled override patterns keyed by source; `None` marks one that failed.
static OVERRIDE_PATTERNS: LazyLock<Mutex<FxHashMap<String, Option<Regex>>>> =
    LazyLock::new(|| Mutex::new(FxHashMap::default()));

fn override_pattern(source: &str) -> Option<Regex> {
    let mut cache = OVERRIDE_PATTERNS.lock();
    if let Some(entry) = cache.get(source) {
        return entry.clone();
    }
    let entry = match Regex::new(source) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::debug!(pattern = %source, error = %err, "ignoring invalid override pattern");
            None
        }
    };
    cache.insert(source.to_string(), entry.clone());
    entry
}

impl OverrideRule {
    /// True when any pattern matches. Patterns that fail to compile never match.
    pub fn matches(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.test
            .iter()
            .any(|source| override_pattern(source).is_some_and(|re| re.is_match(&path)))
    }
}

/// Caller-provided context visible to transform plugins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_server: bool,
    #[serde(default)]
    pub is_modern: bool,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}
