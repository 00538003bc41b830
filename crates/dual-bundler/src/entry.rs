//! Entry specifications.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dual_config::{EntryConfig, EntryTarget};
use indexmap::IndexMap;

use crate::Result;

/// Entry name used when the specification is a single path.
pub const DEFAULT_ENTRY_NAME: &str = "index";

/// One or many source paths behind an entry name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValue {
    Single(String),
    Multi(Vec<String>),
}

pub type EntryMap = IndexMap<String, EntryValue>;

/// Produces the entry map when the build starts.
#[async_trait]
pub trait EntryResolver: Send + Sync {
    async fn resolve(&self) -> Result<EntryMap>;
}

/// Where a compilation starts.
#[derive(Clone)]
pub enum EntrySpec {
    /// One path, bound as the `index` entry.
    Single(String),
    /// Named entries.
    Named(EntryMap),
    /// Resolved asynchronously at build time.
    Deferred(Arc<dyn EntryResolver>),
}

impl EntrySpec {
    pub fn single(path: impl Into<String>) -> Self {
        EntrySpec::Single(path.into())
    }

    pub fn named<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, EntryValue)>,
        K: Into<String>,
    {
        EntrySpec::Named(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn deferred(resolver: impl EntryResolver + 'static) -> Self {
        EntrySpec::Deferred(Arc::new(resolver))
    }

    /// Resolve to a concrete name → path(s) map.
    pub async fn resolve(&self) -> Result<EntryMap> {
        match self {
            EntrySpec::Single(path) => {
                let mut map = EntryMap::new();
                map.insert(
                    DEFAULT_ENTRY_NAME.to_string(),
                    EntryValue::Single(path.clone()),
                );
                Ok(map)
            }
            EntrySpec::Named(map) => Ok(map.clone()),
            EntrySpec::Deferred(resolver) => resolver.resolve().await,
        }
    }
}

impl fmt::Debug for EntrySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntrySpec::Single(path) => f.debug_tuple("Single").field(path).finish(),
            EntrySpec::Named(map) => f.debug_tuple("Named").field(map).finish(),
            EntrySpec::Deferred(_) => f.write_str("Deferred(<resolver>)"),
        }
    }
}

impl From<&EntryConfig> for EntrySpec {
    fn from(config: &EntryConfig) -> Self {
        match config {
            EntryConfig::Single(path) => EntrySpec::Single(path.clone()),
            EntryConfig::Named(entries) => EntrySpec::Named(
                entries
                    .iter()
                    .map(|(name, target)| {
                        let value = match target {
                            EntryTarget::Single(path) => EntryValue::Single(path.clone()),
                            EntryTarget::Multiple(paths) => EntryValue::Multi(paths.clone()),
                        };
                        (name.clone(), value)
                    })
                    .collect(),
            ),
        }
    }
}
