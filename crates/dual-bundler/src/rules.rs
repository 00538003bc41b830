//! Module rules and transform-loader discovery.

use std::path::Path;
use std::sync::LazyLock;

use parking_lot::Mutex;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Name of the loader that runs the transform pipeline.
pub const TRANSFORM_LOADER: &str = "dual-transform-loader";

/// Compiled rule patterns keyed by source. `None` records a pattern that
/// failed to compile so it is reported once.
static PATTERNS: LazyLock<Mutex<FxHashMap<String, Option<Regex>>>> =
    LazyLock::new(|| Mutex::new(FxHashMap::default()));

/// A loader reference with its options.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderSpec {
    pub loader: String,
    pub options: Map<String, Value>,
}

impl LoaderSpec {
    pub fn new(loader: impl Into<String>) -> Self {
        Self {
            loader: loader.into(),
            options: Map::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn is_transform_loader(&self) -> bool {
        self.loader.contains(TRANSFORM_LOADER)
    }
}

/// The `use` part of a rule: one loader or a chain.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleUse {
    Single(LoaderSpec),
    Many(Vec<LoaderSpec>),
}

/// Which loaders apply to which files.
///
/// A loader can be given through `uses` or directly on the rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleRule {
    /// Regex source matched against the module path.
    pub test: Option<String>,
    /// Regex source excluding module paths.
    pub exclude: Option<String>,
    pub uses: Option<RuleUse>,
    pub loader: Option<LoaderSpec>,
}

impl ModuleRule {
    pub fn new(test: impl Into<String>) -> Self {
        Self {
            test: Some(test.into()),
            ..Self::default()
        }
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude = Some(pattern.into());
        self
    }

    pub fn with_use(mut self, uses: RuleUse) -> Self {
        self.uses = Some(uses);
        self
    }

    pub fn with_loader(mut self, loader: LoaderSpec) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Whether this rule applies to `path`. Invalid patterns never match.
    pub fn matches(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        let test_ok = self
            .test
            .as_deref()
            .is_none_or(|pattern| pattern_matches(pattern, &path));
        let excluded = self
            .exclude
            .as_deref()
            .is_some_and(|pattern| pattern_matches(pattern, &path));
        test_ok && !excluded
    }

    /// Loaders of this rule, `uses` first.
    pub fn loaders(&self) -> impl Iterator<Item = &LoaderSpec> {
        let uses: Vec<&LoaderSpec> = match &self.uses {
            Some(RuleUse::Single(spec)) => vec![spec],
            Some(RuleUse::Many(specs)) => specs.iter().collect(),
            None => Vec::new(),
        };
        uses.into_iter().chain(self.loader.iter())
    }

    fn transform_loader_mut(&mut self) -> Option<&mut LoaderSpec> {
        let from_use = match &mut self.uses {
            Some(RuleUse::Single(spec)) => Some(spec).filter(|s| s.is_transform_loader()),
            Some(RuleUse::Many(specs)) => specs.iter_mut().find(|s| s.is_transform_loader()),
            None => None,
        };
        match from_use {
            Some(spec) => Some(spec),
            None => self.loader.as_mut().filter(|s| s.is_transform_loader()),
        }
    }
}

fn compiled(pattern: &str) -> Option<Regex> {
    let mut cache = PATTERNS.lock();
    if let Some(entry) = cache.get(pattern) {
        return entry.clone();
    }
    let entry = match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::debug!(%pattern, error = %err, "ignoring invalid rule pattern");
            None
        }
    };
    cache.insert(pattern.to_string(), entry.clone());
    entry
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    compiled(pattern).is_some_and(|re| re.is_match(path))
}

/// Find the transform loader among `rules`.
///
/// Rules are searched in order; within a rule `uses` is searched before a
/// loader set directly on the rule.
pub fn find_transform_loader_mut(rules: &mut [ModuleRule]) -> Result<&mut LoaderSpec> {
    let searched = rules.len();
    rules
        .iter_mut()
        .find_map(ModuleRule::transform_loader_mut)
        .ok_or_else(|| {
            Error::PluginDiscovery(format!(
                "no module rule uses '{TRANSFORM_LOADER}' ({searched} rules searched)"
            ))
        })
}

/// The transform loader that applies to `path`, if any.
pub fn transform_loader_for<'a>(rules: &'a [ModuleRule], path: &Path) -> Option<&'a LoaderSpec> {
    rules
        .iter()
        .filter(|rule| rule.matches(path))
        .flat_map(ModuleRule::loaders)
        .find(|spec| spec.is_transform_loader())
}
