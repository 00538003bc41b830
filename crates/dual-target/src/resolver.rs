//! Normalization of declared targets into a [`NormalizedMatrix`].

use crate::error::{Result, TargetError};
use crate::matrix::{BrowserTargets, NormalizedMatrix};
use crate::version::EngineVersion;

/// Query used when a project declares no targets at all.
///
/// Mixes legacy and modern engines, so an unconfigured project gets both passes.
pub const DEFAULT_QUERY: &str =
    "chrome 79, edge 18, firefox 68, ie 11, ios_saf 12.2, opera 64, safari 12.1";

/// Turns a declared matrix into engine minimum versions.
pub trait MatrixResolver: Send + Sync {
    fn resolve(&self, targets: &BrowserTargets) -> Result<NormalizedMatrix>;
}

/// Resolver for explicit version queries.
///
/// Understands comma- or `or`-separated clauses of the form `engine version`,
/// `engine >= version` and `engine > version`, the keyword `defaults`, and
/// engine maps. Anything needing usage statistics (`last 2 versions`, `> 1%`)
/// is rejected with [`TargetError::UnsupportedQuery`].
#[derive(Debug, Clone)]
pub struct QueryResolver {
    defaults: String,
}

impl QueryResolver {
    pub fn new() -> Self {
        Self {
            defaults: DEFAULT_QUERY.to_string(),
        }
    }

    /// Replace the query used for empty declarations and `defaults`.
    pub fn with_defaults(mut self, query: impl Into<String>) -> Self {
        self.defaults = query.into();
        self
    }

    fn resolve_query(&self, query: &str, matrix: &mut NormalizedMatrix) -> Result<()> {
        let query = query.trim();
        if query.is_empty() {
            return self.resolve_defaults(matrix);
        }

        for clause in split_clauses(query) {
            if clause.eq_ignore_ascii_case("defaults") {
                self.resolve_defaults(matrix)?;
                continue;
            }
            let (engine, version) = parse_clause(clause)?;
            matrix.insert(engine, version);
        }
        Ok(())
    }

    fn resolve_defaults(&self, matrix: &mut NormalizedMatrix) -> Result<()> {
        for clause in split_clauses(&self.defaults) {
            let (engine, version) = parse_clause(clause)?;
            matrix.insert(engine, version);
        }
        Ok(())
    }
}

impl Default for QueryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixResolver for QueryResolver {
    fn resolve(&self, targets: &BrowserTargets) -> Result<NormalizedMatrix> {
        let mut matrix = NormalizedMatrix::new();
        match targets {
            BrowserTargets::Query(query) => self.resolve_query(query, &mut matrix)?,
            BrowserTargets::Queries(_) if targets.is_empty() => {
                self.resolve_defaults(&mut matrix)?;
            }
            BrowserTargets::Queries(queries) => {
                for query in queries.iter().filter(|q| !q.trim().is_empty()) {
                    self.resolve_query(query, &mut matrix)?;
                }
            }
            BrowserTargets::Engines(engines) => {
                for (engine, version) in engines {
                    let parsed = version
                        .parse::<EngineVersion>()
                        .map_err(|_| TargetError::InvalidVersion {
                            engine: engine.clone(),
                            version: version.clone(),
                        })?;
                    matrix.insert(canonical_engine(engine), parsed);
                }
            }
        }
        tracing::debug!(engines = matrix.len(), "normalized browser matrix");
        Ok(matrix)
    }
}

fn split_clauses(query: &str) -> impl Iterator<Item = &str> {
    query
        .split(',')
        .flat_map(|part| part.split(" or "))
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
}

fn parse_clause(clause: &str) -> Result<(String, EngineVersion)> {
    let unsupported = || TargetError::UnsupportedQuery(clause.to_string());
    let mut tokens = clause.split_whitespace();

    let engine = tokens.next().ok_or_else(unsupported)?;
    let (op, version) = match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(op @ (">=" | ">")), Some(version), None) => (op, version),
        (Some(version), None, None) => ("=", version),
        _ => return Err(unsupported()),
    };

    if !engine.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(unsupported());
    }

    let version: EngineVersion = version.parse().map_err(|_| TargetError::InvalidVersion {
        engine: engine.to_string(),
        version: version.to_string(),
    })?;

    // `> v` means anything newer; the smallest newer patch stands in for it.
    let version = if op == ">" {
        EngineVersion::new(version.major, version.minor, version.patch.saturating_add(1))
    } else {
        version
    };

    Ok((canonical_engine(engine), version))
}

/// Map query aliases onto baseline engine names.
fn canonical_engine(engine: &str) -> String {
    let lower = engine.to_ascii_lowercase();
    match lower.as_str() {
        "ios_saf" | "ios_safari" => "ios".to_string(),
        "ff" => "firefox".to_string(),
        "explorer" => "ie".to_string(),
        "op" => "opera".to_string(),
        _ => lower,
    }
}
