//! Build artifacts and the primary/modern merge.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

/// One emitted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub source: Arc<[u8]>,
    pub minimized: bool,
}

impl Artifact {
    pub fn new(source: impl Into<Vec<u8>>) -> Self {
        Self {
            source: Arc::from(source.into()),
            minimized: false,
        }
    }

    pub fn minimized(mut self, minimized: bool) -> Self {
        self.minimized = minimized;
        self
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

/// A module that went into a chunk, with the transform cache identity it used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    pub path: String,
    pub cache_identifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: String,
    pub name: Option<String>,
    /// Emitted files, in emission order.
    pub files: Vec<String>,
    pub modules: Vec<ModuleRecord>,
}

/// The chunks an entry point loads, in load order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkGroup {
    pub name: String,
    pub chunks: Vec<String>,
}

/// Everything a compilation pass produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    pub assets: IndexMap<String, Artifact>,
    pub entrypoints: IndexMap<String, ChunkGroup>,
    pub chunks: Vec<Chunk>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunk_by_name(&self, name: &str) -> Option<&Chunk> {
        self.chunks
            .iter()
            .find(|chunk| chunk.name.as_deref() == Some(name))
    }

    /// Files an entry point loads, in order.
    pub fn entry_files(&self, entry: &str) -> Vec<&str> {
        let Some(group) = self.entrypoints.get(entry) else {
            return Vec::new();
        };
        group
            .chunks
            .iter()
            .filter_map(|id| self.chunks.iter().find(|chunk| &chunk.id == id))
            .flat_map(|chunk| chunk.files.iter().map(String::as_str))
            .collect()
    }
}

/// What a merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub assets_added: usize,
    pub entrypoints_added: usize,
    pub files_appended: usize,
    /// Secondary chunks with no same-named primary chunk. They are not merged.
    pub orphan_chunks: usize,
}

impl MergeReport {
    pub fn is_noop(&self) -> bool {
        self.assets_added == 0 && self.entrypoints_added == 0 && self.files_appended == 0
    }
}

/// Fold the modern pass's artifacts into the primary's.
///
/// The primary always wins: assets and entry points are only added under names
/// the primary lacks, and a primary chunk only gains the secondary files it does
/// not already list. Nothing in the primary is removed or reordered, so merging
/// the same secondary set twice changes nothing the second time.
pub fn merge(primary: &mut ArtifactSet, secondary: &ArtifactSet) -> MergeReport {
    let mut report = MergeReport::default();

    for (name, asset) in &secondary.assets {
        if !primary.assets.contains_key(name) {
            primary.assets.insert(name.clone(), asset.clone());
            report.assets_added += 1;
        }
    }

    for (name, group) in &secondary.entrypoints {
        if !primary.entrypoints.contains_key(name) {
            primary.entrypoints.insert(name.clone(), group.clone());
            report.entrypoints_added += 1;
        }
    }

    let secondary_files: HashMap<&str, &[String]> = secondary
        .chunks
        .iter()
        .filter_map(|chunk| Some((chunk.name.as_deref()?, chunk.files.as_slice())))
        .collect();

    for chunk in &mut primary.chunks {
        let Some(files) = chunk.name.as_deref().and_then(|name| secondary_files.get(name)) else {
            continue;
        };
        for file in files.iter() {
            if !chunk.files.contains(file) {
                chunk.files.push(file.clone());
                report.files_appended += 1;
            }
        }
    }

    report.orphan_chunks = secondary
        .chunks
        .iter()
        .filter(|chunk| {
            chunk.name.as_deref().is_none_or(|name| {
                !primary
                    .chunks
                    .iter()
                    .any(|p| p.name.as_deref() == Some(name))
            })
        })
        .count();

    if report.orphan_chunks > 0 {
        tracing::debug!(
            orphans = report.orphan_chunks,
            "dropping modern chunks without a primary counterpart"
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, name: &str, files: &[&str]) -> Chunk {
        Chunk {
            id: id.to_string(),
            name: Some(name.to_string()),
            files: files.iter().map(|f| f.to_string()).collect(),
            modules: Vec::new(),
        }
    }

    fn set(chunks: Vec<Chunk>) -> ArtifactSet {
        let mut set = ArtifactSet::new();
        for c in &chunks {
            for file in &c.files {
                set.assets.insert(file.clone(), Artifact::new(file.as_bytes().to_vec()));
            }
            if let Some(name) = &c.name {
                set.entrypoints.insert(
                    name.clone(),
                    ChunkGroup {
                        name: name.clone(),
                        chunks: vec![c.id.clone()],
                    },
                );
            }
        }
        set.chunks = chunks;
        set
    }

    #[test]
    fn primary_wins_on_asset_collision() {
        let mut primary = ArtifactSet::new();
        primary.assets.insert("a.js".into(), Artifact::new("primary"));
        let mut secondary = ArtifactSet::new();
        secondary.assets.insert("a.js".into(), Artifact::new("secondary"));
        secondary.assets.insert("b.js".into(), Artifact::new("b"));

        let report = merge(&mut primary, &secondary);
        assert_eq!(&*primary.assets["a.js"].source, b"primary");
        assert_eq!(report.assets_added, 1);
    }

    #[test]
    fn appends_new_files_to_matching_chunks() {
        let mut primary = set(vec![chunk("0", "main", &["main.js"])]);
        let secondary = set(vec![chunk("0", "main", &["main.js", "main.es6.js"])]);

        let report = merge(&mut primary, &secondary);
        assert_eq!(primary.chunks[0].files, ["main.js", "main.es6.js"]);
        assert_eq!(report.files_appended, 1);
        assert_eq!(primary.entry_files("main"), ["main.js", "main.es6.js"]);
    }

    #[test]
    fn secondary_only_chunks_are_counted_and_dropped() {
        let mut primary = set(vec![chunk("0", "main", &["main.js"])]);
        let secondary = set(vec![
            chunk("0", "main", &["main.es6.js"]),
            chunk("1", "polyfill-free", &["1.es6.js"]),
        ]);

        let report = merge(&mut primary, &secondary);
        assert_eq!(report.orphan_chunks, 1);
        assert_eq!(primary.chunks.len(), 1);
        assert!(primary.chunk_by_name("polyfill-free").is_none());
        // The orphan's assets and entry point still follow the by-name rules.
        assert!(primary.assets.contains_key("1.es6.js"));
    }

    #[test]
    fn second_merge_is_a_noop() {
        let mut primary = set(vec![chunk("0", "main", &["main.js"])]);
        let secondary = set(vec![chunk("0", "main", &["main.es6.js"])]);

        merge(&mut primary, &secondary);
        let once = primary.clone();
        let report = merge(&mut primary, &secondary);

        assert!(report.is_noop());
        assert_eq!(primary, once);
    }
}
