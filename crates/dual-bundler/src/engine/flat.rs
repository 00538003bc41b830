//! Concatenating engine.
//!
//! Every entry becomes one chunk holding its modules in order. Runtime and
//! shared chunks are split off when the compiler carries those policies, and
//! installed minimizers run over every chunk before it is named.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

use super::Engine;
use crate::Result;
use crate::artifact::{Artifact, ArtifactSet, Chunk, ChunkGroup, ModuleRecord};
use crate::compiler::{ChunkFormat, Compiler};
use crate::optimization::SplitChunksOptions;
use crate::output::render_template;
use crate::rules::transform_loader_for;
use crate::transform::{ConfigSession, TransformConfigurator, TransformLoaderOptions, TransformRequest};

/// Chunk-loading bootstrap carried by runtime chunks, or inlined into entry
/// chunks when there is no runtime chunk.
pub const RUNTIME_BOOTSTRAP: &str = "var __dual_modules__ = __dual_modules__ || {};\n";

#[derive(Debug, Clone)]
pub struct FlatEngine {
    configurator: Arc<TransformConfigurator>,
    session: Arc<ConfigSession>,
}

impl Default for FlatEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatEngine {
    pub fn new() -> Self {
        Self::with_transform(
            Arc::new(TransformConfigurator::new()),
            Arc::new(ConfigSession::new()),
        )
    }

    /// Share a configurator and session, e.g. between a primary and a modern pass.
    pub fn with_transform(
        configurator: Arc<TransformConfigurator>,
        session: Arc<ConfigSession>,
    ) -> Self {
        Self {
            configurator,
            session,
        }
    }

    pub fn session(&self) -> &Arc<ConfigSession> {
        &self.session
    }

    async fn load_module(&self, compiler: &Compiler, path: &Path) -> Result<LoadedModule> {
        let absolute = compiler.resolve(path);
        let bytes = compiler.input_fs().read_file(&absolute).await?;
        let source = String::from_utf8_lossy(&bytes).into_owned();

        let cache_identifier = match transform_loader_for(compiler.module_rules(), &absolute) {
            Some(loader) => {
                let options = TransformLoaderOptions::from_options(&loader.options)?;
                let plan = self.configurator.configure(
                    &self.session,
                    TransformRequest {
                        filename: &absolute,
                        source: &source,
                        options: &options,
                    },
                )?;
                plan.cache_identifier().map(str::to_string)
            }
            None => None,
        };

        let display = absolute
            .strip_prefix(compiler.context())
            .unwrap_or(&absolute)
            .to_string_lossy()
            .into_owned();

        Ok(LoadedModule {
            record: ModuleRecord {
                path: display,
                cache_identifier,
            },
            source,
        })
    }
}

#[async_trait]
impl Engine for FlatEngine {
    async fn compile(&self, compiler: &Compiler) -> Result<ArtifactSet> {
        let mut loaded: IndexMap<String, Vec<LoadedModule>> = IndexMap::new();
        for (name, entry) in compiler.entries() {
            compiler.abort_handle().check()?;
            let mut modules = Vec::with_capacity(entry.paths().len());
            for path in entry.paths() {
                modules.push(self.load_module(compiler, path).await?);
            }
            loaded.insert(name.clone(), modules);
        }

        let output = compiler.output();
        let shared = shared_modules(compiler.split_chunks(), &loaded);
        let mut builder = ChunkBuilder::new(compiler);

        let shared_id = match compiler.split_chunks() {
            Some(policy) if !shared.is_empty() => {
                let mut seen = FxHashSet::default();
                let modules: Vec<&LoadedModule> = loaded
                    .values()
                    .flatten()
                    .filter(|m| shared.contains(&m.record.path) && seen.insert(m.record.path.as_str()))
                    .collect();
                Some(builder.push_chunk(&policy.name, &output.chunk_filename, concat(&modules), records(&modules)))
            }
            _ => None,
        };

        let inline_bootstrap =
            compiler.chunk_format() == ChunkFormat::Runtime && compiler.runtime_chunk().is_none();
        let mut runtime_ids: FxHashMap<String, String> = FxHashMap::default();

        for (name, modules) in &loaded {
            let mut group = Vec::new();

            if let Some(policy) = compiler.runtime_chunk() {
                let runtime_name = policy.chunk_name(name);
                let id = match runtime_ids.get(&runtime_name) {
                    Some(id) => id.clone(),
                    None => {
                        let id = builder.push_chunk(
                            &runtime_name,
                            &output.chunk_filename,
                            RUNTIME_BOOTSTRAP.to_string(),
                            Vec::new(),
                        );
                        runtime_ids.insert(runtime_name, id.clone());
                        id
                    }
                };
                group.push(id);
            }

            let (shared_here, own): (Vec<&LoadedModule>, Vec<&LoadedModule>) =
                modules.iter().partition(|m| shared.contains(&m.record.path));
            if let Some(id) = shared_id.as_ref().filter(|_| !shared_here.is_empty()) {
                group.push(id.clone());
            }

            let mut code = String::new();
            if inline_bootstrap {
                code.push_str(RUNTIME_BOOTSTRAP);
            }
            code.push_str(&concat(&own));
            group.push(builder.push_chunk(name, &output.filename, code, records(&own)));

            builder.set.entrypoints.insert(
                name.clone(),
                ChunkGroup {
                    name: name.clone(),
                    chunks: group,
                },
            );
        }

        tracing::debug!(
            compiler = %compiler.name(),
            chunks = builder.set.chunks.len(),
            shared = shared.len(),
            "chunks built"
        );
        Ok(builder.set)
    }
}

struct LoadedModule {
    record: ModuleRecord,
    source: String,
}

fn concat(modules: &[&LoadedModule]) -> String {
    modules
        .iter()
        .map(|m| format!("// {}\n{}\n", m.record.path, m.source))
        .collect()
}

fn records(modules: &[&LoadedModule]) -> Vec<ModuleRecord> {
    modules.iter().map(|m| m.record.clone()).collect()
}

/// Modules bound by two or more entries and large enough to extract.
fn shared_modules(
    policy: Option<&SplitChunksOptions>,
    loaded: &IndexMap<String, Vec<LoadedModule>>,
) -> FxHashSet<String> {
    let Some(policy) = policy.filter(|p| p.chunks.includes_initial()) else {
        return FxHashSet::default();
    };

    let mut seen: FxHashMap<&str, (usize, usize)> = FxHashMap::default();
    for modules in loaded.values() {
        let mut in_entry = FxHashSet::default();
        for module in modules {
            if in_entry.insert(module.record.path.as_str()) {
                seen.entry(module.record.path.as_str())
                    .or_insert((0, module.source.len()))
                    .0 += 1;
            }
        }
    }

    seen.into_iter()
        .filter(|(_, (count, size))| *count >= 2 && *size >= policy.min_size)
        .map(|(path, _)| path.to_string())
        .collect()
}

struct ChunkBuilder<'a> {
    compiler: &'a Compiler,
    set: ArtifactSet,
    next_id: usize,
}

impl<'a> ChunkBuilder<'a> {
    fn new(compiler: &'a Compiler) -> Self {
        Self {
            compiler,
            set: ArtifactSet::new(),
            next_id: 0,
        }
    }

    /// Minify, name and record one chunk. Returns its id.
    fn push_chunk(
        &mut self,
        name: &str,
        template: &str,
        code: String,
        modules: Vec<ModuleRecord>,
    ) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;

        let minimizers = self.compiler.minimizers();
        let minimized = !minimizers.is_empty();
        let code = minimizers.iter().fold(code, |code, m| m.minify(&code));

        let file = render_template(template, name, &id, code.as_bytes());
        self.set
            .assets
            .insert(file.clone(), Artifact::new(code).minimized(minimized));
        self.set.chunks.push(Chunk {
            id: id.clone(),
            name: Some(name.to_string()),
            files: vec![file],
            modules,
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{Bindings, CompilerOptions, UnboundCompiler};
    use crate::entry::{EntrySpec, EntryValue};
    use crate::optimization::{ChunksFilter, OptimizationOptions, RuntimeChunk, WhitespaceMinimizer};
    use crate::rules::{LoaderSpec, ModuleRule, TRANSFORM_LOADER};
    use crate::runtime::MemoryRuntime;
    use crate::Error;

    fn fs() -> Arc<MemoryRuntime> {
        Arc::new(
            MemoryRuntime::new("/app")
                .with_file("a.js", "console.log('a');")
                .with_file("b.js", "console.log('b');")
                .with_file("lib.js", "export const lib = 1;"),
        )
    }

    async fn build(options: CompilerOptions) -> Result<ArtifactSet> {
        let mut compiler =
            UnboundCompiler::new(options).bind(Bindings::shared(fs()), Arc::new(FlatEngine::new()));
        compiler.activate()?;
        Ok(compiler.run().await?.artifacts)
    }

    fn two_entries() -> EntrySpec {
        EntrySpec::named([
            ("a", EntryValue::Multi(vec!["lib.js".into(), "a.js".into()])),
            ("b", EntryValue::Multi(vec!["lib.js".into(), "b.js".into()])),
        ])
    }

    #[tokio::test]
    async fn entry_chunks_inline_bootstrap_by_default() {
        let set = build(CompilerOptions::new("/app", EntrySpec::single("a.js")))
            .await
            .unwrap();
        let source = String::from_utf8_lossy(&set.assets["index.js"].source).into_owned();
        assert!(source.starts_with(RUNTIME_BOOTSTRAP));
        assert!(source.contains("console.log('a');"));
        assert_eq!(set.entry_files("index"), ["index.js"]);
    }

    #[tokio::test]
    async fn runtime_chunk_is_shared_and_loaded_first() {
        let optimization = OptimizationOptions {
            runtime_chunk: Some(RuntimeChunk::Single),
            ..OptimizationOptions::default()
        };
        let set = build(CompilerOptions::new("/app", two_entries()).optimization(optimization))
            .await
            .unwrap();

        let runtime = set.chunk_by_name("runtime").unwrap();
        assert_eq!(set.entrypoints["a"].chunks[0], runtime.id);
        assert_eq!(set.entrypoints["b"].chunks[0], runtime.id);
        let a = String::from_utf8_lossy(&set.assets["a.js"].source).into_owned();
        assert!(!a.contains(RUNTIME_BOOTSTRAP));
    }

    #[tokio::test]
    async fn split_chunks_extracts_modules_shared_by_entries() {
        let optimization = OptimizationOptions {
            split_chunks: Some(SplitChunksOptions {
                chunks: ChunksFilter::All,
                min_size: 0,
                ..SplitChunksOptions::default()
            }),
            ..OptimizationOptions::default()
        };
        let set = build(CompilerOptions::new("/app", two_entries()).optimization(optimization))
            .await
            .unwrap();

        let shared = set.chunk_by_name("shared").unwrap();
        assert_eq!(shared.modules.len(), 1);
        assert_eq!(shared.modules[0].path, "lib.js");
        assert_eq!(set.entrypoints["a"].chunks.len(), 2);
        assert_eq!(set.chunk_by_name("a").unwrap().modules.len(), 1);
    }

    #[tokio::test]
    async fn async_only_split_policy_leaves_entries_alone() {
        let optimization = OptimizationOptions {
            split_chunks: Some(SplitChunksOptions {
                min_size: 0,
                ..SplitChunksOptions::default()
            }),
            ..OptimizationOptions::default()
        };
        let set = build(CompilerOptions::new("/app", two_entries()).optimization(optimization))
            .await
            .unwrap();
        assert!(set.chunk_by_name("shared").is_none());
    }

    #[tokio::test]
    async fn minimizers_run_when_installed() {
        let optimization = OptimizationOptions {
            minimize: true,
            minimizers: vec![Arc::new(WhitespaceMinimizer)],
            ..OptimizationOptions::default()
        };
        let set = build(CompilerOptions::new("/app", EntrySpec::single("a.js")).optimization(optimization))
            .await
            .unwrap();
        let asset = &set.assets["index.js"];
        assert!(asset.minimized);
        assert!(!String::from_utf8_lossy(&asset.source).contains("// a.js"));
    }

    #[tokio::test]
    async fn transform_loader_stamps_cache_identity() {
        let loader = LoaderSpec::new(TRANSFORM_LOADER).with_option("cwd", "/app");
        let options = CompilerOptions::new("/app", EntrySpec::single("a.js"))
            .rule(ModuleRule::new(r"\.js$").with_loader(loader));
        let set = build(options).await.unwrap();

        let module = &set.chunk_by_name("index").unwrap().modules[0];
        let id = module.cache_identifier.as_deref().unwrap();
        assert!(id.starts_with("dual-transform-1-"));
    }

    #[tokio::test]
    async fn missing_entry_file_is_a_filesystem_error() {
        let err = build(CompilerOptions::new("/app", EntrySpec::single("missing.js")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileSystem(_)));
    }
}
