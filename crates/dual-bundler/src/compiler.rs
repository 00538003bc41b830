//! Compilers and compilations.
//!
//! A compiler goes through two explicit phases. [`UnboundCompiler`] holds
//! options only; [`UnboundCompiler::bind`] attaches the filesystems and the
//! engine and yields a [`Compiler`]. Plugins are applied to a bound compiler,
//! either all at once through [`Compiler::activate`] or one by one by a caller
//! that needs control over the order (the modern pass does this).

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::{AbortHandle, AbortRegistration};
use indexmap::IndexMap;
use parking_lot::Mutex;
use path_clean::PathClean;

use crate::artifact::ArtifactSet;
use crate::builtins::{EntryPlugin, RuntimeChunkPlugin, SplitChunksPlugin};
use crate::engine::Engine;
use crate::entry::EntrySpec;
use crate::optimization::{Minimizer, OptimizationOptions, RuntimeChunk, SplitChunksOptions};
use crate::output::OutputOptions;
use crate::plugin::{FinalizeTask, MakeHook, Plugin};
use crate::rules::ModuleRule;
use crate::runtime::Runtime;
use crate::{Error, Result};

/// Everything a compiler is configured with before it is bound.
#[derive(Clone)]
pub struct CompilerOptions {
    /// Label used in logs, e.g. `client` or `modern`.
    pub name: String,
    /// Directory relative entry and output paths resolve against.
    pub context: PathBuf,
    pub entry: EntrySpec,
    pub output: OutputOptions,
    pub optimization: OptimizationOptions,
    pub module_rules: Vec<ModuleRule>,
    pub plugins: Vec<Arc<dyn Plugin>>,
}

impl CompilerOptions {
    pub fn new(context: impl Into<PathBuf>, entry: EntrySpec) -> Self {
        Self {
            name: "client".to_string(),
            context: context.into(),
            entry,
            output: OutputOptions::default(),
            optimization: OptimizationOptions::default(),
            module_rules: Vec::new(),
            plugins: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn output(mut self, output: OutputOptions) -> Self {
        self.output = output;
        self
    }

    pub fn optimization(mut self, optimization: OptimizationOptions) -> Self {
        self.optimization = optimization;
        self
    }

    pub fn rule(mut self, rule: ModuleRule) -> Self {
        self.module_rules.push(rule);
        self
    }

    pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }
}

impl fmt::Debug for CompilerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerOptions")
            .field("name", &self.name)
            .field("context", &self.context)
            .field("entry", &self.entry)
            .field("output", &self.output)
            .field("optimization", &self.optimization)
            .field("module_rules", &self.module_rules)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.id()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Input and output filesystems of a compiler.
#[derive(Debug, Clone)]
pub struct Bindings {
    pub input_fs: Arc<dyn Runtime>,
    pub output_fs: Arc<dyn Runtime>,
}

impl Bindings {
    pub fn new(input_fs: Arc<dyn Runtime>, output_fs: Arc<dyn Runtime>) -> Self {
        Self {
            input_fs,
            output_fs,
        }
    }

    /// Read and write through the same runtime.
    pub fn shared<R: Runtime + 'static>(fs: Arc<R>) -> Self {
        let fs: Arc<dyn Runtime> = fs;
        Self {
            input_fs: Arc::clone(&fs),
            output_fs: fs,
        }
    }
}

/// Host-side cancellation shared by a primary build and its modern pass.
#[derive(Debug, Clone, Default)]
pub struct BuildAbort {
    inner: Arc<AbortInner>,
}

#[derive(Debug, Default)]
struct AbortInner {
    aborted: AtomicBool,
    handles: Mutex<Vec<AbortHandle>>,
}

impl BuildAbort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the build. In-flight work registered through
    /// [`registration`](Self::registration) stops at its next await point.
    pub fn abort(&self) {
        if !self.inner.aborted.swap(true, Ordering::SeqCst) {
            tracing::info!("build aborted");
        }
        for handle in self.inner.handles.lock().drain(..) {
            handle.abort();
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.load(Ordering::SeqCst)
    }

    /// Registration for a [`futures::future::Abortable`] tied to this build.
    pub fn registration(&self) -> AbortRegistration {
        let (handle, registration) = AbortHandle::new_pair();
        let mut handles = self.inner.handles.lock();
        if self.is_aborted() {
            handle.abort();
        } else {
            handles.push(handle);
        }
        registration
    }

    pub fn check(&self) -> Result<()> {
        if self.is_aborted() {
            Err(Error::Aborted)
        } else {
            Ok(())
        }
    }
}

/// How chunks are wrapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChunkFormat {
    /// Entry chunks carry the chunk-loading runtime bootstrap.
    #[default]
    Runtime,
    /// Chunks are plain files that load without a bootstrap.
    Flat,
}

/// An entry bound into a compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundEntry {
    Single(PathBuf),
    /// Several files bundled into one entry chunk, in order.
    Multi(Vec<PathBuf>),
}

impl BoundEntry {
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            BoundEntry::Single(path) => std::slice::from_ref(path),
            BoundEntry::Multi(paths) => paths,
        }
    }
}

/// A compiler that has options but no filesystems yet.
pub struct UnboundCompiler {
    options: CompilerOptions,
    abort: BuildAbort,
}

impl UnboundCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            abort: BuildAbort::new(),
        }
    }

    /// Share cancellation with another build.
    pub fn with_abort(mut self, abort: BuildAbort) -> Self {
        self.abort = abort;
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut CompilerOptions {
        &mut self.options
    }

    /// Attach filesystems and engine. No plugin has been applied yet.
    pub fn bind(self, bindings: Bindings, engine: Arc<dyn Engine>) -> Compiler {
        tracing::debug!(compiler = %self.options.name, "binding compiler");
        Compiler {
            options: self.options,
            bindings,
            engine,
            abort: self.abort,
            entries: IndexMap::new(),
            chunk_format: ChunkFormat::default(),
            split_chunks: None,
            runtime_chunk: None,
            minimizers: Vec::new(),
            make_hooks: Vec::new(),
            activated: false,
        }
    }
}

/// A bound compiler.
pub struct Compiler {
    options: CompilerOptions,
    bindings: Bindings,
    engine: Arc<dyn Engine>,
    abort: BuildAbort,
    entries: IndexMap<String, BoundEntry>,
    chunk_format: ChunkFormat,
    split_chunks: Option<SplitChunksOptions>,
    runtime_chunk: Option<RuntimeChunk>,
    minimizers: Vec<Arc<dyn Minimizer>>,
    make_hooks: Vec<Arc<dyn MakeHook>>,
    activated: bool,
}

impl Compiler {
    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn context(&self) -> &Path {
        &self.options.context
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn input_fs(&self) -> &Arc<dyn Runtime> {
        &self.bindings.input_fs
    }

    pub fn output_fs(&self) -> &Arc<dyn Runtime> {
        &self.bindings.output_fs
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    pub fn abort_handle(&self) -> &BuildAbort {
        &self.abort
    }

    pub fn output(&self) -> &OutputOptions {
        &self.options.output
    }

    /// Absolute output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.options.output.path)
    }

    /// Resolve a path against the compiler context.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf().clean()
        } else {
            self.options.context.join(path).clean()
        }
    }

    pub fn module_rules(&self) -> &[ModuleRule] {
        &self.options.module_rules
    }

    pub fn module_rules_mut(&mut self) -> &mut Vec<ModuleRule> {
        &mut self.options.module_rules
    }

    pub fn entries(&self) -> &IndexMap<String, BoundEntry> {
        &self.entries
    }

    pub fn add_entry(&mut self, name: impl Into<String>, entry: BoundEntry) {
        let name = name.into();
        if self.entries.insert(name.clone(), entry).is_some() {
            tracing::debug!(compiler = %self.options.name, entry = %name, "entry rebound");
        }
    }

    pub fn chunk_format(&self) -> ChunkFormat {
        self.chunk_format
    }

    pub fn set_chunk_format(&mut self, format: ChunkFormat) {
        self.chunk_format = format;
    }

    pub fn split_chunks(&self) -> Option<&SplitChunksOptions> {
        self.split_chunks.as_ref()
    }

    pub fn set_split_chunks(&mut self, options: SplitChunksOptions) {
        self.split_chunks = Some(options);
    }

    pub fn runtime_chunk(&self) -> Option<&RuntimeChunk> {
        self.runtime_chunk.as_ref()
    }

    pub fn set_runtime_chunk(&mut self, policy: RuntimeChunk) {
        self.runtime_chunk = Some(policy);
    }

    pub fn minimizers(&self) -> &[Arc<dyn Minimizer>] {
        &self.minimizers
    }

    /// Install a minimizer. A second minimizer with the same name is ignored.
    pub fn install_minimizer(&mut self, minimizer: Arc<dyn Minimizer>) {
        if self.minimizers.iter().any(|m| m.name() == minimizer.name()) {
            return;
        }
        self.minimizers.push(minimizer);
    }

    pub fn tap_make(&mut self, hook: Arc<dyn MakeHook>) {
        self.make_hooks.push(hook);
    }

    /// Apply the configured plugins, then the configured optimizations.
    ///
    /// Calling it twice is a no-op.
    pub fn activate(&mut self) -> Result<()> {
        if self.activated {
            return Ok(());
        }
        self.activated = true;

        let plugins = self.options.plugins.clone();
        for plugin in &plugins {
            tracing::trace!(compiler = %self.options.name, plugin = %plugin.id(), "applying plugin");
            plugin.apply(self)?;
        }

        let optimization = self.options.optimization.clone();
        if let Some(split) = optimization.split_chunks {
            SplitChunksPlugin::new(split).apply(self)?;
        }
        if let Some(runtime) = optimization.runtime_chunk {
            RuntimeChunkPlugin::new(runtime).apply(self)?;
        }
        if optimization.minimize {
            for minimizer in optimization.minimizers {
                minimizer.apply(self)?;
            }
        }
        Ok(())
    }

    /// Run a full compilation: make, engine, then finalize.
    pub async fn run(&mut self) -> Result<Compilation> {
        self.abort.check()?;

        if self.entries.is_empty() {
            let entries = self.options.entry.resolve().await?;
            EntryPlugin::apply_all(self, &entries)?;
        }
        if self.entries.is_empty() {
            return Err(Error::EntryResolution(format!(
                "compiler '{}' has no entries",
                self.options.name
            )));
        }

        let mut compilation = Compilation::new(self.options.name.clone());

        let hooks = self.make_hooks.clone();
        for hook in &hooks {
            hook.make(self, &mut compilation).await?;
        }

        self.abort.check()?;
        let engine = Arc::clone(&self.engine);
        compilation.artifacts = engine.compile(self).await?;

        for task in std::mem::take(&mut compilation.finalize_tasks) {
            task.finalize(&mut compilation).await;
        }
        self.abort.check()?;

        tracing::info!(
            compiler = %self.options.name,
            assets = compilation.artifacts.assets.len(),
            errors = compilation.errors.len(),
            "compilation finished"
        );
        Ok(compilation)
    }

    /// Write every asset into the output directory. Returns the number written.
    pub async fn emit(&self, artifacts: &ArtifactSet) -> Result<usize> {
        self.abort.check()?;
        let out_dir = self.output_dir();
        for (name, asset) in &artifacts.assets {
            self.bindings
                .output_fs
                .write_file(&out_dir.join(name), &asset.source)
                .await?;
        }
        tracing::debug!(dir = %out_dir.display(), count = artifacts.assets.len(), "emitted assets");
        Ok(artifacts.assets.len())
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("options", &self.options)
            .field("entries", &self.entries)
            .field("chunk_format", &self.chunk_format)
            .field("split_chunks", &self.split_chunks)
            .field("runtime_chunk", &self.runtime_chunk)
            .field("minimizers", &self.minimizers)
            .finish_non_exhaustive()
    }
}

/// The result of one compiler run.
pub struct Compilation {
    pub name: String,
    pub artifacts: ArtifactSet,
    /// Non-fatal errors. A non-empty list marks the build as degraded.
    pub errors: Vec<Error>,
    pub warnings: Vec<String>,
    finalize_tasks: Vec<Box<dyn FinalizeTask>>,
}

impl Compilation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artifacts: ArtifactSet::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            finalize_tasks: Vec::new(),
        }
    }

    /// Queue work that must complete before the compilation finishes.
    pub fn queue_finalize(&mut self, task: Box<dyn FinalizeTask>) {
        self.finalize_tasks.push(task);
    }

    pub fn is_degraded(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl fmt::Debug for Compilation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compilation")
            .field("name", &self.name)
            .field("artifacts", &self.artifacts)
            .field("errors", &self.errors)
            .field("warnings", &self.warnings)
            .field("pending_finalize", &self.finalize_tasks.len())
            .finish()
    }
}
