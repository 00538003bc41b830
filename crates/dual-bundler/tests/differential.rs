//! End-to-end behavior of the modern pass.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dual_bundler::engine::RUNTIME_BOOTSTRAP;
use dual_bundler::{
    ArtifactSet, Bindings, Compiler, CompilerOptions, DifferentialOptions, DifferentialPlugin,
    Engine, EntryMap, EntryResolver, EntrySpec, EntryValue, Error, FilenameTemplate, FlatEngine,
    LoaderSpec, MemoryRuntime, ModuleRule, OptimizationOptions, OutputOptions, PassState, Plugin,
    PluginId, Result, RuntimeChunk, TRANSFORM_LOADER, UnboundCompiler, WhitespaceMinimizer,
};

fn fs() -> Arc<MemoryRuntime> {
    Arc::new(
        MemoryRuntime::new("/app")
            .with_file("a.js", "// entry\nconsole.log('a');")
            .with_file("b.js", "console.log('b');"),
    )
}

fn transform_rule() -> ModuleRule {
    ModuleRule::new(r"\.js$").with_loader(
        LoaderSpec::new(TRANSFORM_LOADER)
            .with_option("cwd", "/app")
            .with_option("hasModern", true),
    )
}

fn main_entry() -> EntrySpec {
    EntrySpec::named([("main", EntryValue::Single("a.js".into()))])
}

fn bind(options: CompilerOptions, fs: Arc<MemoryRuntime>) -> Compiler {
    UnboundCompiler::new(options).bind(Bindings::shared(fs), Arc::new(FlatEngine::new()))
}

fn text(set: &ArtifactSet, name: &str) -> String {
    String::from_utf8_lossy(&set.assets[name].source).into_owned()
}

/// Counts how often it is applied.
#[derive(Default)]
struct CountingPlugin {
    applied: AtomicUsize,
}

impl CountingPlugin {
    const ID: PluginId = PluginId::new("counting");
}

impl Plugin for CountingPlugin {
    fn id(&self) -> PluginId {
        Self::ID
    }

    fn apply(&self, _compiler: &mut Compiler) -> Result<()> {
        self.applied.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fails when applied to the modern compiler.
struct ModernOnlyFailure;

impl Plugin for ModernOnlyFailure {
    fn id(&self) -> PluginId {
        PluginId::new("modern-only-failure")
    }

    fn apply(&self, compiler: &mut Compiler) -> Result<()> {
        if compiler.name() == "modern" {
            return Err(Error::Engine("refusing modern compiler".into()));
        }
        Ok(())
    }
}

#[tokio::test]
async fn merges_modern_files_into_primary_chunks() {
    let fs = fs();
    let plugin = DifferentialPlugin::default();
    let tracker = plugin.tracker();
    let options = CompilerOptions::new("/app", main_entry())
        .rule(transform_rule())
        .plugin(Arc::new(plugin));

    let mut compiler = bind(options, Arc::clone(&fs));
    compiler.activate().unwrap();
    let compilation = compiler.run().await.unwrap();
    let artifacts = &compilation.artifacts;

    assert!(!compilation.is_degraded(), "{:?}", compilation.errors);
    assert_eq!(
        artifacts.chunk_by_name("main").unwrap().files,
        ["main.js", "main.es6.js"]
    );
    assert_eq!(artifacts.entry_files("main"), ["main.js", "main.es6.js"]);
    assert!(text(artifacts, "main.js").starts_with(RUNTIME_BOOTSTRAP));
    assert!(!text(artifacts, "main.es6.js").contains(RUNTIME_BOOTSTRAP));

    assert_eq!(tracker.state(), PassState::Done);
    assert_eq!(
        tracker.history(),
        [
            PassState::SecondaryContextCreated,
            PassState::PluginsReapplied,
            PassState::EntriesBound,
            PassState::Running,
            PassState::ArtifactsMerged,
            PassState::Done,
        ]
    );

    let written = compiler.emit(artifacts).await.unwrap();
    assert_eq!(written, 2);
    assert!(fs.get("/app/dist/main.es6.js").is_some());
}

#[tokio::test]
async fn missing_transform_loader_degrades_but_keeps_legacy_output() {
    let plugin = DifferentialPlugin::default();
    let tracker = plugin.tracker();
    let options = CompilerOptions::new("/app", main_entry()).plugin(Arc::new(plugin));

    let mut compiler = bind(options, fs());
    compiler.activate().unwrap();
    let compilation = compiler.run().await.unwrap();

    assert!(compilation.is_degraded());
    assert!(matches!(
        &compilation.errors[0],
        Error::SecondaryCompilation(inner) if matches!(**inner, Error::PluginDiscovery(_))
    ));
    assert_eq!(
        compilation.artifacts.chunk_by_name("main").unwrap().files,
        ["main.js"]
    );
    assert!(!compilation.artifacts.assets.contains_key("main.es6.js"));
    assert_eq!(tracker.state(), PassState::Failed);
}

#[tokio::test]
async fn failing_plugin_on_modern_compiler_is_isolated() {
    let plugin = DifferentialPlugin::default();
    let tracker = plugin.tracker();
    let options = CompilerOptions::new("/app", main_entry())
        .rule(transform_rule())
        .plugin(Arc::new(ModernOnlyFailure))
        .plugin(Arc::new(plugin));

    let mut compiler = bind(options, fs());
    compiler.activate().unwrap();
    let compilation = compiler.run().await.unwrap();

    assert_eq!(compilation.errors.len(), 1);
    assert!(matches!(compilation.errors[0], Error::SecondaryCompilation(_)));
    assert!(compilation.artifacts.assets.contains_key("main.js"));
    assert_eq!(
        tracker.history(),
        [PassState::SecondaryContextCreated, PassState::Failed]
    );
}

#[tokio::test]
async fn excluded_plugins_are_not_reapplied() {
    let counting = Arc::new(CountingPlugin::default());
    let excluded = Arc::new(CountingPlugin::default());

    struct Renamed(Arc<CountingPlugin>);
    impl Plugin for Renamed {
        fn id(&self) -> PluginId {
            PluginId::new("analyzer")
        }
        fn apply(&self, compiler: &mut Compiler) -> Result<()> {
            self.0.apply(compiler)
        }
    }

    let differential =
        DifferentialPlugin::new(DifferentialOptions::default().exclude(PluginId::new("analyzer")));
    let options = CompilerOptions::new("/app", main_entry())
        .rule(transform_rule())
        .plugin(counting.clone())
        .plugin(Arc::new(Renamed(excluded.clone())))
        .plugin(Arc::new(differential));

    let mut compiler = bind(options, fs());
    compiler.activate().unwrap();
    let compilation = compiler.run().await.unwrap();

    assert!(!compilation.is_degraded());
    assert_eq!(counting.applied.load(Ordering::SeqCst), 2);
    assert_eq!(excluded.applied.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn additional_plugins_apply_to_modern_compiler_only() {
    let extra = Arc::new(CountingPlugin::default());
    let differential =
        DifferentialPlugin::new(DifferentialOptions::default().additional_plugin(extra.clone()));
    let options = CompilerOptions::new("/app", main_entry())
        .rule(transform_rule())
        .plugin(Arc::new(differential));

    let mut compiler = bind(options, fs());
    compiler.activate().unwrap();
    compiler.run().await.unwrap();

    assert_eq!(extra.applied.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn deferred_entries_are_resolved_for_both_passes() {
    struct Counted(Arc<AtomicUsize>);

    #[async_trait]
    impl EntryResolver for Counted {
        async fn resolve(&self) -> Result<EntryMap> {
            self.0.fetch_add(1, Ordering::SeqCst);
            let mut entries = EntryMap::new();
            entries.insert("main".into(), EntryValue::Single("a.js".into()));
            entries.insert("other".into(), EntryValue::Single("b.js".into()));
            Ok(entries)
        }
    }

    let calls = Arc::new(AtomicUsize::new(0));
    let options = CompilerOptions::new("/app", EntrySpec::deferred(Counted(calls.clone())))
        .rule(transform_rule())
        .plugin(Arc::new(DifferentialPlugin::default()));

    let mut compiler = bind(options, fs());
    compiler.activate().unwrap();
    let compilation = compiler.run().await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(compilation.artifacts.entry_files("other"), ["other.js", "other.es6.js"]);
}

#[tokio::test]
async fn derived_templates_follow_primary_templates() {
    let differential = DifferentialPlugin::new(
        DifferentialOptions::default()
            .filename(FilenameTemplate::derive(|primary| primary.replace(".js", ".modern.js"))),
    );
    let options = CompilerOptions::new("/app", main_entry())
        .output(OutputOptions::default().filename("[name].bundle.js"))
        .rule(transform_rule())
        .plugin(Arc::new(differential));

    let mut compiler = bind(options, fs());
    compiler.activate().unwrap();
    let compilation = compiler.run().await.unwrap();

    assert_eq!(
        compilation.artifacts.chunk_by_name("main").unwrap().files,
        ["main.bundle.js", "main.bundle.modern.js"]
    );
}

#[tokio::test]
async fn modern_pass_copies_runtime_chunk_and_minimizers() {
    let optimization = OptimizationOptions {
        minimize: true,
        minimizers: vec![Arc::new(WhitespaceMinimizer)],
        runtime_chunk: Some(RuntimeChunk::Single),
        ..OptimizationOptions::default()
    };
    let options = CompilerOptions::new("/app", main_entry())
        .optimization(optimization)
        .rule(transform_rule())
        .plugin(Arc::new(DifferentialPlugin::default()));

    let mut compiler = bind(options, fs());
    compiler.activate().unwrap();
    let compilation = compiler.run().await.unwrap();
    let artifacts = &compilation.artifacts;

    assert_eq!(artifacts.chunk_by_name("runtime").unwrap().files.len(), 2);
    assert!(artifacts.assets["main.es6.js"].minimized);
    assert!(!text(artifacts, "main.es6.js").contains("// entry"));
}

#[tokio::test]
async fn abort_cancels_both_passes() {
    struct AbortOnModern(FlatEngine);

    #[async_trait]
    impl Engine for AbortOnModern {
        async fn compile(&self, compiler: &Compiler) -> Result<ArtifactSet> {
            if compiler.name() == "modern" {
                compiler.abort_handle().abort();
                futures::future::pending::<()>().await;
            }
            self.0.compile(compiler).await
        }
    }

    let plugin = DifferentialPlugin::default();
    let tracker = plugin.tracker();
    let options = CompilerOptions::new("/app", main_entry())
        .rule(transform_rule())
        .plugin(Arc::new(plugin));
    let mut compiler = UnboundCompiler::new(options).bind(
        Bindings::shared(fs()),
        Arc::new(AbortOnModern(FlatEngine::new())),
    );
    compiler.activate().unwrap();

    let err = compiler.run().await.unwrap_err();
    assert!(matches!(err, Error::Aborted));
    assert_eq!(tracker.state(), PassState::Failed);
}
