//! `dual build`: the primary build plus, when enabled, the modern pass.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use dual_bundler::{
    Bindings, CompilationAxis, Compiler, CompilerOptions, DifferentialOptions, DifferentialPlugin,
    EntrySpec, FlatEngine, LoaderSpec, ModuleRule, NativeRuntime, OptimizationOptions,
    OutputOptions, TRANSFORM_LOADER, TransformLoaderOptions, UnboundCompiler,
};
use dual_config::{DifferentialMode, DualConfig};

use crate::cli::BuildArgs;
use crate::commands::utils;
use crate::error::{self, Result};
use crate::ui;

/// Sources handed to the transform loader.
const SCRIPT_PATTERN: &str = r"\.(js|mjs|jsx)$";
const VENDOR_PATTERN: &str = "node_modules";

/// Execute the build command.
///
/// 1. Load dual.toml and apply the command-line overrides
/// 2. Decide whether the modern pass runs
/// 3. Run the primary build; the modern pass runs inside it
/// 4. Write the merged output and print a summary
///
/// A failed modern pass is reported as a warning. The command only fails when
/// the primary build does.
pub async fn execute(args: BuildArgs, quiet: bool) -> Result<()> {
    let start_time = Instant::now();
    let root = utils::project_root(&args.cwd)?;

    let mut config = DualConfig::load(&root)?;
    if let Some(mode) = args.differential {
        config.differential.enabled = mode.into();
    }
    if args.minify {
        config.optimization.minimize = true;
    }
    if let Some(out_dir) = &args.out_dir {
        config.build.out_dir = out_dir.clone();
    }

    let differential = differential_enabled(&root, config.differential.enabled);
    if !quiet {
        ui::info(&format!(
            "Modern pass: {}",
            if differential { "enabled" } else { "disabled" }
        ));
    }

    let mut compiler = compiler(&root, &config, differential);
    compiler.activate()?;

    let abort = compiler.abort_handle().clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; aborting build");
            abort.abort();
        }
    });

    let spinner = if quiet {
        ui::Spinner::hidden("Building...")
    } else {
        ui::Spinner::new("Building...")
    };
    let outcome = run(&mut compiler).await;
    ctrl_c.abort();

    let compilation = match outcome {
        Ok(compilation) => compilation,
        Err(err) => {
            spinner.fail("Build failed");
            return Err(err);
        }
    };
    spinner.finish(&format!("Built {} files", compilation.artifacts.assets.len()));

    for err in compilation.errors {
        eprintln!("{:?}", error::miette::degraded_to_miette(err));
    }
    for warning in &compilation.warnings {
        ui::warning(warning);
    }

    if !quiet {
        let rows: Vec<ui::AssetRow> = compilation
            .artifacts
            .assets
            .iter()
            .map(|(name, asset)| ui::AssetRow {
                name: name.clone(),
                size: asset.len() as u64,
                chunk: compilation
                    .artifacts
                    .chunks
                    .iter()
                    .find(|chunk| chunk.files.contains(name))
                    .and_then(|chunk| chunk.name.clone()),
            })
            .collect();
        ui::print_build_summary(&rows, start_time.elapsed());
        ui::success(&format!(
            "Build completed in {}",
            ui::format_duration(start_time.elapsed())
        ));
    }
    Ok(())
}

async fn run(compiler: &mut Compiler) -> Result<dual_bundler::Compilation> {
    let compilation = compiler.run().await?;
    compiler.emit(&compilation.artifacts).await?;
    Ok(compilation)
}

/// Resolve `auto` against the project's browser targets.
pub fn differential_enabled(root: &Path, mode: DifferentialMode) -> bool {
    match mode {
        DifferentialMode::On => true,
        DifferentialMode::Off => false,
        DifferentialMode::Auto => dual_target::should_enable_secondary_pass(root),
    }
}

/// Primary compiler for the project, with the modern pass installed when enabled.
pub fn compiler(root: &Path, config: &DualConfig, differential: bool) -> Compiler {
    let build = &config.build;
    let loader = TransformLoaderOptions::new(root, utils::resolve_path(&build.dist_dir, root))
        .axis(CompilationAxis::client().with_has_modern(differential))
        .cache(build.cache);
    let rule = ModuleRule::new(SCRIPT_PATTERN)
        .exclude(VENDOR_PATTERN)
        .with_loader(LoaderSpec {
            loader: TRANSFORM_LOADER.to_string(),
            options: loader.to_options(),
        });

    let mut options = CompilerOptions::new(root, EntrySpec::from(&build.entry))
        .output(
            OutputOptions::new(&build.out_dir)
                .filename(build.filename.as_str())
                .chunk_filename(build.chunk_filename.as_str()),
        )
        .optimization(OptimizationOptions::from_config(&config.optimization))
        .rule(rule);
    if differential {
        options = options.plugin(Arc::new(DifferentialPlugin::new(
            DifferentialOptions::from_config(&config.differential),
        )));
    }

    let fs = Arc::new(NativeRuntime::new(root));
    UnboundCompiler::new(options).bind(Bindings::shared(fs), Arc::new(FlatEngine::new()))
}
