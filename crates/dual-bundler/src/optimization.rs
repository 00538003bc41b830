//! Code splitting, runtime chunk and minification settings.

use std::fmt;
use std::sync::Arc;

use crate::Result;
use crate::compiler::Compiler;

/// Which chunks split-chunks considers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChunksFilter {
    All,
    #[default]
    Async,
    Initial,
}

impl ChunksFilter {
    /// Whether entry (initial) chunks take part.
    pub fn includes_initial(self) -> bool {
        matches!(self, ChunksFilter::All | ChunksFilter::Initial)
    }
}

impl From<dual_config::SplitChunksMode> for ChunksFilter {
    fn from(mode: dual_config::SplitChunksMode) -> Self {
        match mode {
            dual_config::SplitChunksMode::All => ChunksFilter::All,
            dual_config::SplitChunksMode::Async => ChunksFilter::Async,
            dual_config::SplitChunksMode::Initial => ChunksFilter::Initial,
        }
    }
}

/// Shared-module extraction policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitChunksOptions {
    pub chunks: ChunksFilter,
    /// Minimum module size, in bytes, worth extracting.
    pub min_size: usize,
    /// Name of the shared chunk.
    pub name: String,
}

impl Default for SplitChunksOptions {
    fn default() -> Self {
        Self {
            chunks: ChunksFilter::Async,
            min_size: 20_000,
            name: "shared".to_string(),
        }
    }
}

/// Where the chunk-loading runtime lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeChunk {
    /// One runtime chunk shared by all entries.
    Single,
    /// One runtime chunk per entry.
    Multiple,
    /// One shared runtime chunk with a custom name.
    Named(String),
}

impl RuntimeChunk {
    pub fn chunk_name(&self, entry: &str) -> String {
        match self {
            RuntimeChunk::Single => "runtime".to_string(),
            RuntimeChunk::Multiple => format!("runtime~{entry}"),
            RuntimeChunk::Named(name) => name.clone(),
        }
    }
}

/// A code minimizer.
///
/// Activation is explicit: `apply` installs the minimizer on a compiler, and
/// the engine runs every installed minimizer over emitted chunks.
pub trait Minimizer: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn apply(self: Arc<Self>, compiler: &mut Compiler) -> Result<()>;

    fn minify(&self, code: &str) -> String;
}

/// Optimization settings declared on a compiler.
#[derive(Debug, Clone, Default)]
pub struct OptimizationOptions {
    pub minimize: bool,
    pub minimizers: Vec<Arc<dyn Minimizer>>,
    pub split_chunks: Option<SplitChunksOptions>,
    pub runtime_chunk: Option<RuntimeChunk>,
}

impl OptimizationOptions {
    pub fn from_config(config: &dual_config::OptimizationSection) -> Self {
        let split_chunks = config.split_chunks.as_ref().map(|section| SplitChunksOptions {
            chunks: section.chunks.into(),
            min_size: section.min_size,
            ..SplitChunksOptions::default()
        });
        let runtime_chunk = config.runtime_chunk.map(|mode| match mode {
            dual_config::RuntimeChunkMode::Single => RuntimeChunk::Single,
            dual_config::RuntimeChunkMode::Multiple => RuntimeChunk::Multiple,
        });

        Self {
            minimize: config.minimize,
            minimizers: vec![Arc::new(WhitespaceMinimizer)],
            split_chunks,
            runtime_chunk,
        }
    }
}

/// Drops blank lines, full-line `//` comments and surrounding whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceMinimizer;

impl Minimizer for WhitespaceMinimizer {
    fn name(&self) -> &str {
        "whitespace"
    }

    fn apply(self: Arc<Self>, compiler: &mut Compiler) -> Result<()> {
        compiler.install_minimizer(self);
        Ok(())
    }

    fn minify(&self, code: &str) -> String {
        code.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_minimizer_strips_noise() {
        let code = "  // header\n\nconst a = 1;\n   const b = 2;  \n";
        assert_eq!(WhitespaceMinimizer.minify(code), "const a = 1;\nconst b = 2;");
    }

    #[test]
    fn runtime_chunk_names() {
        assert_eq!(RuntimeChunk::Single.chunk_name("main"), "runtime");
        assert_eq!(RuntimeChunk::Multiple.chunk_name("main"), "runtime~main");
        assert_eq!(RuntimeChunk::Named("boot".into()).chunk_name("main"), "boot");
    }

    #[test]
    fn config_conversion() {
        let section = dual_config::OptimizationSection {
            minimize: true,
            runtime_chunk: Some(dual_config::RuntimeChunkMode::Multiple),
            split_chunks: Some(dual_config::SplitChunksSection {
                chunks: dual_config::SplitChunksMode::All,
                min_size: 10,
            }),
        };
        let options = OptimizationOptions::from_config(&section);
        assert!(options.minimize);
        assert_eq!(options.runtime_chunk, Some(RuntimeChunk::Multiple));
        let split = options.split_chunks.unwrap();
        assert_eq!(split.chunks, ChunksFilter::All);
        assert_eq!(split.min_size, 10);
    }

    #[test]
    fn split_chunks_modes_map_one_to_one() {
        use dual_config::SplitChunksMode;
        assert_eq!(ChunksFilter::from(SplitChunksMode::All), ChunksFilter::All);
        assert_eq!(ChunksFilter::from(SplitChunksMode::Async), ChunksFilter::Async);
        assert_eq!(ChunksFilter::from(SplitChunksMode::Initial), ChunksFilter::Initial);
        assert!(ChunksFilter::from(SplitChunksMode::Initial).includes_initial());
    }

    #[test]
    fn unknown_chunks_mode_never_reaches_options() {
        let err = dual_config::DualConfig::from_value(serde_json::json!({
            "optimization": { "split_chunks": { "chunks": "bogus" } }
        }))
        .unwrap_err();
        assert!(matches!(err, dual_config::ConfigError::InvalidValue { .. }));
    }
}
