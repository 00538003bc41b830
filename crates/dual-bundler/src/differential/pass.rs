use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{Abortable, Aborted};
use parking_lot::Mutex;
use serde_json::Value;

use super::DifferentialOptions;
use crate::artifact::merge;
use crate::builtins::{EntryPlugin, FlatChunkFormatPlugin, RuntimeChunkPlugin, SplitChunksPlugin};
use crate::compiler::{Compilation, Compiler, CompilerOptions, UnboundCompiler};
use crate::output::OutputOptions;
use crate::plugin::{FinalizeTask, MakeHook, Plugin};
use crate::rules::find_transform_loader_mut;
use crate::transform::IS_MODERN_OPTION;
use crate::{Error, Result};

/// Where the modern pass of a build stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PassState {
    #[default]
    Idle,
    SecondaryContextCreated,
    PluginsReapplied,
    EntriesBound,
    Running,
    ArtifactsMerged,
    Done,
    /// The primary build keeps its own output.
    Failed,
}

impl PassState {
    /// Whether `next` may follow `self`.
    pub fn allows(self, next: PassState) -> bool {
        use PassState::*;
        matches!(
            (self, next),
            (Idle, SecondaryContextCreated)
                | (SecondaryContextCreated, PluginsReapplied)
                | (PluginsReapplied, EntriesBound)
                | (EntriesBound, Running)
                | (Running, ArtifactsMerged)
                | (ArtifactsMerged, Done)
        ) || (next == Failed && !self.is_terminal())
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PassState::Done | PassState::Failed)
    }
}

/// Observes the modern pass of the builds a plugin is attached to.
#[derive(Debug, Clone, Default)]
pub struct PassTracker {
    inner: Arc<Mutex<TrackerInner>>,
}

#[derive(Debug, Default)]
struct TrackerInner {
    state: PassState,
    history: Vec<PassState>,
}

impl PassTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PassState {
        self.inner.lock().state
    }

    /// States reached by the latest build, in order.
    pub fn history(&self) -> Vec<PassState> {
        self.inner.lock().history.clone()
    }

    pub(crate) fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.state = PassState::Idle;
        inner.history.clear();
    }

    /// Move to `next`. Illegal transitions are ignored and reported.
    pub(crate) fn advance(&self, next: PassState) -> bool {
        let mut inner = self.inner.lock();
        if !inner.state.allows(next) {
            tracing::warn!(from = ?inner.state, to = ?next, "ignoring illegal modern pass transition");
            return false;
        }
        tracing::trace!(from = ?inner.state, to = ?next, "modern pass");
        inner.state = next;
        inner.history.push(next);
        true
    }
}

/// Make hook that prepares the modern compiler and queues its run.
pub(crate) struct SecondaryPass {
    pub(crate) options: DifferentialOptions,
    pub(crate) tracker: PassTracker,
}

#[async_trait]
impl MakeHook for SecondaryPass {
    async fn make(&self, compiler: &Compiler, compilation: &mut Compilation) -> Result<()> {
        self.tracker.reset();
        match self.prepare(compiler).await {
            Ok(child) => compilation.queue_finalize(Box::new(ModernRun {
                child,
                tracker: self.tracker.clone(),
            })),
            Err(err) => {
                self.tracker.advance(PassState::Failed);
                tracing::warn!(error = %err, "modern compilation could not be prepared");
                compilation.errors.push(Error::secondary(err));
            }
        }
        Ok(())
    }
}

impl SecondaryPass {
    /// Build a bound modern compiler mirroring `primary`.
    async fn prepare(&self, primary: &Compiler) -> Result<Compiler> {
        let primary_options = primary.options();

        let output = OutputOptions {
            path: primary_options.output.path.clone(),
            filename: self.options.filename.resolve(&primary_options.output.filename),
            chunk_filename: self
                .options
                .chunk_filename
                .resolve(&primary_options.output.chunk_filename),
        };

        let plugins: Vec<Arc<dyn Plugin>> = primary_options
            .plugins
            .iter()
            .filter(|plugin| !self.options.is_excluded(plugin.id()))
            .cloned()
            .chain(self.options.additional_plugins.iter().cloned())
            .collect();

        let options = CompilerOptions {
            name: "modern".to_string(),
            context: primary_options.context.clone(),
            entry: primary_options.entry.clone(),
            output,
            optimization: primary_options.optimization.clone(),
            module_rules: primary.module_rules().to_vec(),
            plugins: plugins.clone(),
        };
        let mut child = UnboundCompiler::new(options)
            .with_abort(primary.abort_handle().clone())
            .bind(primary.bindings().clone(), Arc::clone(primary.engine()));
        self.tracker.advance(PassState::SecondaryContextCreated);

        for plugin in &plugins {
            tracing::trace!(plugin = %plugin.id(), "re-applying plugin to modern compiler");
            plugin.apply(&mut child)?;
        }
        self.tracker.advance(PassState::PluginsReapplied);

        let entries = child.options().entry.resolve().await?;
        EntryPlugin::apply_all(&mut child, &entries)?;
        self.tracker.advance(PassState::EntriesBound);

        FlatChunkFormatPlugin.apply(&mut child)?;
        if let Some(split) = primary.split_chunks() {
            SplitChunksPlugin::new(split.clone()).apply(&mut child)?;
        }
        if let Some(runtime) = primary.runtime_chunk() {
            RuntimeChunkPlugin::new(runtime.clone()).apply(&mut child)?;
        }
        if primary_options.optimization.minimize {
            for minimizer in &primary_options.optimization.minimizers {
                Arc::clone(minimizer).apply(&mut child)?;
            }
        }

        Ok(child)
    }
}

/// Runs the modern compiler and merges what it produced.
struct ModernRun {
    child: Compiler,
    tracker: PassTracker,
}

#[async_trait]
impl FinalizeTask for ModernRun {
    async fn finalize(self: Box<Self>, compilation: &mut Compilation) {
        let ModernRun { mut child, tracker } = *self;

        match run_modern(&mut child, &tracker).await {
            Ok(modern) => {
                let report = merge(&mut compilation.artifacts, &modern.artifacts);
                tracker.advance(PassState::ArtifactsMerged);
                tracing::info!(
                    assets = report.assets_added,
                    files = report.files_appended,
                    "merged modern bundle"
                );
                tracker.advance(PassState::Done);
            }
            Err(err) => {
                tracker.advance(PassState::Failed);
                tracing::warn!(error = %err, "modern compilation failed, keeping legacy output");
                compilation.errors.push(Error::secondary(err));
            }
        }
    }
}

async fn run_modern(child: &mut Compiler, tracker: &PassTracker) -> Result<Compilation> {
    let loader = find_transform_loader_mut(child.module_rules_mut())?;
    loader
        .options
        .insert(IS_MODERN_OPTION.to_string(), Value::Bool(true));
    tracker.advance(PassState::Running);

    let registration = child.abort_handle().registration();
    let modern = Abortable::new(child.run(), registration)
        .await
        .map_err(|Aborted| Error::Aborted)??;

    if !modern.errors.is_empty() {
        let mut errors = modern.errors;
        if errors.len() > 1 {
            tracing::debug!(more = errors.len() - 1, "modern compilation reported further errors");
        }
        return Err(errors.swap_remove(0));
    }
    Ok(modern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_linear() {
        use PassState::*;
        let path = [Idle, SecondaryContextCreated, PluginsReapplied, EntriesBound, Running, ArtifactsMerged, Done];
        for pair in path.windows(2) {
            assert!(pair[0].allows(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
        assert!(!Idle.allows(Running));
        assert!(!Done.allows(Failed));
        assert!(Running.allows(Failed));
    }

    #[test]
    fn tracker_ignores_illegal_transitions() {
        let tracker = PassTracker::new();
        assert!(!tracker.advance(PassState::Running));
        assert_eq!(tracker.state(), PassState::Idle);

        assert!(tracker.advance(PassState::SecondaryContextCreated));
        assert!(tracker.advance(PassState::Failed));
        assert!(!tracker.advance(PassState::PluginsReapplied));
        assert_eq!(
            tracker.history(),
            [PassState::SecondaryContextCreated, PassState::Failed]
        );

        tracker.reset();
        assert_eq!(tracker.state(), PassState::Idle);
        assert!(tracker.history().is_empty());
    }
}
