//! Plugins every compiler understands.

use std::path::PathBuf;

use crate::compiler::{BoundEntry, ChunkFormat, Compiler};
use crate::entry::{EntryMap, EntryValue};
use crate::optimization::{RuntimeChunk, SplitChunksOptions};
use crate::plugin::{Plugin, PluginId};
use crate::{Error, Result};

/// Binds one entry, single-file or multi-file.
#[derive(Debug, Clone)]
pub struct EntryPlugin {
    name: String,
    value: EntryValue,
}

impl EntryPlugin {
    pub const ID: PluginId = PluginId::new("entry");

    pub fn new(name: impl Into<String>, value: EntryValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Bind every entry of `entries`, in order.
    pub fn apply_all(compiler: &mut Compiler, entries: &EntryMap) -> Result<()> {
        for (name, value) in entries {
            EntryPlugin::new(name.clone(), value.clone()).apply(compiler)?;
        }
        Ok(())
    }
}

impl Plugin for EntryPlugin {
    fn id(&self) -> PluginId {
        Self::ID
    }

    fn apply(&self, compiler: &mut Compiler) -> Result<()> {
        let entry = match &self.value {
            EntryValue::Single(path) => BoundEntry::Single(PathBuf::from(path)),
            EntryValue::Multi(paths) if paths.is_empty() => {
                return Err(Error::EntryResolution(format!(
                    "entry '{}' lists no files",
                    self.name
                )));
            }
            EntryValue::Multi(paths) => BoundEntry::Multi(paths.iter().map(PathBuf::from).collect()),
        };
        compiler.add_entry(self.name.clone(), entry);
        Ok(())
    }
}

/// Emits chunks that load without the chunk-loading bootstrap.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatChunkFormatPlugin;

impl FlatChunkFormatPlugin {
    pub const ID: PluginId = PluginId::new("flat-chunk-format");
}

impl Plugin for FlatChunkFormatPlugin {
    fn id(&self) -> PluginId {
        Self::ID
    }

    fn apply(&self, compiler: &mut Compiler) -> Result<()> {
        compiler.set_chunk_format(ChunkFormat::Flat);
        Ok(())
    }
}

/// Installs a split-chunks policy. The compiler gets its own copy.
#[derive(Debug, Clone)]
pub struct SplitChunksPlugin {
    options: SplitChunksOptions,
}

impl SplitChunksPlugin {
    pub const ID: PluginId = PluginId::new("split-chunks");

    pub fn new(options: SplitChunksOptions) -> Self {
        Self { options }
    }
}

impl Plugin for SplitChunksPlugin {
    fn id(&self) -> PluginId {
        Self::ID
    }

    fn apply(&self, compiler: &mut Compiler) -> Result<()> {
        compiler.set_split_chunks(self.options.clone());
        Ok(())
    }
}

/// Installs a runtime-chunk policy.
#[derive(Debug, Clone)]
pub struct RuntimeChunkPlugin {
    policy: RuntimeChunk,
}

impl RuntimeChunkPlugin {
    pub const ID: PluginId = PluginId::new("runtime-chunk");

    pub fn new(policy: RuntimeChunk) -> Self {
        Self { policy }
    }
}

impl Plugin for RuntimeChunkPlugin {
    fn id(&self) -> PluginId {
        Self::ID
    }

    fn apply(&self, compiler: &mut Compiler) -> Result<()> {
        compiler.set_runtime_chunk(self.policy.clone());
        Ok(())
    }
}
