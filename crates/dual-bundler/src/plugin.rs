//! Plugin contract.
//!
//! Plugins are activated explicitly: a compiler is first bound to its
//! filesystems, then each plugin's [`Plugin::apply`] is called against it.
//! Plugins hook into the build by registering a [`MakeHook`], which in turn
//! may queue a [`FinalizeTask`] on the compilation.

use std::fmt;

use async_trait::async_trait;

use crate::Result;
use crate::compiler::{Compilation, Compiler};

/// Identity token attached to a plugin type.
///
/// Plugin exclusion compares tokens, never type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(&'static str);

impl PluginId {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

pub trait Plugin: Send + Sync {
    fn id(&self) -> PluginId;

    fn apply(&self, compiler: &mut Compiler) -> Result<()>;
}

/// Runs while the compilation's module graph is being made.
#[async_trait]
pub trait MakeHook: Send + Sync {
    async fn make(&self, compiler: &Compiler, compilation: &mut Compilation) -> Result<()>;
}

/// Runs once, after the engine has produced the compilation's artifacts.
///
/// The compilation is not finished until every queued task has returned.
#[async_trait]
pub trait FinalizeTask: Send {
    async fn finalize(self: Box<Self>, compilation: &mut Compilation);
}
