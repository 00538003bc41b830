//! Compilation engines.
//!
//! An engine turns a bound compiler's entries into an [`ArtifactSet`]. The
//! compiler owns everything around it: entry binding, make hooks, finalize
//! tasks and emission.

mod flat;

pub use flat::{FlatEngine, RUNTIME_BOOTSTRAP};

use async_trait::async_trait;

use crate::Result;
use crate::artifact::ArtifactSet;
use crate::compiler::Compiler;

#[async_trait]
pub trait Engine: Send + Sync {
    /// Compile every bound entry of `compiler`.
    async fn compile(&self, compiler: &Compiler) -> Result<ArtifactSet>;
}
