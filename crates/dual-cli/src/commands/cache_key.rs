//! `dual cache-key`: print the transform cache identifier for one axis.

use dual_bundler::{CompilationAxis, ConfigSession, TransformConfigurator};

use crate::cli::CacheKeyArgs;
use crate::commands::utils;
use crate::error::Result;

pub fn execute(args: CacheKeyArgs) -> Result<()> {
    let root = utils::project_root(&args.cwd)?;
    let axis = CompilationAxis::new(args.server, args.modern, args.has_modern);
    let id = identifier(&root, axis)?;
    println!("{id}");
    println!("blake3 {}", fingerprint(&id));
    Ok(())
}

/// Cache identifier for `axis` under the project at `root`.
pub fn identifier(root: &std::path::Path, axis: CompilationAxis) -> Result<String> {
    let configurator = TransformConfigurator::new();
    let session = ConfigSession::new();
    let id = configurator.cache_identifier(&session, root, axis)?;
    tracing::debug!(%axis, "computed cache identifier");
    Ok(id)
}

/// Short, fixed-length digest of an identifier for logs and cache listings.
pub fn fingerprint(id: &str) -> String {
    blake3::hash(id.as_bytes()).to_hex()[..16].to_string()
}
