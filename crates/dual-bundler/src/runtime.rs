//! Filesystem abstraction shared by the primary and modern compilations.
//!
//! Both passes read sources and write outputs through a [`Runtime`]. The
//! modern pass is handed the primary's runtimes by `Arc`, never a copy, so
//! outputs written by one pass are visible to the other.

use async_trait::async_trait;
use parking_lot::RwLock;
use path_clean::PathClean;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Other runtime error
    #[error("Runtime error: {0}")]
    Other(String),
}

/// Platform filesystem used by a compilation.
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a file.
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Write a file, creating parent directories as needed.
    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()>;
}

/// Native filesystem rooted at a project directory.
///
/// Relative paths resolve against `cwd`; blocking I/O runs on tokio's
/// blocking pool.
#[derive(Debug)]
pub struct NativeRuntime {
    cwd: PathBuf,
}

impl NativeRuntime {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf().clean()
        } else {
            self.cwd.join(path).clean()
        }
    }
}

#[async_trait]
impl Runtime for NativeRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let full_path = self.resolve_path(path);

        #[cfg(not(target_family = "wasm"))]
        {
            tokio::task::spawn_blocking(move || {
                std::fs::read(&full_path).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        RuntimeError::FileNotFound(full_path.clone())
                    } else {
                        RuntimeError::Io(format!("Failed to read {}: {}", full_path.display(), e))
                    }
                })
            })
            .await
            .map_err(|e| RuntimeError::Other(format!("Task join error: {}", e)))?
        }

        #[cfg(target_family = "wasm")]
        {
            Err(RuntimeError::FileNotFound(full_path))
        }
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()> {
        let full_path = self.resolve_path(path);

        #[cfg(not(target_family = "wasm"))]
        {
            let content = content.to_vec();
            tokio::task::spawn_blocking(move || {
                if let Some(parent) = full_path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        RuntimeError::Io(format!("Failed to create {}: {}", parent.display(), e))
                    })?;
                }
                std::fs::write(&full_path, content).map_err(|e| {
                    RuntimeError::Io(format!("Failed to write {}: {}", full_path.display(), e))
                })
            })
            .await
            .map_err(|e| RuntimeError::Other(format!("Task join error: {}", e)))?
        }

        #[cfg(target_family = "wasm")]
        {
            let _ = content;
            Err(RuntimeError::Other(format!(
                "no native filesystem to write {}",
                full_path.display()
            )))
        }
    }
}

/// Purely in-memory runtime.
///
/// Writes land in the same map reads come from, which makes it convenient for
/// inspecting build output in tests.
#[derive(Debug, Default)]
pub struct MemoryRuntime {
    files: RwLock<FxHashMap<PathBuf, Vec<u8>>>,
    cwd: PathBuf,
}

impl MemoryRuntime {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            files: RwLock::new(FxHashMap::default()),
            cwd: cwd.into(),
        }
    }

    /// Builder-style file insertion.
    pub fn with_file(self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = self.resolve_path(path.as_ref());
        self.files.write().insert(path, content.into());
    }

    /// Read a file back as UTF-8.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        let path = self.resolve_path(path.as_ref());
        self.files
            .read()
            .get(&path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.files.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf().clean()
        } else {
            self.cwd.join(path).clean()
        }
    }
}

#[async_trait]
impl Runtime for MemoryRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let path = self.resolve_path(path);
        self.files
            .read()
            .get(&path)
            .cloned()
            .ok_or(RuntimeError::FileNotFound(path))
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()> {
        let path = self.resolve_path(path);
        self.files.write().insert(path, content.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_native_paths_are_cleaned_against_cwd() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("src")).unwrap();
        std::fs::write(temp_dir.path().join("src/index.js"), b"export const x = 1;").unwrap();

        let runtime = NativeRuntime::new(temp_dir.path());
        let content = runtime
            .read_file(Path::new("./lib/../src/index.js"))
            .await
            .unwrap();
        assert_eq!(content, b"export const x = 1;");
    }

    #[tokio::test]
    async fn test_native_missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = NativeRuntime::new(temp_dir.path());
        let err = runtime.read_file(Path::new("absent.js")).await.unwrap_err();
        assert!(matches!(err, RuntimeError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_filesystem_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        std::fs::write(&file_path, b"filesystem content").unwrap();

        let runtime = NativeRuntime::new(temp_dir.path());
        let content = runtime.read_file(Path::new("test.txt")).await.unwrap();
        assert_eq!(content, b"filesystem content");
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = NativeRuntime::new(temp_dir.path());
        runtime
            .write_file(Path::new("dist/nested/main.js"), b"x")
            .await
            .unwrap();
        assert!(temp_dir.path().join("dist/nested/main.js").exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let runtime = MemoryRuntime::new("/app");
        let err = runtime.read_file(Path::new("nope.js")).await.unwrap_err();
        assert!(matches!(err, RuntimeError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_memory_round_trip() {
        let runtime = MemoryRuntime::new("/app").with_file("a.js", "a");
        runtime
            .write_file(Path::new("/app/dist/a.js"), b"out")
            .await
            .unwrap();
        assert_eq!(runtime.get("dist/a.js").as_deref(), Some("out"));
        assert_eq!(runtime.get("a.js").as_deref(), Some("a"));
        assert_eq!(runtime.paths().len(), 2);
    }
}
