//! Output location and filename templates.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Directory and filename templates for emitted chunks.
///
/// Templates understand `[name]`, `[id]` and `[hash]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    /// Output directory, relative to the compiler context unless absolute.
    pub path: PathBuf,
    /// Template for entry chunks.
    pub filename: String,
    /// Template for non-entry chunks.
    pub chunk_filename: String,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("dist"),
            filename: "[name].js".to_string(),
            chunk_filename: "[id].js".to_string(),
        }
    }
}

impl OutputOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn filename(mut self, template: impl Into<String>) -> Self {
        self.filename = template.into();
        self
    }

    pub fn chunk_filename(mut self, template: impl Into<String>) -> Self {
        self.chunk_filename = template.into();
        self
    }
}

/// A template for the modern pass: either fixed, or derived from the primary's.
#[derive(Clone)]
pub enum FilenameTemplate {
    Fixed(String),
    Derive(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl FilenameTemplate {
    pub fn derive(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        FilenameTemplate::Derive(Arc::new(f))
    }

    /// Produce the template to use, given the primary's.
    pub fn resolve(&self, primary: &str) -> String {
        match self {
            FilenameTemplate::Fixed(template) => template.clone(),
            FilenameTemplate::Derive(f) => f(primary),
        }
    }
}

impl fmt::Debug for FilenameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilenameTemplate::Fixed(template) => f.debug_tuple("Fixed").field(template).finish(),
            FilenameTemplate::Derive(_) => f.write_str("Derive(<fn>)"),
        }
    }
}

impl From<&str> for FilenameTemplate {
    fn from(template: &str) -> Self {
        FilenameTemplate::Fixed(template.to_string())
    }
}

impl From<String> for FilenameTemplate {
    fn from(template: String) -> Self {
        FilenameTemplate::Fixed(template)
    }
}

/// Fill a filename template.
///
/// `[hash]` is the first eight hex digits of the BLAKE3 hash of `content`.
pub fn render_template(template: &str, name: &str, id: &str, content: &[u8]) -> String {
    let mut rendered = template.replace("[name]", name).replace("[id]", id);
    if rendered.contains("[hash]") {
        let hash = blake3::hash(content).to_hex();
        rendered = rendered.replace("[hash]", &hash[..8]);
    }
    rendered
}
