//! Error types for target resolution.

/// Result type for target operations
pub type Result<T> = std::result::Result<T, TargetError>;

/// Error type for target operations
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("invalid version `{version}` for engine `{engine}`")]
    InvalidVersion { engine: String, version: String },

    #[error("unsupported browser query: `{0}`")]
    UnsupportedQuery(String),

    #[error("configuration error: {0}")]
    Config(#[from] dual_config::ConfigError),
}
