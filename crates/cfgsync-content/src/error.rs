//! Error types for cfgsync-content

/// Result type for cfgsync-content operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cfgsync-content operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Item '{name}' must be a mapping, found {found}")]
    NotAMapping { name: String, found: String },

    #[error("Invalid dependency list in '{name}' at {path}: {reason}")]
    InvalidDependencies {
        name: String,
        path: String,
        reason: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
