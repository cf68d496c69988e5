//! Error types for cfgsync-core

use std::path::PathBuf;

/// Result type for cfgsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cfgsync-core operations
///
/// Only store-level failures abort an operation. Malformed items, missing
/// dependencies and merge conflicts are reported per item instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A store could not be read or written
    #[error("Configuration store unavailable: {0}")]
    StoreUnavailable(#[from] cfgsync_store::Error),

    /// An item's value has the wrong shape
    #[error("Malformed value for '{name}': {reason}")]
    MalformedValue { name: String, reason: String },

    /// The extension is not enabled
    #[error("Unknown or disabled extension: {kind}:{id}")]
    UnknownExtension { kind: String, id: String },

    /// Settings file not found at expected path
    #[error("Settings not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid settings value
    #[error("Invalid setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    // Transparent wrappers for underlying crate errors
    /// Content error from cfgsync-content
    #[error(transparent)]
    Content(#[from] cfgsync_content::Error),

    /// Extension error from cfgsync-extensions
    #[error(transparent)]
    Extensions(#[from] cfgsync_extensions::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub fn unknown_extension(kind: impl ToString, id: impl Into<String>) -> Self {
        Self::UnknownExtension {
            kind: kind.to_string(),
            id: id.into(),
        }
    }
}
