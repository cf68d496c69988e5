//! Error types for cfgsync-store

use std::path::PathBuf;

/// Result type for cfgsync-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cfgsync-store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} item '{name}': {message}")]
    ConfigParse {
        name: String,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} item '{name}': {message}")]
    ConfigSerialize {
        name: String,
        format: String,
        message: String,
    },

    #[error("Unsupported store format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Invalid item name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Store '{store}' is unavailable: {reason}")]
    Unavailable { store: String, reason: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn unavailable(store: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            store: store.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure concerns a single item rather than the store.
    ///
    /// Item-level failures are skipped and reported by the engine; everything
    /// else aborts the current operation.
    pub fn is_item_level(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. } | Self::ConfigSerialize { .. } | Self::InvalidName { .. }
        )
    }
}
