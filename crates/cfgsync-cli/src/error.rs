//! Error types for cfgsync-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from cfgsync-core
    #[error(transparent)]
    Core(#[from] cfgsync_core::Error),

    /// Error from cfgsync-store
    #[error(transparent)]
    Store(#[from] cfgsync_store::Error),

    /// Error from cfgsync-content
    #[error(transparent)]
    Content(#[from] cfgsync_content::Error),

    /// Error from cfgsync-extensions
    #[error(transparent)]
    Extensions(#[from] cfgsync_extensions::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
