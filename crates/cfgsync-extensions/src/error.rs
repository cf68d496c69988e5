use std::path::PathBuf;

/// Errors that can occur in the extension system.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to parse the extensions manifest TOML.
    #[error("failed to parse extensions manifest: {0}")]
    ManifestParse(#[from] toml::de::Error),

    /// Extensions manifest file not found at the expected path.
    #[error("extensions manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    /// Invalid extension identifier.
    #[error("invalid extension name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Unknown extension kind.
    #[error("unknown extension kind '{0}' (expected module, theme or profile)")]
    InvalidKind(String),

    /// Malformed `kind:id` reference.
    #[error("invalid extension reference '{0}' (expected kind:id, e.g. module:system)")]
    InvalidReference(String),

    /// The same extension is declared twice.
    #[error("extension '{kind}:{id}' is declared more than once")]
    DuplicateExtension { kind: String, id: String },

    /// I/O error reading extension files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Extension not found in registry.
    #[error("unknown extension: {0}")]
    UnknownExtension(String),
}

pub type Result<T> = std::result::Result<T, Error>;
