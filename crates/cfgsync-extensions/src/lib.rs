//! Extension registry for config-sync.
//!
//! Extensions (modules, themes, install profiles) ship default configuration
//! in a `config/install` directory. This crate describes which extensions are
//! enabled and hands out a [`ConfigStore`](cfgsync_store::ConfigStore) over the
//! configuration each one provides.

pub mod error;
pub mod kind;
pub mod manifest;
pub mod registry;

/// Directory, relative to an extension's path, holding its shipped configuration.
pub const CONFIG_INSTALL_DIRECTORY: &str = "config/install";

/// The canonical filename for the enabled-extensions manifest.
pub const MANIFEST_FILENAME: &str = "extensions.toml";

pub use error::{Error, Result};
pub use kind::{ExtensionKind, ExtensionRef};
pub use manifest::{ExtensionsManifest, ManifestEntry};
pub use registry::{Extension, ExtensionRegistry, StaticRegistry};
