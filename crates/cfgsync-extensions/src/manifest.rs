//! Enabled-extensions manifest parsing for `extensions.toml` files.
//!
//! The manifest lists every enabled extension by kind together with its
//! location relative to the site root. Shipped configuration is read from
//! [`CONFIG_INSTALL_DIRECTORY`](crate::CONFIG_INSTALL_DIRECTORY) under that
//! location unless the entry overrides it.
//!
//! # Example TOML
//!
//! ```toml
//! [[module]]
//! id = "system"
//! path = "core/modules/system"
//!
//! [[module]]
//! id = "node"
//! path = "core/modules/node"
//!
//! [[theme]]
//! id = "olivero"
//! path = "core/themes/olivero"
//!
//! [[profile]]
//! id = "standard"
//! path = "core/profiles/standard"
//! config_dir = "config/install"
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cfgsync_store::{ConfigStore, FileStore, StoreFormat};
use serde::{Deserialize, Serialize};

use crate::CONFIG_INSTALL_DIRECTORY;
use crate::error::{Error, Result};
use crate::kind::{ExtensionKind, validate_extension_id};
use crate::registry::{Extension, StaticRegistry};

/// Parsed `extensions.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionsManifest {
    #[serde(default)]
    pub module: Vec<ManifestEntry>,
    #[serde(default)]
    pub theme: Vec<ManifestEntry>,
    #[serde(default)]
    pub profile: Vec<ManifestEntry>,
}

/// One enabled extension.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    /// Machine name.
    pub id: String,
    /// Extension directory, relative to the site root.
    pub path: PathBuf,
    /// Override for the shipped-configuration directory, relative to `path`.
    #[serde(default)]
    pub config_dir: Option<PathBuf>,
}

impl ManifestEntry {
    /// Directory holding this extension's shipped configuration.
    pub fn config_path(&self, base_dir: &Path) -> PathBuf {
        let relative = self
            .config_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_INSTALL_DIRECTORY));
        base_dir.join(&self.path).join(relative)
    }
}

impl ExtensionsManifest {
    /// Parse a manifest from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load a manifest from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ManifestNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Entries of one kind.
    pub fn entries(&self, kind: ExtensionKind) -> &[ManifestEntry] {
        match kind {
            ExtensionKind::Module => &self.module,
            ExtensionKind::Theme => &self.theme,
            ExtensionKind::Profile => &self.profile,
        }
    }

    /// Build a registry, opening a [`FileStore`] over every extension whose
    /// shipped-configuration directory exists.
    pub fn into_registry(self, base_dir: &Path, format: StoreFormat) -> StaticRegistry {
        let mut registry = StaticRegistry::new();
        for kind in ExtensionKind::ALL {
            for entry in self.entries(kind) {
                let config_path = entry.config_path(base_dir);
                let mut extension = Extension::new(kind, entry.id.clone());
                if config_path.is_dir() {
                    let store: Arc<dyn ConfigStore> =
                        Arc::new(FileStore::with_format(config_path, format));
                    extension = extension.with_config(store);
                } else {
                    tracing::debug!(
                        extension = %extension.reference(),
                        path = %config_path.display(),
                        "Extension ships no configuration"
                    );
                }
                registry.register(extension);
            }
        }
        registry
    }

    fn validate(&self) -> Result<()> {
        for kind in ExtensionKind::ALL {
            let mut seen = BTreeSet::new();
            for entry in self.entries(kind) {
                validate_extension_id(&entry.id)?;
                if !seen.insert(entry.id.as_str()) {
                    return Err(Error::DuplicateExtension {
                        kind: kind.to_string(),
                        id: entry.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
