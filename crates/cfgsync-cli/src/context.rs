//! Site context
//!
//! Locates the state directory of a site and builds the engine over the
//! file stores kept there.
//!
//! ```text
//! <root>/.config-sync/
//!   extensions.toml        enabled extensions
//!   settings.toml          engine settings (optional)
//!   settings.local.toml    local overrides (optional)
//!   active/                active configuration
//!   staging/               reconciled values awaiting import
//!   snapshot/upstream/     shipped values at the last sync
//!   snapshot/active/       active values at the last sync
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cfgsync_core::{ConfigSync, SettingsResolver, SnapshotPair, SyncSettings, SyncStores};
use cfgsync_extensions::{ExtensionsManifest, MANIFEST_FILENAME, StaticRegistry};
use cfgsync_store::{FileStore, StoreFormat};

use crate::error::{CliError, Result};

/// Directory under the site root holding config-sync state.
pub const STATE_DIRECTORY: &str = ".config-sync";

/// A site with a config-sync state directory.
#[derive(Debug, Clone)]
pub struct SiteContext {
    root: PathBuf,
    state_dir: PathBuf,
    settings: SyncSettings,
}

impl SiteContext {
    /// Load the site at `root`, failing when it has no state directory.
    pub fn load(root: &Path) -> Result<Self> {
        let state_dir = root.join(STATE_DIRECTORY);
        if !state_dir.is_dir() {
            return Err(CliError::user(format!(
                "Not a config-sync site: {} has no {}/ directory",
                root.display(),
                STATE_DIRECTORY
            )));
        }
        let settings = SettingsResolver::new(&state_dir).resolve()?;
        Ok(Self {
            root: root.to_path_buf(),
            state_dir,
            settings,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Extensions listed in the manifest. A missing manifest enables none.
    pub fn registry(&self) -> Result<StaticRegistry> {
        let path = self.state_dir.join(MANIFEST_FILENAME);
        if !path.exists() {
            tracing::warn!(path = %path.display(), "No extension manifest, no extensions enabled");
            return Ok(StaticRegistry::new());
        }
        let manifest = ExtensionsManifest::from_path(&path)?;
        Ok(manifest.into_registry(&self.root, StoreFormat::Yaml))
    }

    pub fn store(&self, relative: &str) -> FileStore {
        FileStore::new(self.state_dir.join(relative))
    }

    pub fn stores(&self) -> SyncStores {
        SyncStores {
            active: Arc::new(self.store("active")),
            staging: Arc::new(self.store("staging")),
            snapshot: SnapshotPair::new(
                Arc::new(self.store("snapshot/upstream")),
                Arc::new(self.store("snapshot/active")),
            ),
        }
    }

    pub fn engine(&self) -> Result<ConfigSync> {
        Ok(ConfigSync::new(
            self.stores(),
            Arc::new(self.registry()?),
            &self.settings,
        ))
    }
}
