//! Settings resolution with local overrides
//!
//! Settings are loaded from the state directory in two layers, the later
//! overriding the former key by key:
//! 1. `settings.toml`
//! 2. `settings.local.toml` (machine-local, not committed)

use std::fs;
use std::path::{Path, PathBuf};

use super::settings::SyncSettings;
use crate::Result;

/// Shared settings filename inside the state directory.
pub const SETTINGS_FILENAME: &str = "settings.toml";

/// Machine-local override filename inside the state directory.
pub const LOCAL_SETTINGS_FILENAME: &str = "settings.local.toml";

/// Loads [`SyncSettings`] from a state directory.
#[derive(Debug, Clone)]
pub struct SettingsResolver {
    state_dir: PathBuf,
}

impl SettingsResolver {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    /// Resolve settings by layering the local file over the shared one.
    ///
    /// Missing layers are skipped. Invalid TOML in any layer is an error.
    pub fn resolve(&self) -> Result<SyncSettings> {
        let mut merged = toml::Table::new();

        for (layer, path) in [
            ("shared", self.state_dir.join(SETTINGS_FILENAME)),
            ("local", self.state_dir.join(LOCAL_SETTINGS_FILENAME)),
        ] {
            if path.is_file() {
                tracing::debug!(?path, layer, "Loading settings layer");
                let content = fs::read_to_string(&path)?;
                let table: toml::Table = toml::from_str(&content)?;
                merge_tables(&mut merged, table);
            } else {
                tracing::debug!(?path, layer, "No settings layer found, skipping");
            }
        }

        let settings: SyncSettings = toml::Value::Table(merged).try_into()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Check if a shared settings file exists
    pub fn has_settings(&self) -> bool {
        self.state_dir.join(SETTINGS_FILENAME).is_file()
    }

    /// Check if local overrides exist
    pub fn has_local_overrides(&self) -> bool {
        self.state_dir.join(LOCAL_SETTINGS_FILENAME).is_file()
    }
}

/// Deep-merge `overlay` into `base`. Tables merge recursively, anything
/// else is replaced.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::ConflictPolicy;
    use tempfile::TempDir;

    #[test]
    fn resolve_returns_defaults_when_no_settings_exist() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = SettingsResolver::new(temp_dir.path());

        assert!(!resolver.has_settings());
        assert!(!resolver.has_local_overrides());
        assert_eq!(resolver.resolve().unwrap(), SyncSettings::default());
    }

    #[test]
    fn local_layer_overrides_single_keys() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(SETTINGS_FILENAME),
            "[items]\nidentity_key = \"id\"\nassign_identity = false\n",
        )
        .unwrap();
        fs::write(
            temp_dir.path().join(LOCAL_SETTINGS_FILENAME),
            "[items]\nassign_identity = true\n\n[merge]\nconflict = \"upstream-wins\"\n",
        )
        .unwrap();

        let settings = SettingsResolver::new(temp_dir.path()).resolve().unwrap();
        assert_eq!(settings.items.identity_key, "id");
        assert!(settings.items.assign_identity);
        assert_eq!(settings.merge.conflict, ConflictPolicy::UpstreamWins);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(SETTINGS_FILENAME), "[items\n").unwrap();
        assert!(SettingsResolver::new(temp_dir.path()).resolve().is_err());
    }
}
