//! [`TestSite`] builder for on-disk config-sync scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use cfgsync_extensions::{CONFIG_INSTALL_DIRECTORY, ExtensionKind, MANIFEST_FILENAME};
use cfgsync_store::{ConfigStore, ConfigValue, FileStore};
use tempfile::TempDir;

/// Directory under the site root holding config-sync state.
pub const STATE_DIRECTORY: &str = ".config-sync";

/// A temporary site directory laid out the way the `config-sync` CLI expects.
///
/// ```text
/// <root>/
///   modules/<id>/config/install/*.yml   shipped configuration
///   themes/<id>/config/install/*.yml
///   .config-sync/
///     extensions.toml                   enabled extensions
///     settings.toml
///     active/  staging/  snapshot/{upstream,active}/
/// ```
///
/// # Example
///
/// ```rust,no_run
/// use cfgsync_extensions::ExtensionKind;
/// use cfgsync_test_utils::TestSite;
/// use serde_json::json;
///
/// let mut site = TestSite::new();
/// site.add_extension(ExtensionKind::Module, "node", &[("node.settings", json!({"a": 1}))]);
/// site.assert_file_exists(".config-sync/extensions.toml");
/// ```
pub struct TestSite {
    temp_dir: TempDir,
    manifest: Vec<(ExtensionKind, String)>,
}

impl Default for TestSite {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSite {
    /// Create an empty site with an empty state directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("TestSite::new: failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join(STATE_DIRECTORY))
            .expect("TestSite::new: failed to create state dir");
        Self {
            temp_dir,
            manifest: Vec::new(),
        }
    }

    /// Return the root path of the site.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root().join(STATE_DIRECTORY)
    }

    /// Add an enabled extension shipping `items` and rewrite the manifest.
    pub fn add_extension(&mut self, kind: ExtensionKind, id: &str, items: &[(&str, ConfigValue)]) {
        let install = self
            .root()
            .join(extension_dir(kind, id))
            .join(CONFIG_INSTALL_DIRECTORY);
        fs::create_dir_all(&install).expect("TestSite::add_extension: failed to create dir");
        let store = FileStore::new(install);
        for (name, value) in items {
            store
                .write(name, value)
                .unwrap_or_else(|e| panic!("TestSite::add_extension: {name}: {e}"));
        }

        if !self.manifest.iter().any(|(k, i)| *k == kind && i == id) {
            self.manifest.push((kind, id.to_string()));
        }
        self.write_manifest();
    }

    /// Add an enabled extension that ships no configuration.
    pub fn add_bare_extension(&mut self, kind: ExtensionKind, id: &str) {
        fs::create_dir_all(self.root().join(extension_dir(kind, id)))
            .expect("TestSite::add_bare_extension: failed to create dir");
        self.manifest.push((kind, id.to_string()));
        self.write_manifest();
    }

    /// Overwrite one shipped item of an extension added earlier.
    pub fn ship(&self, kind: ExtensionKind, id: &str, name: &str, value: &ConfigValue) {
        self.shipped(kind, id)
            .write(name, value)
            .unwrap_or_else(|e| panic!("TestSite::ship: {name}: {e}"));
    }

    /// Store over the shipped configuration of an extension.
    pub fn shipped(&self, kind: ExtensionKind, id: &str) -> FileStore {
        FileStore::new(
            self.root()
                .join(extension_dir(kind, id))
                .join(CONFIG_INSTALL_DIRECTORY),
        )
    }

    pub fn active(&self) -> FileStore {
        FileStore::new(self.state_dir().join("active"))
    }

    pub fn staging(&self) -> FileStore {
        FileStore::new(self.state_dir().join("staging"))
    }

    pub fn snapshot_upstream(&self) -> FileStore {
        FileStore::new(self.state_dir().join("snapshot").join("upstream"))
    }

    pub fn snapshot_active(&self) -> FileStore {
        FileStore::new(self.state_dir().join("snapshot").join("active"))
    }

    /// Write an item straight into active configuration.
    pub fn write_active(&self, name: &str, value: &ConfigValue) {
        self.active()
            .write(name, value)
            .unwrap_or_else(|e| panic!("TestSite::write_active: {name}: {e}"));
    }

    /// Write `.config-sync/settings.toml`.
    pub fn write_settings(&self, content: &str) {
        fs::write(self.state_dir().join("settings.toml"), content)
            .expect("TestSite::write_settings: failed to write settings");
    }

    /// Write a raw file relative to the site root.
    pub fn write_file(&self, path: &str, content: &str) {
        let full_path = self.root().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("TestSite::write_file: failed to create dir");
        }
        fs::write(&full_path, content)
            .unwrap_or_else(|_| panic!("Could not write file: {}", full_path.display()));
    }

    fn write_manifest(&self) {
        let mut manifest = String::new();
        for (kind, id) in &self.manifest {
            manifest.push_str(&format!(
                "[[{kind}]]\nid = \"{id}\"\npath = \"{}\"\n\n",
                extension_dir(*kind, id)
            ));
        }
        fs::write(self.state_dir().join(MANIFEST_FILENAME), manifest)
            .expect("TestSite: failed to write manifest");
    }

    /// Assert that `path` (relative to the site root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the site root) does **not** exist.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `path` (relative to root) contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let full_path = self.root().join(path);
        let file_content = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            full_path.display(),
            content,
            file_content
        );
    }
}

/// Site-relative directory of an extension, `modules/<id>` and so on.
pub fn extension_dir(kind: ExtensionKind, id: &str) -> String {
    format!("{kind}s/{id}")
}
