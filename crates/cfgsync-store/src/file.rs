//! File-backed store: one file per item

use std::fs;
use std::path::{Path, PathBuf};

use crate::format::StoreFormat;
use crate::io;
use crate::store::{Collection, ConfigStore, ConfigValue, validate_name};
use crate::{Error, Result};

/// A store that keeps each item in its own file.
///
/// Items of the default collection live directly in the root directory as
/// `<name>.<ext>`. A named collection maps to a sub-directory, with each dot
/// of the collection name starting a new directory level (`language.fr` is
/// `<root>/language/fr/`).
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    format: StoreFormat,
    collection: Collection,
}

impl FileStore {
    /// Create a YAML store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_format(root, StoreFormat::default())
    }

    /// Create a store rooted at `root` using `format` for item files.
    pub fn with_format(root: impl Into<PathBuf>, format: StoreFormat) -> Self {
        Self {
            root: root.into(),
            format,
            collection: Collection::default_collection(),
        }
    }

    /// Root directory of the default collection.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn format(&self) -> StoreFormat {
        self.format
    }

    /// Directory holding the items of this handle's collection.
    pub fn collection_dir(&self) -> PathBuf {
        if self.collection.is_default() {
            return self.root.clone();
        }
        self.collection
            .as_str()
            .split('.')
            .fold(self.root.clone(), |dir, segment| dir.join(segment))
    }

    fn item_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self
            .collection_dir()
            .join(format!("{}.{}", name, self.format.extension())))
    }

    /// Item names of the files directly inside `dir`.
    fn item_names_in(&self, dir: &Path) -> Result<Vec<String>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(dir, e)),
        };

        let suffix = format!(".{}", self.format.extension());
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(dir, e))?;
            let file_type = entry.file_type().map_err(|e| Error::io(entry.path(), e))?;
            if !file_type.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().to_string();
            // Skip in-flight temp files from write_atomic
            if file_name.starts_with('.') {
                continue;
            }
            if let Some(name) = file_name.strip_suffix(&suffix) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Walk sub-directories of `dir` collecting collections that hold items.
    fn collect_collections(
        &self,
        dir: &Path,
        segments: &mut Vec<String>,
        found: &mut Vec<Collection>,
    ) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Error::io(dir, e)),
        };

        for entry in entries {
            let entry = entry.map_err(|e| Error::io(dir, e))?;
            let file_type = entry.file_type().map_err(|e| Error::io(entry.path(), e))?;
            if !file_type.is_dir() {
                continue;
            }
            let segment = entry.file_name().to_string_lossy().to_string();
            if segment.starts_with('.') {
                continue;
            }

            segments.push(segment);
            let path = entry.path();
            if !self.item_names_in(&path)?.is_empty() {
                found.push(Collection::new(segments.join(".")));
            }
            self.collect_collections(&path, segments, found)?;
            segments.pop();
        }
        Ok(())
    }
}

impl ConfigStore for FileStore {
    fn collection(&self) -> &Collection {
        &self.collection
    }

    fn read(&self, name: &str) -> Result<Option<ConfigValue>> {
        let path = self.item_path(name)?;
        match io::read_text_if_exists(&path)? {
            Some(content) => self.format.decode(name, &content).map(Some),
            None => Ok(None),
        }
    }

    /// Checks for the file without decoding it, so an unreadable item exists.
    fn exists(&self, name: &str) -> Result<bool> {
        let path = self.item_path(name)?;
        path.try_exists().map_err(|e| Error::io(&path, e))
    }

    fn write(&self, name: &str, value: &ConfigValue) -> Result<()> {
        let path = self.item_path(name)?;
        let content = self.format.encode(name, value)?;
        io::write_atomic(&path, content.as_bytes())?;
        tracing::trace!(?path, "Wrote config item");
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<bool> {
        let path = self.item_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::io(&path, e)),
        }
    }

    fn delete_all(&self, prefix: Option<&str>) -> Result<()> {
        for name in self.list_all(prefix)? {
            self.delete(&name)?;
        }
        Ok(())
    }

    fn list_all(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let mut names = self.item_names_in(&self.collection_dir())?;
        if let Some(prefix) = prefix {
            names.retain(|name| name.starts_with(prefix));
        }
        Ok(names)
    }

    fn list_collections(&self) -> Result<Vec<Collection>> {
        let mut found = Vec::new();
        self.collect_collections(&self.root, &mut Vec::new(), &mut found)?;
        found.sort();
        Ok(found)
    }

    fn with_collection(&self, collection: &Collection) -> Box<dyn ConfigStore> {
        Box::new(Self {
            root: self.root.clone(),
            format: self.format,
            collection: collection.clone(),
        })
    }
}
