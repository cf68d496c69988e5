//! A store wrapper that fails on demand.

use std::collections::BTreeSet;
use std::sync::Arc;

use cfgsync_store::{Collection, ConfigStore, ConfigValue, Error, Result};

/// Wraps a store and injects item-level or store-level failures.
///
/// ```
/// use cfgsync_store::{ConfigStore, MemoryStore};
/// use cfgsync_test_utils::FaultyStore;
///
/// let store = FaultyStore::new(MemoryStore::new()).offline();
/// assert!(store.list_all(None).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct FaultyStore {
    inner: Arc<dyn ConfigStore>,
    unreadable: Arc<BTreeSet<String>>,
    offline: bool,
}

impl FaultyStore {
    pub fn new(inner: impl ConfigStore + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
            unreadable: Arc::new(BTreeSet::new()),
            offline: false,
        }
    }

    /// Reading `name`, in any collection, fails with a parse error.
    pub fn with_unreadable(mut self, name: &str) -> Self {
        Arc::make_mut(&mut self.unreadable).insert(name.to_string());
        self
    }

    /// Every operation fails with `Error::Unavailable`.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    fn check_online(&self) -> Result<()> {
        if self.offline {
            return Err(Error::unavailable("faulty", "backend offline"));
        }
        Ok(())
    }
}

impl ConfigStore for FaultyStore {
    fn collection(&self) -> &Collection {
        self.inner.collection()
    }

    fn read(&self, name: &str) -> Result<Option<ConfigValue>> {
        self.check_online()?;
        if self.unreadable.contains(name) {
            return Err(Error::ConfigParse {
                name: name.to_string(),
                format: "YAML".to_string(),
                message: "corrupt item".to_string(),
            });
        }
        self.inner.read(name)
    }

    fn write(&self, name: &str, value: &ConfigValue) -> Result<()> {
        self.check_online()?;
        self.inner.write(name, value)
    }

    fn delete(&self, name: &str) -> Result<bool> {
        self.check_online()?;
        self.inner.delete(name)
    }

    fn delete_all(&self, prefix: Option<&str>) -> Result<()> {
        self.check_online()?;
        self.inner.delete_all(prefix)
    }

    fn list_all(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        self.check_online()?;
        self.inner.list_all(prefix)
    }

    fn list_collections(&self) -> Result<Vec<Collection>> {
        self.check_online()?;
        self.inner.list_collections()
    }

    fn with_collection(&self, collection: &Collection) -> Box<dyn ConfigStore> {
        Box::new(Self {
            inner: Arc::from(self.inner.with_collection(collection)),
            unreadable: self.unreadable.clone(),
            offline: self.offline,
        })
    }

    fn exists(&self, name: &str) -> Result<bool> {
        self.check_online()?;
        self.inner.exists(name)
    }
}
