//! In-memory store

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::store::{Collection, ConfigStore, ConfigValue, validate_name};
use crate::{Error, Result};

type Collections = BTreeMap<Collection, BTreeMap<String, ConfigValue>>;

/// A store kept entirely in memory.
///
/// Cloning a `MemoryStore` (or calling [`ConfigStore::with_collection`])
/// yields a handle onto the same data, so a staging store handed to the
/// engine can be inspected afterwards by the caller.
#[derive(Clone, Default)]
pub struct MemoryStore {
    label: String,
    data: Arc<RwLock<Collections>>,
    collection: Collection,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with a label used in error messages and logs.
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Create a store from `(name, value)` pairs in the default collection.
    pub fn from_items<I, S>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ConfigValue)>,
        S: AsRef<str>,
    {
        let store = Self::new();
        for (name, value) in items {
            store.write(name.as_ref(), &value)?;
        }
        Ok(store)
    }

    /// Total number of items across all collections.
    pub fn len(&self) -> usize {
        self.read_guard()
            .map(|data| data.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    /// Whether the store holds no items at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn label(&self) -> &str {
        if self.label.is_empty() {
            "memory"
        } else {
            &self.label
        }
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, Collections>> {
        self.data
            .read()
            .map_err(|_| Error::unavailable(self.label(), "store lock poisoned"))
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, Collections>> {
        self.data
            .write()
            .map_err(|_| Error::unavailable(self.label(), "store lock poisoned"))
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("label", &self.label())
            .field("collection", &self.collection)
            .field("items", &self.len())
            .finish()
    }
}

impl ConfigStore for MemoryStore {
    fn collection(&self) -> &Collection {
        &self.collection
    }

    fn read(&self, name: &str) -> Result<Option<ConfigValue>> {
        let data = self.read_guard()?;
        Ok(data
            .get(&self.collection)
            .and_then(|items| items.get(name))
            .cloned())
    }

    fn exists(&self, name: &str) -> Result<bool> {
        let data = self.read_guard()?;
        Ok(data
            .get(&self.collection)
            .is_some_and(|items| items.contains_key(name)))
    }

    fn write(&self, name: &str, value: &ConfigValue) -> Result<()> {
        validate_name(name)?;
        let mut data = self.write_guard()?;
        data.entry(self.collection.clone())
            .or_default()
            .insert(name.to_string(), value.clone());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<bool> {
        let mut data = self.write_guard()?;
        Ok(data
            .get_mut(&self.collection)
            .is_some_and(|items| items.remove(name).is_some()))
    }

    fn delete_all(&self, prefix: Option<&str>) -> Result<()> {
        let mut data = self.write_guard()?;
        if let Some(items) = data.get_mut(&self.collection) {
            match prefix {
                Some(prefix) => items.retain(|name, _| !name.starts_with(prefix)),
                None => items.clear(),
            }
        }
        Ok(())
    }

    fn list_all(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let data = self.read_guard()?;
        Ok(data
            .get(&self.collection)
            .map(|items| {
                items
                    .keys()
                    .filter(|name| prefix.is_none_or(|p| name.starts_with(p)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_collections(&self) -> Result<Vec<Collection>> {
        let data = self.read_guard()?;
        Ok(data
            .iter()
            .filter(|(collection, items)| !collection.is_default() && !items.is_empty())
            .map(|(collection, _)| collection.clone())
            .collect())
    }

    fn with_collection(&self, collection: &Collection) -> Box<dyn ConfigStore> {
        Box::new(Self {
            label: self.label.clone(),
            data: Arc::clone(&self.data),
            collection: collection.clone(),
        })
    }
}
