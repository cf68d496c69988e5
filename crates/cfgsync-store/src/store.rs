//! The storage contract shared by every store

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One configuration item's full content.
///
/// Mappings keep their insertion order (the workspace enables
/// `serde_json/preserve_order`), equality ignores it.
pub type ConfigValue = serde_json::Value;

/// Characters that may not appear in an item name.
const INVALID_NAME_CHARS: &[char] = &[':', '?', '*', '<', '>', '"', '\'', '/', '\\'];

/// Maximum item name length.
const MAX_NAME_LENGTH: usize = 250;

/// Name of a store partition.
///
/// The default collection has an empty name. Named collections hold
/// overrides, e.g. `language.fr`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection(String);

impl Collection {
    /// Create a collection handle. An empty name is the default collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The default collection.
    pub fn default_collection() -> Self {
        Self(String::new())
    }

    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Qualify an item name with this collection.
    ///
    /// Items in the default collection keep their bare name, others become
    /// `collection/name`.
    pub fn qualify(&self, name: &str) -> String {
        if self.is_default() {
            name.to_string()
        } else {
            format!("{}/{}", self.0, name)
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            write!(f, "default")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<&str> for Collection {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A key-value store of named configuration items.
///
/// A store handle is scoped to one collection; [`ConfigStore::with_collection`]
/// returns a handle onto another collection of the same backing storage.
/// Writes go through `&self`: implementations share their backing state
/// between collection views.
pub trait ConfigStore: Send + Sync + fmt::Debug {
    /// Collection this handle is scoped to.
    fn collection(&self) -> &Collection;

    /// Read one item. `Ok(None)` when the item does not exist.
    fn read(&self, name: &str) -> Result<Option<ConfigValue>>;

    /// Create or replace one item.
    fn write(&self, name: &str, value: &ConfigValue) -> Result<()>;

    /// Delete one item. Returns whether it existed.
    fn delete(&self, name: &str) -> Result<bool>;

    /// Delete every item of this collection whose name starts with `prefix`
    /// (all items when `prefix` is `None`).
    fn delete_all(&self, prefix: Option<&str>) -> Result<()>;

    /// List item names of this collection, sorted.
    fn list_all(&self, prefix: Option<&str>) -> Result<Vec<String>>;

    /// List the named (non-default) collections that hold at least one item,
    /// sorted.
    fn list_collections(&self) -> Result<Vec<Collection>>;

    /// A view of the same storage scoped to `collection`.
    fn with_collection(&self, collection: &Collection) -> Box<dyn ConfigStore>;

    /// Whether an item exists.
    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.read(name)?.is_some())
    }
}

/// Validate an item name before it is used as a storage key.
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(invalid("name is longer than 250 characters"));
    }
    if let Some(c) = name.chars().find(|c| INVALID_NAME_CHARS.contains(c) || c.is_whitespace()) {
        return Err(invalid(&format!("contains invalid character {:?}", c)));
    }
    Ok(())
}

/// The default collection followed by every named collection of `store`.
pub fn collections_with_default(store: &dyn ConfigStore) -> Result<Vec<Collection>> {
    let mut collections = vec![Collection::default_collection()];
    collections.extend(
        store
            .list_collections()?
            .into_iter()
            .filter(|c| !c.is_default()),
    );
    Ok(collections)
}
