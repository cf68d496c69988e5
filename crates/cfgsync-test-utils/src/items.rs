//! In-memory fixtures.

use std::sync::Arc;

use cfgsync_extensions::{Extension, ExtensionKind};
use cfgsync_store::{ConfigStore, ConfigValue, MemoryStore};
use serde_json::Value;

/// A labelled in-memory store holding `items` in the default collection.
pub fn memory_store(label: &str, items: &[(&str, ConfigValue)]) -> MemoryStore {
    let store = MemoryStore::labelled(label);
    for (name, value) in items {
        store
            .write(name, value)
            .unwrap_or_else(|e| panic!("memory_store: cannot write {name}: {e}"));
    }
    store
}

/// An enabled module shipping `items`.
pub fn module(id: &str, items: &[(&str, ConfigValue)]) -> Extension {
    Extension::new(ExtensionKind::Module, id).with_config(Arc::new(memory_store(id, items)))
}

/// An enabled theme shipping `items`.
pub fn theme(id: &str, items: &[(&str, ConfigValue)]) -> Extension {
    Extension::new(ExtensionKind::Theme, id).with_config(Arc::new(memory_store(id, items)))
}

/// `value` with `dependencies.config` set to `dependencies`.
///
/// # Panics
/// Panics if `value` is not a mapping.
pub fn with_dependencies(mut value: ConfigValue, dependencies: &[&str]) -> ConfigValue {
    let map = value
        .as_object_mut()
        .expect("with_dependencies: item must be a mapping");
    map.insert(
        "dependencies".to_string(),
        serde_json::json!({ "config": dependencies }),
    );
    value
}

/// Read an item that must exist.
///
/// # Panics
/// Panics if the item is missing or unreadable.
pub fn read_existing(store: &dyn ConfigStore, name: &str) -> Value {
    store
        .read(name)
        .unwrap_or_else(|e| panic!("read_existing: {name}: {e}"))
        .unwrap_or_else(|| panic!("read_existing: {name} does not exist"))
}
