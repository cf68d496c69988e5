//! Registry of enabled extensions.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use cfgsync_store::ConfigStore;

use crate::kind::{ExtensionKind, ExtensionRef};

/// An enabled extension and the configuration it ships, if any.
#[derive(Clone)]
pub struct Extension {
    /// Extension kind.
    pub kind: ExtensionKind,
    /// Machine name.
    pub id: String,
    /// Store over the extension's shipped configuration.
    pub config: Option<Arc<dyn ConfigStore>>,
}

impl Extension {
    /// An extension that ships no configuration.
    pub fn new(kind: ExtensionKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            config: None,
        }
    }

    /// Attach the store holding this extension's shipped configuration.
    pub fn with_config(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.config = Some(store);
        self
    }

    pub fn reference(&self) -> ExtensionRef {
        ExtensionRef::new(self.kind, self.id.clone())
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("provides_config", &self.config.is_some())
            .finish()
    }
}

/// Source of truth for which extensions are enabled.
pub trait ExtensionRegistry: Send + Sync {
    /// Enabled extensions of one kind, sorted by id.
    fn enabled_extensions(&self, kind: ExtensionKind) -> Vec<Extension>;

    /// Look up one enabled extension.
    fn extension(&self, kind: ExtensionKind, id: &str) -> Option<Extension> {
        self.enabled_extensions(kind)
            .into_iter()
            .find(|ext| ext.id == id)
    }

    /// Every enabled extension, kinds in [`ExtensionKind::ALL`] order.
    fn all_enabled(&self) -> Vec<Extension> {
        ExtensionKind::ALL
            .iter()
            .flat_map(|kind| self.enabled_extensions(*kind))
            .collect()
    }

    /// Machine names of every enabled extension, regardless of kind.
    fn enabled_ids(&self) -> BTreeSet<String> {
        self.all_enabled().into_iter().map(|ext| ext.id).collect()
    }
}

/// Registry populated in code.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    entries: BTreeMap<ExtensionRef, Extension>,
}

impl StaticRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension. Replaces an existing entry with the same kind and id.
    pub fn register(&mut self, extension: Extension) {
        self.entries.insert(extension.reference(), extension);
    }

    /// Builder form of [`StaticRegistry::register`].
    pub fn with(mut self, extension: Extension) -> Self {
        self.register(extension);
        self
    }

    /// Remove an extension, returning it if it was registered.
    pub fn unregister(&mut self, kind: ExtensionKind, id: &str) -> Option<Extension> {
        self.entries.remove(&ExtensionRef::new(kind, id))
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ExtensionRegistry for StaticRegistry {
    fn enabled_extensions(&self, kind: ExtensionKind) -> Vec<Extension> {
        self.entries
            .values()
            .filter(|ext| ext.kind == kind)
            .cloned()
            .collect()
    }

    fn extension(&self, kind: ExtensionKind, id: &str) -> Option<Extension> {
        self.entries.get(&ExtensionRef::new(kind, id)).cloned()
    }
}
