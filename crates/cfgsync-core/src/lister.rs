//! Pending changes between extension-provided and active configuration

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use cfgsync_extensions::{Extension, ExtensionKind, ExtensionRegistry};
use cfgsync_store::ConfigStore;

use crate::changelist::{ChangeSet, ChangelistComputer, Scope};
use crate::config::{ProviderSettings, SyncSettings};
use crate::safety::{BlockedChange, SafetyClassifier, filter_with_drift};
use crate::snapshot::SnapshotPair;
use crate::{Error, Result};

/// Pending changes per extension kind and id.
pub type FullChangelist = BTreeMap<ExtensionKind, BTreeMap<String, ChangeSet>>;

/// Creates and updates one upstream store would bring to active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub changes: ChangeSet,
    /// Changes the safety filter held back
    pub blocked: Vec<BlockedChange>,
    /// Qualified names of creates whose provider is not enabled
    pub unprovided: Vec<String>,
}

/// Lists pending changes for enabled extensions.
#[derive(Clone)]
pub struct ChangeLister {
    computer: ChangelistComputer,
    classifier: SafetyClassifier,
    providers: ProviderSettings,
    active: Arc<dyn ConfigStore>,
    snapshot: SnapshotPair,
    registry: Arc<dyn ExtensionRegistry>,
}

impl std::fmt::Debug for ChangeLister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeLister")
            .field("active", &self.active)
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

impl ChangeLister {
    pub fn new(
        settings: &SyncSettings,
        active: Arc<dyn ConfigStore>,
        snapshot: SnapshotPair,
        registry: Arc<dyn ExtensionRegistry>,
    ) -> Self {
        let computer = ChangelistComputer::from_settings(settings);
        Self {
            classifier: SafetyClassifier::new(computer.clone()),
            computer,
            providers: settings.providers.clone(),
            active,
            snapshot,
            registry,
        }
    }

    pub fn active(&self) -> &Arc<dyn ConfigStore> {
        &self.active
    }

    pub fn snapshot(&self) -> &SnapshotPair {
        &self.snapshot
    }

    pub fn registry(&self) -> &Arc<dyn ExtensionRegistry> {
        &self.registry
    }

    pub fn computer(&self) -> &ChangelistComputer {
        &self.computer
    }

    /// Changes the site made since the last snapshot.
    pub fn drift(&self) -> Result<ChangeSet> {
        self.classifier.drift(&self.snapshot, self.active.as_ref())
    }

    /// The drift when the safety filter is on.
    pub fn drift_if(&self, safe_only: bool) -> Result<Option<ChangeSet>> {
        if safe_only {
            self.drift().map(Some)
        } else {
            Ok(None)
        }
    }

    /// An enabled extension, or `UnknownExtension`.
    pub fn enabled_extension(&self, kind: ExtensionKind, id: &str) -> Result<Extension> {
        self.registry
            .extension(kind, id)
            .ok_or_else(|| Error::unknown_extension(kind, id))
    }

    /// Pending changes for every enabled extension that has any.
    pub fn full_changelist(&self, safe_only: bool) -> Result<FullChangelist> {
        let drift = self.drift_if(safe_only)?;
        let mut full = FullChangelist::new();
        for kind in ExtensionKind::ALL {
            for extension in self.registry.enabled_extensions(kind) {
                let listing = self.extension_listing(&extension, drift.as_ref())?;
                if !listing.changes.is_empty() {
                    full.entry(kind)
                        .or_default()
                        .insert(extension.id.clone(), listing.changes);
                }
            }
        }
        Ok(full)
    }

    /// Pending changes for one enabled extension.
    pub fn extension_changelist(
        &self,
        kind: ExtensionKind,
        id: &str,
        safe_only: bool,
    ) -> Result<ChangeSet> {
        let extension = self.enabled_extension(kind, id)?;
        let drift = self.drift_if(safe_only)?;
        Ok(self.extension_listing(&extension, drift.as_ref())?.changes)
    }

    /// Pending changes for the items `extension` ships.
    pub fn extension_listing(
        &self,
        extension: &Extension,
        drift: Option<&ChangeSet>,
    ) -> Result<Listing> {
        match &extension.config {
            Some(provided) => self.list_store(provided.as_ref(), &Scope::SourceNames, drift),
            None => Ok(Listing::default()),
        }
    }

    /// Creates and updates that would bring `upstream` into active.
    ///
    /// Creates from providers that are not enabled are dropped. With a drift
    /// the safety filter is applied.
    pub fn list_store(
        &self,
        upstream: &dyn ConfigStore,
        scope: &Scope,
        drift: Option<&ChangeSet>,
    ) -> Result<Listing> {
        let computed = self
            .computer
            .compute_all(upstream, self.active.as_ref(), scope)?;

        let enabled = self.enabled_providers();
        let mut unprovided = Vec::new();
        let changes: ChangeSet = computed
            .into_iter()
            .map(|mut changelist| {
                // Only creates and updates flow from upstream.
                changelist.delete.clear();
                changelist.rename.clear();
                if self.providers.require_enabled {
                    let collection = changelist.collection.clone();
                    changelist.create.retain(|name| {
                        let provided = enabled.contains(provider_of(name));
                        if !provided {
                            tracing::debug!(item = %name, "Provider not enabled, dropping create");
                            unprovided.push(collection.qualify(name));
                        }
                        provided
                    });
                }
                changelist
            })
            .collect();

        let listing = match drift {
            Some(drift) => {
                let safe = filter_with_drift(&changes, drift);
                Listing {
                    changes: safe.changes,
                    blocked: safe.blocked,
                    unprovided,
                }
            }
            None => Listing {
                changes,
                blocked: Vec::new(),
                unprovided,
            },
        };
        Ok(Listing {
            changes: listing.changes.prune(),
            ..listing
        })
    }

    fn enabled_providers(&self) -> BTreeSet<String> {
        let mut enabled = self.registry.enabled_ids();
        enabled.extend(self.providers.always_enabled.iter().cloned());
        enabled
    }
}

/// The extension an item name belongs to: everything before the first dot.
/// A name without a dot has no provider.
fn provider_of(name: &str) -> &str {
    name.split_once('.').map(|(provider, _)| provider).unwrap_or("")
}
