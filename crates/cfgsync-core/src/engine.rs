//! ConfigSync engine
//!
//! The engine wires the stores and the extension registry to the changelist,
//! safety, merge, snapshot and staging components and exposes the operations
//! a front end drives.

use std::sync::Arc;

use cfgsync_extensions::{ExtensionKind, ExtensionRegistry};
use cfgsync_store::{ConfigStore, MemoryStore};

use crate::Result;
use crate::changelist::ChangeSet;
use crate::config::SyncSettings;
use crate::import::{ImportReport, commit_staging};
use crate::initializer::{InitOptions, ReconciliationInitializer};
use crate::lister::{ChangeLister, FullChangelist};
use crate::report::ReconcileReport;
use crate::snapshot::{SnapshotManager, SnapshotPair, SnapshotReport};

/// The stores an engine works on.
#[derive(Debug, Clone)]
pub struct SyncStores {
    /// Configuration the running system uses
    pub active: Arc<dyn ConfigStore>,
    /// Where reconciled values are written for review
    pub staging: Arc<dyn ConfigStore>,
    /// State as of the last sync
    pub snapshot: SnapshotPair,
}

impl SyncStores {
    /// Empty in-memory stores.
    pub fn in_memory() -> Self {
        Self {
            active: Arc::new(MemoryStore::labelled("active")),
            staging: Arc::new(MemoryStore::labelled("staging")),
            snapshot: SnapshotPair::in_memory(),
        }
    }
}

/// Reconciles extension-provided configuration with active configuration.
#[derive(Debug, Clone)]
pub struct ConfigSync {
    lister: ChangeLister,
    initializer: ReconciliationInitializer,
    snapshots: SnapshotManager,
}

impl ConfigSync {
    pub fn new(
        stores: SyncStores,
        registry: Arc<dyn ExtensionRegistry>,
        settings: &SyncSettings,
    ) -> Self {
        let lister = ChangeLister::new(
            settings,
            stores.active.clone(),
            stores.snapshot.clone(),
            registry,
        );
        Self {
            initializer: ReconciliationInitializer::new(settings, lister.clone(), stores.staging),
            snapshots: SnapshotManager::new(stores.snapshot, stores.active),
            lister,
        }
    }

    pub fn active(&self) -> &Arc<dyn ConfigStore> {
        self.lister.active()
    }

    pub fn staging(&self) -> &Arc<dyn ConfigStore> {
        self.initializer.staging()
    }

    pub fn snapshot(&self) -> &SnapshotPair {
        self.lister.snapshot()
    }

    /// Seed staging and stage the pending changes of every enabled extension.
    pub fn initialize_all(&self, safe_only: bool) -> Result<ReconcileReport> {
        self.initialize_all_with(&InitOptions::safe_only(safe_only))
    }

    pub fn initialize_all_with(&self, options: &InitOptions) -> Result<ReconcileReport> {
        let mut report = self.initializer.seed()?.into_report();
        let drift = self.lister.drift_if(options.safe_only)?;

        for extension in self.lister.registry().all_enabled() {
            let Some(provided) = &extension.config else {
                continue;
            };
            let listing = self.lister.extension_listing(&extension, drift.as_ref())?;
            report = report.merge(self.initializer.apply(provided.as_ref(), &listing, options)?);
        }

        tracing::info!(
            status = %report.status,
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            conflicted = report.conflicted.len(),
            "Initialized staging for all extensions"
        );
        Ok(report)
    }

    /// Seed staging and stage the pending changes of one extension.
    pub fn initialize_extension(
        &self,
        kind: ExtensionKind,
        id: &str,
        safe_only: bool,
    ) -> Result<ReconcileReport> {
        self.initialize_extension_with(kind, id, &InitOptions::safe_only(safe_only))
    }

    pub fn initialize_extension_with(
        &self,
        kind: ExtensionKind,
        id: &str,
        options: &InitOptions,
    ) -> Result<ReconcileReport> {
        let extension = self.lister.enabled_extension(kind, id)?;
        let mut report = self.initializer.seed()?.into_report();

        let Some(provided) = &extension.config else {
            report.warn(format!("{} ships no configuration", extension.reference()));
            return Ok(report);
        };
        let drift = self.lister.drift_if(options.safe_only)?;
        let listing = self.lister.extension_listing(&extension, drift.as_ref())?;
        let report = report.merge(self.initializer.apply(provided.as_ref(), &listing, options)?);

        tracing::info!(
            extension = %extension.reference(),
            status = %report.status,
            applied = report.applied.len(),
            "Initialized staging for extension"
        );
        Ok(report)
    }

    /// Pending changes of every enabled extension, by kind and id.
    pub fn full_changelist(&self, safe_only: bool) -> Result<FullChangelist> {
        self.lister.full_changelist(safe_only)
    }

    /// Pending changes of one enabled extension.
    pub fn extension_changelist(
        &self,
        kind: ExtensionKind,
        id: &str,
        safe_only: bool,
    ) -> Result<ChangeSet> {
        self.lister.extension_changelist(kind, id, safe_only)
    }

    /// Rebuild the snapshot from every enabled extension.
    pub fn create_full_snapshot(&self) -> Result<SnapshotReport> {
        self.snapshots.snapshot_full(self.lister.registry().as_ref())
    }

    /// Refresh the snapshot entries of one enabled extension.
    pub fn create_extension_snapshot(&self, kind: ExtensionKind, id: &str) -> Result<SnapshotReport> {
        let extension = self.lister.enabled_extension(kind, id)?;
        self.snapshots.snapshot_extension(&extension)
    }

    pub fn delete_snapshot(&self) -> Result<()> {
        self.snapshots.clear()
    }

    /// Commit staging to active, then take a full snapshot.
    pub fn import_staging(&self) -> Result<ImportReport> {
        let mut report = commit_staging(
            self.lister.computer(),
            self.staging().as_ref(),
            self.active().as_ref(),
        )?;
        report.snapshot = Some(self.create_full_snapshot()?);
        Ok(report)
    }
}
