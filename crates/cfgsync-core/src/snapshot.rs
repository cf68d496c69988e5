//! Snapshot of extension-provided configuration as last synchronized
//!
//! The snapshot is two stores. The upstream snapshot holds each item as the
//! extension shipped it, the active snapshot holds the same item as it was
//! active at that moment. Together they are the ancestor for merges and the
//! baseline for detecting local customization.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cfgsync_content::ConfigDiffer;
use cfgsync_extensions::{Extension, ExtensionRegistry};
use cfgsync_store::{ConfigStore, MemoryStore, collections_with_default};

use crate::Result;

/// The upstream and active snapshot stores.
#[derive(Debug, Clone)]
pub struct SnapshotPair {
    pub upstream: Arc<dyn ConfigStore>,
    pub active: Arc<dyn ConfigStore>,
}

impl SnapshotPair {
    pub fn new(upstream: Arc<dyn ConfigStore>, active: Arc<dyn ConfigStore>) -> Self {
        Self { upstream, active }
    }

    /// A pair of empty in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::labelled("snapshot-upstream")),
            Arc::new(MemoryStore::labelled("snapshot-active")),
        )
    }

    /// Whether nothing has been snapshotted yet.
    pub fn is_empty(&self) -> Result<bool> {
        for collection in collections_with_default(self.upstream.as_ref())? {
            if !self
                .upstream
                .with_collection(&collection)
                .list_all(None)?
                .is_empty()
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The state each snapshotted item was left in by the last sync.
    ///
    /// Per item this is the active-snapshot value when it matches the
    /// upstream-snapshot value, so it keeps the identity the site assigned,
    /// and the upstream-snapshot value otherwise.
    pub fn baseline(&self, differ: &ConfigDiffer) -> Result<MemoryStore> {
        let baseline = MemoryStore::labelled("snapshot-baseline");
        for collection in collections_with_default(self.upstream.as_ref())? {
            let upstream = self.upstream.with_collection(&collection);
            let active = self.active.with_collection(&collection);
            let target = baseline.with_collection(&collection);

            for name in upstream.list_all(None)? {
                let Some(shipped) = read_or_skip(upstream.as_ref(), &name)? else {
                    continue;
                };
                let value = match read_or_skip(active.as_ref(), &name)? {
                    Some(recorded) if differ.same(&recorded, &shipped) => recorded,
                    _ => shipped,
                };
                target.write(&name, &value)?;
            }
        }
        Ok(baseline)
    }

    fn clear(&self) -> Result<()> {
        for store in [&self.upstream, &self.active] {
            for collection in collections_with_default(store.as_ref())? {
                store.with_collection(&collection).delete_all(None)?;
            }
        }
        Ok(())
    }
}

/// What a snapshot run recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotReport {
    pub taken_at: DateTime<Utc>,
    /// `kind:id` of every extension snapshotted
    pub extensions: Vec<String>,
    /// Items written to the upstream snapshot
    pub items: usize,
    /// Items that could not be read and were left out
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

impl SnapshotReport {
    fn new() -> Self {
        Self {
            taken_at: Utc::now(),
            extensions: Vec::new(),
            items: 0,
            skipped: Vec::new(),
        }
    }

    fn absorb(&mut self, other: SnapshotReport) {
        self.extensions.extend(other.extensions);
        self.items += other.items;
        self.skipped.extend(other.skipped);
    }
}

/// Owns the snapshot pair and refreshes it after a reconciliation.
///
/// Run only after staged changes have been committed to active.
#[derive(Debug, Clone)]
pub struct SnapshotManager {
    pair: SnapshotPair,
    active: Arc<dyn ConfigStore>,
}

impl SnapshotManager {
    pub fn new(pair: SnapshotPair, active: Arc<dyn ConfigStore>) -> Self {
        Self { pair, active }
    }

    pub fn pair(&self) -> &SnapshotPair {
        &self.pair
    }

    /// Record every item `extension` provides, in every collection.
    pub fn snapshot_extension(&self, extension: &Extension) -> Result<SnapshotReport> {
        let mut report = SnapshotReport::new();
        report.extensions.push(extension.reference().to_string());

        let Some(provided) = &extension.config else {
            tracing::debug!(extension = %extension.reference(), "No configuration to snapshot");
            return Ok(report);
        };

        for collection in collections_with_default(provided.as_ref())? {
            let provided = provided.with_collection(&collection);
            let upstream_snapshot = self.pair.upstream.with_collection(&collection);
            let active_snapshot = self.pair.active.with_collection(&collection);
            let active = self.active.with_collection(&collection);

            for name in provided.list_all(None)? {
                let Some(shipped) = read_or_skip(provided.as_ref(), &name)? else {
                    report.skipped.push(collection.qualify(&name));
                    continue;
                };
                upstream_snapshot.write(&name, &shipped)?;
                report.items += 1;

                match read_or_skip(active.as_ref(), &name)? {
                    Some(current) => active_snapshot.write(&name, &current)?,
                    None => {
                        active_snapshot.delete(&name)?;
                    }
                }
            }
        }

        tracing::debug!(
            extension = %extension.reference(),
            items = report.items,
            "Snapshotted extension"
        );
        Ok(report)
    }

    /// Clear both stores, then snapshot every enabled extension.
    pub fn snapshot_full(&self, registry: &dyn ExtensionRegistry) -> Result<SnapshotReport> {
        self.clear()?;
        let mut report = SnapshotReport::new();
        for extension in registry.all_enabled() {
            report.absorb(self.snapshot_extension(&extension)?);
        }
        tracing::info!(
            extensions = report.extensions.len(),
            items = report.items,
            "Full snapshot taken"
        );
        Ok(report)
    }

    /// Delete every entry, in every collection, of both stores.
    pub fn clear(&self) -> Result<()> {
        self.pair.clear()?;
        tracing::info!("Snapshot cleared");
        Ok(())
    }
}

/// Read an item, treating an undecodable one as absent.
fn read_or_skip(store: &dyn ConfigStore, name: &str) -> Result<Option<serde_json::Value>> {
    match store.read(name) {
        Ok(value) => Ok(value),
        Err(e) if e.is_item_level() => {
            tracing::warn!(item = %name, error = %e, "Skipping unreadable item");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
