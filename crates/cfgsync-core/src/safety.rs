//! Classification of pending changes as safe to apply unattended
//!
//! The snapshot records each item as it was left by the last sync. Comparing
//! that baseline with active configuration shows what the site changed on its
//! own since (the drift). A pending create is unsafe when the site deleted or
//! renamed the item, a pending update is unsafe when the site customized it.
//! Deletes and renames are never filtered.

use std::fmt;

use serde::{Deserialize, Serialize};

use cfgsync_store::{Collection, ConfigStore};

use crate::Result;
use crate::changelist::{ChangeOp, ChangeSet, Changelist, ChangelistComputer, Scope};
use crate::snapshot::SnapshotPair;

/// Why a pending change was held back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// The site deleted the item after it was last synced.
    LocallyDeleted,
    /// The site renamed the item after it was last synced.
    RenamedAway,
    /// The site changed the item after it was last synced.
    Customized,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::LocallyDeleted => "deleted locally",
            Self::RenamedAway => "renamed locally",
            Self::Customized => "customized locally",
        };
        write!(f, "{}", reason)
    }
}

/// A pending change the classifier held back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedChange {
    pub collection: Collection,
    pub name: String,
    pub op: ChangeOp,
    pub reason: BlockReason,
}

impl BlockedChange {
    pub fn qualified_name(&self) -> String {
        self.collection.qualify(&self.name)
    }
}

/// The safe subset of a change set and what was removed from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeChanges {
    pub changes: ChangeSet,
    pub blocked: Vec<BlockedChange>,
}

/// Reduces pending creates and updates to those that cannot overwrite a
/// local customization.
#[derive(Debug, Clone, Default)]
pub struct SafetyClassifier {
    computer: ChangelistComputer,
}

impl SafetyClassifier {
    pub fn new(computer: ChangelistComputer) -> Self {
        Self { computer }
    }

    /// Changes the site made since the snapshot, in every collection.
    pub fn drift(&self, snapshot: &SnapshotPair, active: &dyn ConfigStore) -> Result<ChangeSet> {
        let baseline = snapshot.baseline(self.computer.differ())?;
        // Active is the source: an item the site deleted shows as a delete.
        self.computer.compute_all(active, &baseline, &Scope::All)
    }

    /// Filter `pending` against the drift between `snapshot` and `active`.
    pub fn filter_safe(
        &self,
        pending: &ChangeSet,
        snapshot: &SnapshotPair,
        active: &dyn ConfigStore,
    ) -> Result<SafeChanges> {
        let drift = self.drift(snapshot, active)?;
        Ok(filter_with_drift(pending, &drift))
    }
}

/// Filter `pending` against a drift computed earlier.
///
/// Output sequences are subsets of the input sequences in the same order.
pub fn filter_with_drift(pending: &ChangeSet, drift: &ChangeSet) -> SafeChanges {
    let mut safe = SafeChanges::default();
    let no_drift = Changelist::default();

    for changelist in pending.iter() {
        let drifted = drift
            .collection(&changelist.collection)
            .unwrap_or(&no_drift);
        let mut kept = changelist.clone();

        kept.create.retain(|name| {
            let reason = if drifted.delete.contains(name) {
                Some(BlockReason::LocallyDeleted)
            } else if drifted.is_rename_source(name) {
                Some(BlockReason::RenamedAway)
            } else {
                None
            };
            record(&mut safe.blocked, changelist, name, ChangeOp::Create, reason)
        });

        kept.update.retain(|name| {
            let reason = drifted
                .update
                .contains(name)
                .then_some(BlockReason::Customized);
            record(&mut safe.blocked, changelist, name, ChangeOp::Update, reason)
        });

        safe.changes.push(kept);
    }

    if !safe.blocked.is_empty() {
        tracing::debug!(blocked = safe.blocked.len(), "Held back unsafe changes");
    }
    safe
}

/// Record a block, returning whether the entry is kept.
fn record(
    blocked: &mut Vec<BlockedChange>,
    changelist: &Changelist,
    name: &str,
    op: ChangeOp,
    reason: Option<BlockReason>,
) -> bool {
    match reason {
        Some(reason) => {
            blocked.push(BlockedChange {
                collection: changelist.collection.clone(),
                name: name.to_string(),
                op,
                reason,
            });
            false
        }
        None => true,
    }
}
