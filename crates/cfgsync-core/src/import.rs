//! Commit of staged configuration into active

use serde::{Deserialize, Serialize};

use cfgsync_store::ConfigStore;

use crate::Result;
use crate::changelist::{ChangelistComputer, Scope};
use crate::snapshot::SnapshotReport;

/// What a commit changed in active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub renamed: Vec<String>,
    pub deleted: Vec<String>,
    /// Staged items that could not be read and were left out
    pub issues: Vec<String>,
    /// Snapshot taken after the commit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotReport>,
}

impl ImportReport {
    /// Number of items changed in active.
    pub fn changed(&self) -> usize {
        self.created.len() + self.updated.len() + self.renamed.len() + self.deleted.len()
    }
}

/// Make `active` match `staging`, every collection included.
///
/// Creates go dependency-first and deletes referrer-first, so a store that
/// enforces dependencies never sees a dangling reference.
pub fn commit_staging(
    computer: &ChangelistComputer,
    staging: &dyn ConfigStore,
    active: &dyn ConfigStore,
) -> Result<ImportReport> {
    let changes = computer.compute_all(staging, active, &Scope::All)?;
    let mut report = ImportReport {
        issues: changes.issues().iter().map(ToString::to_string).collect(),
        ..ImportReport::default()
    };

    for changelist in changes.iter() {
        let collection = &changelist.collection;
        let staged = staging.with_collection(collection);
        let target = active.with_collection(collection);

        for name in &changelist.create {
            if let Some(value) = staged.read(name)? {
                target.write(name, &value)?;
                report.created.push(collection.qualify(name));
            }
        }
        for name in &changelist.update {
            if let Some(value) = staged.read(name)? {
                target.write(name, &value)?;
                report.updated.push(collection.qualify(name));
            }
        }
        for rename in &changelist.rename {
            if let Some(value) = staged.read(&rename.to)? {
                target.write(&rename.to, &value)?;
                target.delete(&rename.from)?;
                report.renamed.push(collection.qualify(&rename.to));
            }
        }
        for name in &changelist.delete {
            target.delete(name)?;
            report.deleted.push(collection.qualify(name));
        }
    }

    tracing::info!(changed = report.changed(), "Committed staging to active");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgsync_store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn active_matches_staging_after_commit() {
        let staging = MemoryStore::from_items([
            ("a", json!({"v": 2})),
            ("b", json!({"dependencies": {"config": ["c"]}})),
            ("c", json!({})),
        ])
        .unwrap();
        let active = MemoryStore::from_items([("a", json!({"v": 1})), ("gone", json!({}))]).unwrap();

        let report = commit_staging(&ChangelistComputer::default(), &staging, &active).unwrap();

        assert_eq!(report.created, vec!["c", "b"]);
        assert_eq!(report.updated, vec!["a"]);
        assert_eq!(report.deleted, vec!["gone"]);
        assert_eq!(active.list_all(None).unwrap(), vec!["a", "b", "c"]);
        assert_eq!(active.read("a").unwrap(), Some(json!({"v": 2})));
    }

    #[test]
    fn renamed_item_moves_in_active() {
        let staging = MemoryStore::from_items([("new", json!({"uuid": "u", "v": 1}))]).unwrap();
        let active = MemoryStore::from_items([("old", json!({"uuid": "u", "v": 1}))]).unwrap();

        let report = commit_staging(&ChangelistComputer::default(), &staging, &active).unwrap();
        assert_eq!(report.renamed, vec!["new"]);
        assert_eq!(active.list_all(None).unwrap(), vec!["new"]);
    }
}
