//! Changelist computation between a source and a target store

use std::collections::{BTreeMap, BTreeSet};

use cfgsync_content::ConfigDiffer;
use cfgsync_content::value::{declared_dependencies, ensure_mapping, identity};
use cfgsync_store::{Collection, ConfigStore, ConfigValue, collections_with_default};

use super::ordering::{dependency_first, referrer_first};
use super::{ChangeSet, Changelist, IssueKind, ItemIssue, Rename};
use crate::Result;
use crate::config::SyncSettings;

/// Which names take part in a comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Scope {
    /// Every item of both stores.
    #[default]
    All,
    /// Items named `<namespace>.*` on both sides.
    Prefix(String),
    /// Every source item, and target items sharing a name with one.
    ///
    /// Nothing can be deleted or renamed under this scope.
    SourceNames,
}

/// Compares a source store with a target store.
///
/// The source is what the target should become: names only in the source
/// are creates, names only in the target are deletes.
#[derive(Debug, Clone)]
pub struct ChangelistComputer {
    differ: ConfigDiffer,
    identity_key: String,
    dependency_path: String,
}

impl Default for ChangelistComputer {
    fn default() -> Self {
        Self::from_settings(&SyncSettings::default())
    }
}

/// The items of one side that decoded cleanly.
#[derive(Default)]
struct Side {
    items: BTreeMap<String, ConfigValue>,
    dependencies: BTreeMap<String, Vec<String>>,
}

impl Side {
    fn names(&self) -> BTreeSet<String> {
        self.items.keys().cloned().collect()
    }

    fn forget(&mut self, name: &str) {
        self.items.remove(name);
        self.dependencies.remove(name);
    }
}

impl ChangelistComputer {
    pub fn new(
        differ: ConfigDiffer,
        identity_key: impl Into<String>,
        dependency_path: impl Into<String>,
    ) -> Self {
        Self {
            differ,
            identity_key: identity_key.into(),
            dependency_path: dependency_path.into(),
        }
    }

    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self::new(
            settings.differ(),
            settings.items.identity_key.clone(),
            settings.items.dependency_path.clone(),
        )
    }

    pub fn differ(&self) -> &ConfigDiffer {
        &self.differ
    }

    pub fn identity_key(&self) -> &str {
        &self.identity_key
    }

    pub fn dependency_path(&self) -> &str {
        &self.dependency_path
    }

    /// Compare every collection of both stores.
    ///
    /// Collections with nothing to report are left out.
    pub fn compute_all(
        &self,
        source: &dyn ConfigStore,
        target: &dyn ConfigStore,
        scope: &Scope,
    ) -> Result<ChangeSet> {
        let mut collections: BTreeSet<Collection> =
            collections_with_default(source)?.into_iter().collect();
        collections.extend(target.list_collections()?);

        let mut set = ChangeSet::new();
        for collection in collections {
            let source = source.with_collection(&collection);
            let target = target.with_collection(&collection);
            set.push(self.compute(source.as_ref(), target.as_ref(), scope)?);
        }
        Ok(set.prune())
    }

    /// Compare the collection `source` is scoped to with the same collection
    /// of `target`.
    pub fn compute(
        &self,
        source: &dyn ConfigStore,
        target: &dyn ConfigStore,
        scope: &Scope,
    ) -> Result<Changelist> {
        let mut changelist = Changelist::new(source.collection().clone());
        let mut malformed = BTreeSet::new();

        let (source_names, target_names) = scoped_names(source, target, scope)?;
        let mut source_side =
            self.load(source, source_names, &mut changelist.issues, &mut malformed)?;
        let mut target_side =
            self.load(target, target_names, &mut changelist.issues, &mut malformed)?;

        // A name that is broken on either side is left alone on both.
        for name in &malformed {
            source_side.forget(name);
            target_side.forget(name);
        }

        let in_source = source_side.names();
        let in_target = target_side.names();

        let mut create: BTreeSet<String> = in_source.difference(&in_target).cloned().collect();
        let mut delete: BTreeSet<String> = in_target.difference(&in_source).cloned().collect();
        changelist.update = in_source
            .intersection(&in_target)
            .filter(|name| {
                !self
                    .differ
                    .same(&source_side.items[name.as_str()], &target_side.items[name.as_str()])
            })
            .cloned()
            .collect();

        changelist.rename = self.detect_renames(&mut create, &mut delete, &source_side, &target_side);

        for name in create.iter().chain(&changelist.update) {
            for dependency in source_side.dependencies.get(name).into_iter().flatten() {
                if in_source.contains(dependency)
                    || in_target.contains(dependency)
                    || malformed.contains(dependency)
                {
                    continue;
                }
                if !present(source, dependency)? && !present(target, dependency)? {
                    tracing::warn!(item = %name, %dependency, "Declared dependency does not exist");
                    changelist
                        .issues
                        .push(ItemIssue::missing_dependency(name.clone(), dependency.clone()));
                }
            }
        }

        let creates = dependency_first(&create, &source_side.dependencies);
        let deletes = referrer_first(&delete, &target_side.dependencies);
        for name in creates.cycle.iter().chain(&deletes.cycle) {
            tracing::warn!(item = %name, "Dependency cycle, ordering lexically");
            changelist.issues.push(ItemIssue {
                name: name.clone(),
                kind: IssueKind::DependencyCycle,
            });
        }
        changelist.create = creates.order;
        changelist.delete = deletes.order;

        tracing::debug!(
            collection = %changelist.collection,
            create = changelist.create.len(),
            update = changelist.update.len(),
            delete = changelist.delete.len(),
            rename = changelist.rename.len(),
            issues = changelist.issues.len(),
            "Computed changelist"
        );
        Ok(changelist)
    }

    /// Pair deleted names with created names carrying the same identity.
    fn detect_renames(
        &self,
        create: &mut BTreeSet<String>,
        delete: &mut BTreeSet<String>,
        source: &Side,
        target: &Side,
    ) -> Vec<Rename> {
        let mut candidates: Vec<(&ConfigValue, &String)> = create
            .iter()
            .filter_map(|name| {
                identity(&source.items[name.as_str()], &self.identity_key).map(|id| (id, name))
            })
            .collect();

        let mut renames = Vec::new();
        for old in delete.iter() {
            let Some(id) = identity(&target.items[old.as_str()], &self.identity_key) else {
                continue;
            };
            if let Some(position) = candidates.iter().position(|(candidate, _)| *candidate == id) {
                let (_, new) = candidates.remove(position);
                renames.push(Rename {
                    from: old.clone(),
                    to: new.clone(),
                });
            }
        }

        for rename in &renames {
            create.remove(&rename.to);
            delete.remove(&rename.from);
        }
        renames
    }

    /// Read `names` from `store`, recording items that cannot take part.
    fn load(
        &self,
        store: &dyn ConfigStore,
        names: Vec<String>,
        issues: &mut Vec<ItemIssue>,
        malformed: &mut BTreeSet<String>,
    ) -> Result<Side> {
        let mut side = Side::default();
        for name in names {
            let value = match store.read(&name) {
                Ok(Some(value)) => value,
                Ok(None) => continue,
                Err(e) if e.is_item_level() => {
                    mark_malformed(&name, e, issues, malformed);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = ensure_mapping(&name, &value) {
                mark_malformed(&name, e, issues, malformed);
                continue;
            }
            match declared_dependencies(&name, &value, &self.dependency_path) {
                Ok(dependencies) => {
                    side.dependencies.insert(name.clone(), dependencies);
                    side.items.insert(name, value);
                }
                Err(e) => mark_malformed(&name, e, issues, malformed),
            }
        }
        Ok(side)
    }
}

fn mark_malformed(
    name: &str,
    reason: impl std::fmt::Display,
    issues: &mut Vec<ItemIssue>,
    malformed: &mut BTreeSet<String>,
) {
    tracing::warn!(item = %name, %reason, "Skipping malformed item");
    if malformed.insert(name.to_string()) {
        issues.push(ItemIssue::malformed(name, reason));
    }
}

fn scoped_names(
    source: &dyn ConfigStore,
    target: &dyn ConfigStore,
    scope: &Scope,
) -> Result<(Vec<String>, Vec<String>)> {
    Ok(match scope {
        Scope::All => (source.list_all(None)?, target.list_all(None)?),
        Scope::Prefix(namespace) => {
            let prefix = format!("{}.", namespace);
            (
                source.list_all(Some(&prefix))?,
                target.list_all(Some(&prefix))?,
            )
        }
        Scope::SourceNames => {
            let source_names = source.list_all(None)?;
            let wanted: BTreeSet<&str> = source_names.iter().map(String::as_str).collect();
            let target_names = target
                .list_all(None)?
                .into_iter()
                .filter(|name| wanted.contains(name.as_str()))
                .collect();
            (source_names, target_names)
        }
    })
}

/// Whether an item exists, counting undecodable items as present.
fn present(store: &dyn ConfigStore, name: &str) -> Result<bool> {
    match store.read(name) {
        Ok(found) => Ok(found.is_some()),
        Err(e) if e.is_item_level() => Ok(true),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgsync_store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn store(items: &[(&str, ConfigValue)]) -> MemoryStore {
        let store = MemoryStore::new();
        for (name, value) in items {
            store.write(name, value).unwrap();
        }
        store
    }

    #[test]
    fn classifies_create_update_delete() {
        let source = store(&[("a", json!({"v": 1})), ("b", json!({"v": 2})), ("same", json!({}))]);
        let target = store(&[("b", json!({"v": 3})), ("c", json!({})), ("same", json!({}))]);

        let list = ChangelistComputer::default()
            .compute(&source, &target, &Scope::All)
            .unwrap();

        assert_eq!(list.create, vec!["a"]);
        assert_eq!(list.update, vec!["b"]);
        assert_eq!(list.delete, vec!["c"]);
        assert!(list.rename.is_empty());
        assert!(list.issues.is_empty());
    }

    #[test]
    fn identity_only_differences_are_not_updates() {
        let source = store(&[("a", json!({"uuid": "1", "v": 1}))]);
        let target = store(&[("a", json!({"uuid": "2", "v": 1}))]);
        let list = ChangelistComputer::default()
            .compute(&source, &target, &Scope::All)
            .unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn matching_identity_becomes_rename() {
        let source = store(&[("new.name", json!({"uuid": "u1", "v": 1}))]);
        let target = store(&[("old.name", json!({"uuid": "u1", "v": 1}))]);

        let list = ChangelistComputer::default()
            .compute(&source, &target, &Scope::All)
            .unwrap();

        assert!(list.create.is_empty());
        assert!(list.delete.is_empty());
        assert_eq!(
            list.rename,
            vec![Rename {
                from: "old.name".into(),
                to: "new.name".into()
            }]
        );
    }

    #[test]
    fn items_without_identity_never_rename() {
        let source = store(&[("new.name", json!({"v": 1}))]);
        let target = store(&[("old.name", json!({"v": 1}))]);
        let list = ChangelistComputer::default()
            .compute(&source, &target, &Scope::All)
            .unwrap();
        assert_eq!(list.create, vec!["new.name"]);
        assert_eq!(list.delete, vec!["old.name"]);
    }

    #[test]
    fn creates_follow_declared_dependencies() {
        let source = store(&[
            ("A", json!({})),
            ("B", json!({"dependencies": {"config": ["A"]}})),
        ]);
        let list = ChangelistComputer::default()
            .compute(&source, &MemoryStore::new(), &Scope::All)
            .unwrap();
        assert_eq!(list.create, vec!["A", "B"]);

        let source = store(&[
            ("A", json!({"dependencies": {"config": ["B"]}})),
            ("B", json!({})),
        ]);
        let list = ChangelistComputer::default()
            .compute(&source, &MemoryStore::new(), &Scope::All)
            .unwrap();
        assert_eq!(list.create, vec!["B", "A"]);
    }

    #[test]
    fn deletes_remove_referrers_first() {
        let target = store(&[
            ("A", json!({"dependencies": {"config": ["B"]}})),
            ("B", json!({})),
        ]);
        let list = ChangelistComputer::default()
            .compute(&MemoryStore::new(), &target, &Scope::All)
            .unwrap();
        assert_eq!(list.delete, vec!["A", "B"]);
    }

    #[test]
    fn missing_dependency_is_reported() {
        let source = store(&[("B", json!({"dependencies": {"config": ["ghost"]}}))]);
        let list = ChangelistComputer::default()
            .compute(&source, &MemoryStore::new(), &Scope::All)
            .unwrap();
        assert_eq!(list.create, vec!["B"]);
        assert_eq!(list.issues, vec![ItemIssue::missing_dependency("B", "ghost")]);
    }

    #[test]
    fn dependency_satisfied_outside_scope_is_not_missing() {
        let source = store(&[
            ("node.type.page", json!({"dependencies": {"config": ["system.site"]}})),
            ("system.site", json!({})),
        ]);
        let list = ChangelistComputer::default()
            .compute(&source, &MemoryStore::new(), &Scope::Prefix("node".into()))
            .unwrap();
        assert_eq!(list.create, vec!["node.type.page"]);
        assert!(list.issues.is_empty());
    }

    #[test]
    fn non_mapping_items_are_skipped_on_both_sides() {
        let source = store(&[("bad", json!("scalar")), ("ok", json!({}))]);
        let target = store(&[("bad", json!({"v": 1}))]);
        let list = ChangelistComputer::default()
            .compute(&source, &target, &Scope::All)
            .unwrap();

        assert_eq!(list.create, vec!["ok"]);
        assert!(list.delete.is_empty());
        assert_eq!(list.issues.len(), 1);
        assert!(list.issues[0].is_malformed());
    }

    #[test]
    fn invalid_dependency_list_is_malformed() {
        let source = store(&[("x", json!({"dependencies": {"config": "A"}}))]);
        let list = ChangelistComputer::default()
            .compute(&source, &MemoryStore::new(), &Scope::All)
            .unwrap();
        assert!(list.create.is_empty());
        assert!(list.issues[0].is_malformed());
    }

    #[test]
    fn source_names_scope_never_deletes() {
        let source = store(&[("a", json!({"v": 2}))]);
        let target = store(&[("a", json!({"v": 1})), ("b", json!({}))]);
        let list = ChangelistComputer::default()
            .compute(&source, &target, &Scope::SourceNames)
            .unwrap();
        assert_eq!(list.update, vec!["a"]);
        assert!(list.delete.is_empty());
    }

    #[test]
    fn prefix_scope_restricts_both_sides() {
        let source = store(&[("node.a", json!({})), ("views.b", json!({}))]);
        let target = store(&[("node.c", json!({})), ("views.d", json!({}))]);
        let list = ChangelistComputer::default()
            .compute(&source, &target, &Scope::Prefix("node".into()))
            .unwrap();
        assert_eq!(list.create, vec!["node.a"]);
        assert_eq!(list.delete, vec!["node.c"]);
    }

    #[test]
    fn compute_all_covers_every_collection() {
        let source = store(&[("a", json!({}))]);
        source
            .with_collection(&Collection::new("language.fr"))
            .write("a", &json!({"label": "Bonjour"}))
            .unwrap();
        let target = MemoryStore::new();
        target
            .with_collection(&Collection::new("language.de"))
            .write("a", &json!({"label": "Hallo"}))
            .unwrap();

        let set = ChangelistComputer::default()
            .compute_all(&source, &target, &Scope::All)
            .unwrap();
        let collections: Vec<_> = set.iter().map(|c| c.collection.to_string()).collect();
        assert_eq!(collections, vec!["default", "language.de", "language.fr"]);
        assert_eq!(
            set.collection(&Collection::new("language.de")).unwrap().delete,
            vec!["a"]
        );
    }
}
