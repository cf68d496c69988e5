//! Classified differences between two configuration stores
//!
//! A [`Changelist`] covers one collection of one store pair. A [`ChangeSet`]
//! concatenates the changelists of every collection, default first.

mod computer;
mod ordering;

use std::fmt;

use serde::{Deserialize, Serialize};

use cfgsync_store::Collection;

pub use computer::{ChangelistComputer, Scope};
pub use ordering::{DependencyOrder, dependency_first, referrer_first};

/// Kind of change applied to one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Create,
    Update,
    Delete,
    Rename,
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Rename => "rename",
        };
        write!(f, "{}", label)
    }
}

/// An item that kept its identity under a new name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

impl fmt::Display for Rename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// A problem with one item found while computing a changelist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemIssue {
    pub name: String,
    #[serde(flatten)]
    pub kind: IssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum IssueKind {
    /// The item could not be decoded or is not a mapping. It was skipped.
    Malformed { reason: String },
    /// A declared dependency exists in neither store.
    MissingDependency { dependency: String },
    /// The item is part of a dependency cycle and was ordered lexically.
    DependencyCycle,
}

impl ItemIssue {
    pub fn malformed(name: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            name: name.into(),
            kind: IssueKind::Malformed {
                reason: reason.to_string(),
            },
        }
    }

    pub fn missing_dependency(name: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: IssueKind::MissingDependency {
                dependency: dependency.into(),
            },
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self.kind, IssueKind::Malformed { .. })
    }
}

impl fmt::Display for ItemIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::Malformed { reason } => write!(f, "{}: skipped, {}", self.name, reason),
            IssueKind::MissingDependency { dependency } => {
                write!(f, "{}: depends on missing item {}", self.name, dependency)
            }
            IssueKind::DependencyCycle => write!(f, "{}: part of a dependency cycle", self.name),
        }
    }
}

/// Create, update, delete and rename entries for one collection.
///
/// A name appears in at most one sequence. `create` is ordered
/// dependency-first, `delete` referrer-first, `update` and `rename`
/// lexically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changelist {
    pub collection: Collection,
    pub create: Vec<String>,
    pub update: Vec<String>,
    pub delete: Vec<String>,
    pub rename: Vec<Rename>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ItemIssue>,
}

impl Changelist {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            ..Self::default()
        }
    }

    /// Whether there is nothing to apply. Issues do not count.
    pub fn is_empty(&self) -> bool {
        self.create.is_empty()
            && self.update.is_empty()
            && self.delete.is_empty()
            && self.rename.is_empty()
    }

    /// Number of entries across all sequences.
    pub fn len(&self) -> usize {
        self.create.len() + self.update.len() + self.delete.len() + self.rename.len()
    }

    /// The sequence a name appears in. Rename entries match either end.
    pub fn op_for(&self, name: &str) -> Option<ChangeOp> {
        if self.create.iter().any(|n| n == name) {
            Some(ChangeOp::Create)
        } else if self.update.iter().any(|n| n == name) {
            Some(ChangeOp::Update)
        } else if self.delete.iter().any(|n| n == name) {
            Some(ChangeOp::Delete)
        } else if self.rename.iter().any(|r| r.from == name || r.to == name) {
            Some(ChangeOp::Rename)
        } else {
            None
        }
    }

    /// Whether `name` is the old name of a rename entry.
    pub fn is_rename_source(&self, name: &str) -> bool {
        self.rename.iter().any(|r| r.from == name)
    }

    /// Every `(op, name)` entry in apply order. Renames yield their new name.
    pub fn entries(&self) -> impl Iterator<Item = (ChangeOp, &str)> {
        self.create
            .iter()
            .map(|n| (ChangeOp::Create, n.as_str()))
            .chain(self.update.iter().map(|n| (ChangeOp::Update, n.as_str())))
            .chain(self.rename.iter().map(|r| (ChangeOp::Rename, r.to.as_str())))
            .chain(self.delete.iter().map(|n| (ChangeOp::Delete, n.as_str())))
    }
}

/// Per-collection changelists, default collection first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    changelists: Vec<Changelist>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a changelist, keeping collections in order. A changelist for a
    /// collection already present replaces it.
    pub fn push(&mut self, changelist: Changelist) {
        match self
            .changelists
            .binary_search_by(|c| c.collection.cmp(&changelist.collection))
        {
            Ok(index) => self.changelists[index] = changelist,
            Err(index) => self.changelists.insert(index, changelist),
        }
    }

    /// Whether no collection has anything to apply.
    pub fn is_empty(&self) -> bool {
        self.changelists.iter().all(Changelist::is_empty)
    }

    /// Total number of entries across collections.
    pub fn len(&self) -> usize {
        self.changelists.iter().map(Changelist::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Changelist> {
        self.changelists.iter()
    }

    pub fn collection(&self, collection: &Collection) -> Option<&Changelist> {
        self.changelists.iter().find(|c| &c.collection == collection)
    }

    /// Issues of every collection, with collection-qualified names.
    pub fn issues(&self) -> Vec<ItemIssue> {
        self.changelists
            .iter()
            .flat_map(|c| {
                c.issues.iter().map(|issue| ItemIssue {
                    name: c.collection.qualify(&issue.name),
                    kind: issue.kind.clone(),
                })
            })
            .collect()
    }

    /// Drop changelists with neither entries nor issues.
    pub fn prune(mut self) -> Self {
        self.changelists
            .retain(|c| !c.is_empty() || !c.issues.is_empty());
        self
    }
}

impl IntoIterator for ChangeSet {
    type Item = Changelist;
    type IntoIter = std::vec::IntoIter<Changelist>;

    fn into_iter(self) -> Self::IntoIter {
        self.changelists.into_iter()
    }
}

impl FromIterator<Changelist> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = Changelist>>(iter: I) -> Self {
        let mut set = Self::new();
        for changelist in iter {
            set.push(changelist);
        }
        set
    }
}
