//! Reconciliation reports
//!
//! Every engine run returns a [`ReconcileReport`] listing what was written to
//! staging, what was held back and which merges needed a tie-break.

use std::fmt;

use serde::{Deserialize, Serialize};

use cfgsync_store::ConfigValue;

use crate::changelist::ChangeOp;
use crate::merge::{MergeConflict, MergeOutcome};

/// Overall outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStatus {
    /// Every pending change was staged without conflict
    Clean,
    /// Some changes were skipped or items reported problems
    Partial,
    /// At least one merge resolved a conflict and needs review
    Conflicted,
}

impl fmt::Display for ReconcileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            Self::Clean => "clean",
            Self::Partial => "partial",
            Self::Conflicted => "conflicted",
        };
        write!(f, "{}", status)
    }
}

/// One item written to staging, or held back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Collection-qualified item name
    pub name: String,
    pub op: ChangeOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Merged value offered for review when an update was held back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed: Option<ConfigValue>,
    /// Conflicts resolved to produce `proposed`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<MergeConflict>,
}

/// An item whose merge resolved at least one conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictedItem {
    pub name: String,
    pub conflicts: Vec<MergeConflict>,
}

/// Report from an initialize run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub status: ReconcileStatus,
    /// Items written to staging, conflicted merges included
    pub applied: Vec<ItemOutcome>,
    /// Pending changes that were not staged
    pub skipped: Vec<ItemOutcome>,
    /// Items staged with a tie-broken merge
    pub conflicted: Vec<ConflictedItem>,
    /// Per-item problems that did not stop the run
    pub warnings: Vec<String>,
}

impl Default for ReconcileReport {
    fn default() -> Self {
        Self::clean()
    }
}

impl ReconcileReport {
    /// Create an empty report
    pub fn clean() -> Self {
        Self {
            status: ReconcileStatus::Clean,
            applied: Vec::new(),
            skipped: Vec::new(),
            conflicted: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn record_applied(&mut self, name: impl Into<String>, op: ChangeOp) {
        self.applied.push(ItemOutcome {
            name: name.into(),
            op,
            detail: None,
            proposed: None,
            conflicts: Vec::new(),
        });
    }

    pub fn record_skipped(&mut self, name: impl Into<String>, op: ChangeOp, detail: impl Into<String>) {
        self.skipped.push(ItemOutcome {
            name: name.into(),
            op,
            detail: Some(detail.into()),
            proposed: None,
            conflicts: Vec::new(),
        });
        self.settle();
    }

    /// Record a held-back update together with the merge it would stage.
    ///
    /// The proposal is for review only. Its conflicts do not count towards
    /// `conflicted`, which lists staged items.
    pub fn record_held(
        &mut self,
        name: impl Into<String>,
        op: ChangeOp,
        detail: impl Into<String>,
        proposal: MergeOutcome,
    ) {
        self.skipped.push(ItemOutcome {
            name: name.into(),
            op,
            detail: Some(detail.into()),
            proposed: Some(proposal.value),
            conflicts: proposal.conflicts,
        });
        self.settle();
    }

    /// Skipped entries that carry a proposed value
    pub fn proposals(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.skipped.iter().filter(|o| o.proposed.is_some())
    }

    pub fn record_conflicts(&mut self, name: impl Into<String>, conflicts: Vec<MergeConflict>) {
        if conflicts.is_empty() {
            return;
        }
        self.conflicted.push(ConflictedItem {
            name: name.into(),
            conflicts,
        });
        self.settle();
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
        self.settle();
    }

    /// Names of every staged item, in staging order
    pub fn applied_names(&self) -> Vec<&str> {
        self.applied.iter().map(|o| o.name.as_str()).collect()
    }

    pub fn skipped_names(&self) -> Vec<&str> {
        self.skipped.iter().map(|o| o.name.as_str()).collect()
    }

    pub fn conflicted_names(&self) -> Vec<&str> {
        self.conflicted.iter().map(|c| c.name.as_str()).collect()
    }

    /// Merge two reports, combining their entries
    ///
    /// The resulting status is the "worst" of the two:
    /// Conflicted > Partial > Clean
    pub fn merge(mut self, other: ReconcileReport) -> Self {
        self.applied.extend(other.applied);
        self.skipped.extend(other.skipped);
        self.conflicted.extend(other.conflicted);
        self.warnings.extend(other.warnings);
        self.status = self.status.max(other.status);
        self
    }

    /// One line per entry, for terminals and logs
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "status: {} (applied {}, skipped {}, conflicted {})",
            self.status,
            self.applied.len(),
            self.skipped.len(),
            self.conflicted.len()
        )];
        for outcome in &self.applied {
            lines.push(format!("applied  {} {}", outcome.op, outcome.name));
        }
        for outcome in &self.skipped {
            match &outcome.detail {
                Some(detail) => {
                    lines.push(format!("skipped  {} {} ({})", outcome.op, outcome.name, detail))
                }
                None => lines.push(format!("skipped  {} {}", outcome.op, outcome.name)),
            }
        }
        for outcome in self.proposals() {
            lines.push(format!(
                "proposed {} {} ({} conflict(s))",
                outcome.op,
                outcome.name,
                outcome.conflicts.len()
            ));
        }
        for item in &self.conflicted {
            let paths: Vec<String> = item.conflicts.iter().map(ToString::to_string).collect();
            lines.push(format!("conflict {} at {}", item.name, paths.join(", ")));
        }
        for warning in &self.warnings {
            lines.push(format!("warning  {}", warning));
        }
        lines.join("\n")
    }

    fn settle(&mut self) {
        let status = if !self.conflicted.is_empty() {
            ReconcileStatus::Conflicted
        } else if !self.skipped.is_empty() || !self.warnings.is_empty() {
            ReconcileStatus::Partial
        } else {
            ReconcileStatus::Clean
        };
        self.status = self.status.max(status);
    }
}
