//! Configuration reconciliation engine for config-sync
//!
//! Reconciles three versions of every configuration item an extension ships:
//! the value shipped now (upstream), the value recorded at the last sync
//! (snapshot) and the value in use (active).
//!
//! - **Changelists**: classify items as create, update, delete or rename,
//!   in dependency order
//! - **Safety**: hold back changes that would overwrite local customization
//! - **Merge**: three-way merge of snapshot, upstream and active values
//! - **Staging**: seed from active and write reconciled values for review
//! - **Snapshots**: record the new baseline once changes are committed
//!
//! # Architecture
//!
//! ```text
//!                    CLI / API
//!                        |
//!                   cfgsync-core
//!                        |
//!       +----------------+----------------+
//!       |                |                |
//! cfgsync-store  cfgsync-content  cfgsync-extensions
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use cfgsync_core::{ConfigSync, SyncSettings, SyncStores};
//! use cfgsync_extensions::StaticRegistry;
//!
//! let engine = ConfigSync::new(
//!     SyncStores::in_memory(),
//!     Arc::new(StaticRegistry::new()),
//!     &SyncSettings::default(),
//! );
//! let report = engine.initialize_all(true).unwrap();
//! assert!(report.applied.is_empty());
//! ```

pub mod changelist;
pub mod config;
pub mod engine;
pub mod error;
pub mod import;
pub mod initializer;
pub mod lister;
pub mod logging;
pub mod merge;
pub mod report;
pub mod safety;
pub mod snapshot;

pub use changelist::{
    ChangeOp, ChangeSet, Changelist, ChangelistComputer, IssueKind, ItemIssue, Rename, Scope,
};
pub use config::{SettingsResolver, SyncSettings};
pub use engine::{ConfigSync, SyncStores};
pub use error::{Error, Result};
pub use import::{ImportReport, commit_staging};
pub use initializer::{InitOptions, ReconciliationInitializer, Seeded};
pub use lister::{ChangeLister, FullChangelist, Listing};
pub use merge::{ConflictPolicy, MergeConflict, MergeOutcome, ThreeWayMerger};
pub use report::{ConflictedItem, ItemOutcome, ReconcileReport, ReconcileStatus};
pub use safety::{BlockReason, BlockedChange, SafeChanges, SafetyClassifier, filter_with_drift};
pub use snapshot::{SnapshotManager, SnapshotPair, SnapshotReport};
