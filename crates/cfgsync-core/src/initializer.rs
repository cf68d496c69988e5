//! Staging of reconciled configuration
//!
//! Staging is reseeded from active at the start of every run, then each
//! accepted create is written from upstream and each accepted update is
//! written as the merge of snapshot, upstream and active. Items no change
//! touches stay exactly as seeded.

use std::sync::Arc;

use serde_json::{Map, Value};

use cfgsync_content::value::identity;
use cfgsync_store::{Collection, ConfigStore, ConfigValue, collections_with_default};

use crate::Result;
use crate::changelist::{ChangeOp, ChangeSet, Scope};
use crate::config::SyncSettings;
use crate::lister::{ChangeLister, Listing};
use crate::merge::{MergeOutcome, ThreeWayMerger};
use crate::report::ReconcileReport;

/// How a run treats pending changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitOptions {
    /// Hold back changes that would overwrite local changes.
    pub safe_only: bool,
    /// Merge updates into the active value. When off, updates take the
    /// upstream value whole and keep only the local identity.
    pub retain_local: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            safe_only: true,
            retain_local: true,
        }
    }
}

impl InitOptions {
    pub fn safe_only(safe_only: bool) -> Self {
        Self {
            safe_only,
            ..Self::default()
        }
    }
}

/// What seeding staging did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Seeded {
    /// Items copied from active
    pub copied: usize,
    /// Active items that could not be read, one message each
    pub unreadable: Vec<String>,
}

impl Seeded {
    /// A report carrying one warning per unreadable item.
    pub fn into_report(self) -> ReconcileReport {
        let mut report = ReconcileReport::clean();
        for message in self.unreadable {
            report.warn(message);
        }
        report
    }
}

/// Seeds staging and writes reconciled values into it.
#[derive(Debug, Clone)]
pub struct ReconciliationInitializer {
    lister: ChangeLister,
    staging: Arc<dyn ConfigStore>,
    merger: ThreeWayMerger,
    identity_key: String,
    assign_identity: bool,
}

impl ReconciliationInitializer {
    pub fn new(settings: &SyncSettings, lister: ChangeLister, staging: Arc<dyn ConfigStore>) -> Self {
        Self {
            lister,
            staging,
            merger: ThreeWayMerger::from_settings(settings),
            identity_key: settings.items.identity_key.clone(),
            assign_identity: settings.items.assign_identity,
        }
    }

    pub fn staging(&self) -> &Arc<dyn ConfigStore> {
        &self.staging
    }

    /// Clear staging, then copy every collection of active into it.
    ///
    /// Active items that cannot be decoded stay out of staging and are
    /// listed in the returned [`Seeded`]. The commit leaves them alone
    /// because they are malformed on the active side.
    pub fn seed(&self) -> Result<Seeded> {
        for collection in collections_with_default(self.staging.as_ref())? {
            self.staging.with_collection(&collection).delete_all(None)?;
        }
        let active = self.lister.active();
        let mut seeded = Seeded::default();
        for collection in collections_with_default(active.as_ref())? {
            let from = active.with_collection(&collection);
            let to = self.staging.with_collection(&collection);
            for name in from.list_all(None)? {
                match from.read(&name) {
                    Ok(Some(value)) => {
                        to.write(&name, &value)?;
                        seeded.copied += 1;
                    }
                    Ok(None) => {}
                    Err(e) if e.is_item_level() => {
                        let qualified = collection.qualify(&name);
                        tracing::warn!(item = %qualified, error = %e, "Leaving unreadable item out of staging");
                        seeded.unreadable.push(format!("{qualified}: left out of staging, {e}"));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        tracing::debug!(items = seeded.copied, "Seeded staging from active");
        Ok(seeded)
    }

    /// Stage the changes that bring `upstream` into active within `scope`.
    ///
    /// Does not seed. Callers seed once per run.
    pub fn reconcile(
        &self,
        upstream: &dyn ConfigStore,
        scope: &Scope,
        options: &InitOptions,
    ) -> Result<ReconcileReport> {
        let drift = self.lister.drift_if(options.safe_only)?;
        let listing = self.lister.list_store(upstream, scope, drift.as_ref())?;
        self.apply(upstream, &listing, options)
    }

    /// Write the entries of `listing` into staging.
    ///
    /// Held-back updates are not staged, but their merge is still computed
    /// and attached to the skipped entry for review.
    pub fn apply(
        &self,
        upstream: &dyn ConfigStore,
        listing: &Listing,
        options: &InitOptions,
    ) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::clean();
        self.stage(upstream, &listing.changes, options, &mut report)?;

        for blocked in &listing.blocked {
            let qualified = blocked.qualified_name();
            let detail = blocked.reason.to_string();
            if blocked.op == ChangeOp::Update {
                if let Ok(proposal) =
                    self.update_value(upstream, &blocked.collection, &blocked.name, options)?
                {
                    tracing::debug!(item = %qualified, "Proposed merge for held-back update");
                    report.record_held(qualified, blocked.op, detail, proposal);
                    continue;
                }
            }
            report.record_skipped(qualified, blocked.op, detail);
        }
        for name in &listing.unprovided {
            report.record_skipped(name.clone(), ChangeOp::Create, "provider not enabled");
        }
        for issue in listing.changes.issues() {
            report.warn(issue.to_string());
        }
        Ok(report)
    }

    fn stage(
        &self,
        upstream: &dyn ConfigStore,
        changes: &ChangeSet,
        options: &InitOptions,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        let active = self.lister.active();

        for changelist in changes.iter() {
            let collection = &changelist.collection;
            let shipped = upstream.with_collection(collection);
            let active = active.with_collection(collection);
            let staging = self.staging.with_collection(collection);

            for name in &changelist.create {
                let qualified = collection.qualify(name);
                if active.exists(name)? {
                    report.record_skipped(qualified, ChangeOp::Create, "already exists in active");
                    continue;
                }
                let Some(value) = read_item(shipped.as_ref(), name)? else {
                    report.record_skipped(qualified, ChangeOp::Create, "no longer provided");
                    continue;
                };
                staging.write(name, &self.with_identity(value))?;
                tracing::debug!(item = %qualified, "Staged create");
                report.record_applied(qualified, ChangeOp::Create);
            }

            for name in &changelist.update {
                let qualified = collection.qualify(name);
                let outcome = match self.update_value(upstream, collection, name, options)? {
                    Ok(outcome) => outcome,
                    Err(reason) => {
                        report.record_skipped(qualified, ChangeOp::Update, reason);
                        continue;
                    }
                };
                if !outcome.is_clean() {
                    tracing::info!(
                        item = %qualified,
                        conflicts = outcome.conflicts.len(),
                        "Merged with conflicts"
                    );
                }
                staging.write(name, &outcome.value)?;
                tracing::debug!(item = %qualified, "Staged update");
                report.record_conflicts(qualified.clone(), outcome.conflicts);
                report.record_applied(qualified, ChangeOp::Update);
            }
        }
        Ok(())
    }

    /// The value an update of `name` would stage, or why there is none.
    ///
    /// With `retain_local` this is the merge of snapshot, upstream and
    /// active. Otherwise the upstream value with the local identity.
    fn update_value(
        &self,
        upstream: &dyn ConfigStore,
        collection: &Collection,
        name: &str,
        options: &InitOptions,
    ) -> Result<std::result::Result<MergeOutcome, &'static str>> {
        let active = self.lister.active().with_collection(collection);
        let Some(local) = read_item(active.as_ref(), name)? else {
            return Ok(Err("no longer active"));
        };
        let shipped = upstream.with_collection(collection);
        let Some(shipped) = read_item(shipped.as_ref(), name)? else {
            return Ok(Err("no longer provided"));
        };

        if !options.retain_local {
            return Ok(Ok(MergeOutcome {
                value: self.keep_local_identity(shipped, &local),
                conflicts: Vec::new(),
            }));
        }
        let ancestors = self.lister.snapshot().upstream.with_collection(collection);
        let ancestor = read_item(ancestors.as_ref(), name)?;
        Ok(Ok(self.merger.merge(ancestor.as_ref(), &shipped, &local)))
    }

    /// Give a created item an identity when it ships none.
    fn with_identity(&self, value: ConfigValue) -> ConfigValue {
        if !self.assign_identity || identity(&value, &self.identity_key).is_some() {
            return value;
        }
        let Value::Object(map) = value else {
            return value;
        };
        let mut with_id = Map::with_capacity(map.len() + 1);
        with_id.insert(
            self.identity_key.clone(),
            Value::String(uuid::Uuid::new_v4().to_string()),
        );
        for (key, field) in map {
            if key != self.identity_key {
                with_id.insert(key, field);
            }
        }
        Value::Object(with_id)
    }

    fn keep_local_identity(&self, mut shipped: ConfigValue, local: &ConfigValue) -> ConfigValue {
        if let (Some(id), Value::Object(map)) = (identity(local, &self.identity_key), &mut shipped) {
            map.insert(self.identity_key.clone(), id.clone());
        }
        shipped
    }
}

/// Read an item, treating an undecodable one as absent.
fn read_item(store: &dyn ConfigStore, name: &str) -> Result<Option<ConfigValue>> {
    match store.read(name) {
        Ok(value) => Ok(value),
        Err(e) if e.is_item_level() => {
            tracing::warn!(item = %name, error = %e, "Treating unreadable item as absent");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
