//! Reconciliation scenarios across several extensions
//!
//! Each test sets up a site on disk, drives the engine and checks the
//! staged or committed result.

use std::sync::Arc;

use cfgsync_core::{
    ChangelistComputer, ConfigSync, ReconcileStatus, SettingsResolver, SnapshotPair, SyncStores,
    commit_staging,
};
use cfgsync_extensions::{ExtensionKind, ExtensionsManifest, MANIFEST_FILENAME};
use cfgsync_store::{ConfigStore, StoreFormat};
use cfgsync_test_utils::TestSite;
use pretty_assertions::assert_eq;
use serde_json::json;

fn engine(site: &TestSite) -> ConfigSync {
    let settings = SettingsResolver::new(site.state_dir()).resolve().unwrap();
    let registry = ExtensionsManifest::from_path(&site.state_dir().join(MANIFEST_FILENAME))
        .unwrap()
        .into_registry(site.root(), StoreFormat::Yaml);
    let stores = SyncStores {
        active: Arc::new(site.active()),
        staging: Arc::new(site.staging()),
        snapshot: SnapshotPair::new(
            Arc::new(site.snapshot_upstream()),
            Arc::new(site.snapshot_active()),
        ),
    };
    ConfigSync::new(stores, Arc::new(registry), &settings)
}

// =============================================================================
// Providers
// =============================================================================

#[test]
fn optional_item_waits_for_its_provider() {
    let mut site = TestSite::new();
    site.add_extension(
        ExtensionKind::Module,
        "node",
        &[
            ("node.type.page", json!({"name": "Page"})),
            ("views.view.content", json!({"label": "Content"})),
        ],
    );

    let report = engine(&site).initialize_all(true).unwrap();
    assert_eq!(report.applied_names(), vec!["node.type.page"]);
    assert_eq!(report.skipped_names(), vec!["views.view.content"]);
    assert_eq!(report.skipped[0].detail.as_deref(), Some("provider not enabled"));

    site.add_bare_extension(ExtensionKind::Module, "views");
    let report = engine(&site).initialize_all(true).unwrap();
    assert_eq!(report.status, ReconcileStatus::Clean);
    assert_eq!(report.applied_names(), vec!["node.type.page", "views.view.content"]);
}

#[test]
fn provider_check_can_be_switched_off() {
    let mut site = TestSite::new();
    site.add_extension(ExtensionKind::Module, "node", &[("views.view.content", json!({}))]);
    site.write_settings("[providers]\nrequire_enabled = false\n");

    let report = engine(&site).initialize_all(true).unwrap();
    assert_eq!(report.applied_names(), vec!["views.view.content"]);
}

// =============================================================================
// Dependencies
// =============================================================================

#[test]
fn creates_are_staged_after_their_dependencies() {
    let mut site = TestSite::new();
    site.add_extension(
        ExtensionKind::Module,
        "field",
        &[
            (
                "field.field.node.article.body",
                json!({"dependencies": {"config": ["field.storage.node.body"]}}),
            ),
            ("field.storage.node.body", json!({"type": "text"})),
        ],
    );

    let report = engine(&site).initialize_all(true).unwrap();
    assert_eq!(
        report.applied_names(),
        vec!["field.storage.node.body", "field.field.node.article.body"]
    );
}

#[test]
fn missing_dependency_is_a_warning() {
    let mut site = TestSite::new();
    site.add_extension(
        ExtensionKind::Module,
        "field",
        &[(
            "field.field.node.article.body",
            json!({"dependencies": {"config": ["field.storage.node.body"]}}),
        )],
    );

    let report = engine(&site).initialize_all(true).unwrap();
    assert_eq!(report.applied_names(), vec!["field.field.node.article.body"]);
    assert_eq!(report.status, ReconcileStatus::Partial);
    assert!(report.warnings[0].contains("field.storage.node.body"));
}

#[test]
fn commit_deletes_referrers_first() {
    let site = TestSite::new();
    site.write_active("field.storage.node.body", &json!({}));
    site.write_active(
        "field.field.node.article.body",
        &json!({"dependencies": {"config": ["field.storage.node.body"]}}),
    );

    let report = commit_staging(&ChangelistComputer::default(), &site.staging(), &site.active()).unwrap();

    assert_eq!(
        report.deleted,
        vec!["field.field.node.article.body", "field.storage.node.body"]
    );
    assert!(site.active().list_all(None).unwrap().is_empty());
}

// =============================================================================
// Local changes
// =============================================================================

#[test]
fn renamed_item_is_moved_on_import() {
    let mut site = TestSite::new();
    site.add_extension(ExtensionKind::Module, "views", &[("views.view.frontpage", json!({"label": "Front"}))]);
    engine(&site).initialize_all(true).unwrap();
    engine(&site).import_staging().unwrap();

    // Rename in staging, keeping the identity.
    let value = site.staging().read("views.view.frontpage").unwrap().unwrap();
    site.staging().delete("views.view.frontpage").unwrap();
    site.staging().write("views.view.home", &value).unwrap();

    let report = engine(&site).import_staging().unwrap();
    assert_eq!(report.renamed, vec!["views.view.home"]);
    site.assert_file_exists(".config-sync/active/views.view.home.yml");
    site.assert_file_not_exists(".config-sync/active/views.view.frontpage.yml");

    // The shipped name is not recreated over the local rename.
    let listing = engine(&site)
        .extension_changelist(ExtensionKind::Module, "views", true)
        .unwrap();
    assert!(listing.is_empty());
}

#[test]
fn unreadable_active_item_does_not_stop_the_run() {
    let mut site = TestSite::new();
    site.add_extension(
        ExtensionKind::Module,
        "system",
        &[("system.site", json!({"name": "Site"})), ("system.theme", json!({"default": "olivero"}))],
    );
    site.write_file(".config-sync/active/system.site.yml", "name: [broken");

    let report = engine(&site).initialize_all(false).unwrap();
    assert_eq!(report.applied_names(), vec!["system.theme"]);
    assert!(report.warnings.iter().any(|w| w.starts_with("system.site")));
    assert!(
        report
            .warnings
            .iter()
            .any(|w| w.starts_with("system.site: left out of staging"))
    );
}
