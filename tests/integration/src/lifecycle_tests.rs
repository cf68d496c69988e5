//! End-to-end lifecycle over an on-disk site
//!
//! Exercises the complete flow: manifest -> registry -> status -> staging ->
//! import -> snapshot, then an upgrade of the shipped configuration.

use std::sync::Arc;

use cfgsync_core::{ConfigSync, ReconcileStatus, SettingsResolver, SnapshotPair, SyncStores};
use cfgsync_extensions::{ExtensionKind, ExtensionsManifest, MANIFEST_FILENAME};
use cfgsync_store::{Collection, ConfigStore, StoreFormat};
use cfgsync_test_utils::TestSite;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

/// Build the engine the way the CLI does, from the site's state directory.
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

fn without_identity(mut value: Value) -> Value {
    if let Some(map) = value.as_object_mut() {
        map.remove("uuid");
    }
    value
}

fn standard_site() -> TestSite {
    let mut site = TestSite::new();
    site.add_extension(
        ExtensionKind::Module,
        "system",
        &[(
            "system.site",
            json!({"name": "Site", "page": {"front": "/node", "403": ""}}),
        )],
    );
    site.add_extension(
        ExtensionKind::Module,
        "node",
        &[
            ("node.settings", json!({"use_admin_theme": false})),
            (
                "node.type.article",
                json!({"name": "Article", "dependencies": {"config": ["node.settings"]}}),
            ),
        ],
    );
    site.add_extension(
        ExtensionKind::Theme,
        "olivero",
        &[("olivero.settings", json!({"logo": {"use_default": true}}))],
    );
    site
}

#[test]
fn fresh_install_then_upgrade() {
    let site = standard_site();

    // Install: everything is a create.
    let full = engine(&site).full_changelist(true).unwrap();
    assert_eq!(full[&ExtensionKind::Module].len(), 2);
    assert_eq!(full[&ExtensionKind::Theme].len(), 1);

    let report = engine(&site).initialize_all(true).unwrap();
    assert_eq!(report.status, ReconcileStatus::Clean);
    assert_eq!(report.applied.len(), 4);
    let import = engine(&site).import_staging().unwrap();
    assert_eq!(import.created.len(), 4);
    assert!(engine(&site).full_changelist(false).unwrap().is_empty());

    // The site customizes one setting.
    let mut site_settings = site.active().read("system.site").unwrap().unwrap();
    site_settings["name"] = json!("My Site");
    site.write_active("system.site", &site_settings);

    // An upgrade ships a new front page, a new item and a changed theme setting.
    site.ship(
        ExtensionKind::Module,
        "system",
        "system.site",
        &json!({"name": "Site", "page": {"front": "/home", "403": ""}}),
    );
    site.ship(ExtensionKind::Module, "node", "node.type.page", &json!({"name": "Page"}));
    site.ship(
        ExtensionKind::Theme,
        "olivero",
        "olivero.settings",
        &json!({"logo": {"use_default": false}}),
    );

    // Safe mode leaves the customized item alone.
    let safe = engine(&site).initialize_all(true).unwrap();
    assert_eq!(safe.status, ReconcileStatus::Partial);
    assert_eq!(safe.skipped_names(), vec!["system.site"]);
    assert_eq!(
        safe.applied_names(),
        vec!["node.type.page", "olivero.settings"]
    );

    // Reviewing everything merges the upgrade into the customization.
    let all = engine(&site).initialize_all(false).unwrap();
    assert_eq!(all.status, ReconcileStatus::Clean);
    let staged = site.staging().read("system.site").unwrap().unwrap();
    assert_eq!(
        without_identity(staged),
        json!({"name": "My Site", "page": {"front": "/home", "403": ""}})
    );

    let import = engine(&site).import_staging().unwrap();
    assert_eq!(import.created, vec!["node.type.page"]);
    assert_eq!(import.updated, vec!["olivero.settings", "system.site"]);

    // The new snapshot records the customized value as the baseline.
    assert_eq!(
        without_identity(site.snapshot_active().read("system.site").unwrap().unwrap()),
        json!({"name": "My Site", "page": {"front": "/home", "403": ""}})
    );
    assert!(engine(&site).full_changelist(true).unwrap().is_empty());
}

#[test]
fn translated_configuration_lives_in_its_collection() {
    let mut site = TestSite::new();
    site.add_extension(ExtensionKind::Module, "system", &[("system.site", json!({"name": "Site"}))]);
    let french = Collection::new("language.fr");
    site.shipped(ExtensionKind::Module, "system")
        .with_collection(&french)
        .write("system.site", &json!({"name": "Site FR"}))
        .unwrap();

    let report = engine(&site).initialize_all(true).unwrap();
    assert_eq!(report.applied_names(), vec!["system.site", "language.fr/system.site"]);

    engine(&site).import_staging().unwrap();
    site.assert_file_contains(".config-sync/active/language/fr/system.site.yml", "Site FR");
    site.assert_file_exists(".config-sync/snapshot/upstream/language/fr/system.site.yml");
}

#[test]
fn partial_snapshot_refreshes_one_extension() {
    let site = standard_site();
    engine(&site).initialize_all(true).unwrap();
    engine(&site).import_staging().unwrap();

    site.ship(ExtensionKind::Module, "node", "node.settings", &json!({"use_admin_theme": true}));
    site.ship(ExtensionKind::Module, "system", "system.site", &json!({"name": "Changed"}));

    let report = engine(&site)
        .create_extension_snapshot(ExtensionKind::Module, "node")
        .unwrap();
    assert_eq!(report.extensions, vec!["module:node"]);
    assert_eq!(
        site.snapshot_upstream().read("node.settings").unwrap(),
        Some(json!({"use_admin_theme": true}))
    );
    assert_eq!(
        site.snapshot_upstream().read("system.site").unwrap(),
        Some(json!({"name": "Site", "page": {"front": "/node", "403": ""}}))
    );
}
