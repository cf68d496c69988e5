//! The engine over file-backed stores and a manifest registry

use std::sync::Arc;

use cfgsync_core::snapshot::SnapshotPair;
use cfgsync_core::{ConfigSync, SettingsResolver, SyncStores};
use cfgsync_extensions::{ExtensionKind, ExtensionsManifest, MANIFEST_FILENAME};
use cfgsync_store::{ConfigStore, StoreFormat};
use cfgsync_test_utils::TestSite;
use serde_json::json;

fn engine(site: &TestSite) -> ConfigSync {
    let settings = SettingsResolver::new(site.state_dir()).resolve().unwrap();
    let manifest = ExtensionsManifest::from_path(&site.state_dir().join(MANIFEST_FILENAME)).unwrap();
    let registry = manifest.into_registry(site.root(), StoreFormat::Yaml);
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

#[test]
fn install_writes_item_files() {
    let mut site = TestSite::new();
    site.add_extension(
        ExtensionKind::Module,
        "system",
        &[("system.site", json!({"name": "Drupal", "page": {"front": "/node"}}))],
    );
    site.add_bare_extension(ExtensionKind::Theme, "stark");

    let engine = engine(&site);
    let report = engine.initialize_all(true).unwrap();
    assert_eq!(report.applied_names(), vec!["system.site"]);
    site.assert_file_contains(".config-sync/staging/system.site.yml", "front: /node");

    engine.import_staging().unwrap();
    site.assert_file_exists(".config-sync/active/system.site.yml");
    site.assert_file_exists(".config-sync/snapshot/upstream/system.site.yml");
    site.assert_file_exists(".config-sync/snapshot/active/system.site.yml");
}

#[test]
fn local_settings_change_the_conflict_policy() {
    let mut site = TestSite::new();
    site.add_extension(ExtensionKind::Module, "system", &[("system.site", json!({"name": "A"}))]);
    engine(&site).initialize_all(true).unwrap();
    engine(&site).import_staging().unwrap();

    site.write_active("system.site", &json!({"name": "Local"}));
    site.ship(ExtensionKind::Module, "system", "system.site", &json!({"name": "B"}));
    site.write_file(".config-sync/settings.local.toml", "[merge]\nconflict = \"upstream-wins\"\n");

    let report = engine(&site).initialize_all(false).unwrap();
    assert_eq!(report.conflicted_names(), vec!["system.site"]);
    assert_eq!(
        site.staging().read("system.site").unwrap(),
        Some(json!({"name": "B"}))
    );
}

#[test]
fn unreadable_shipped_item_is_reported_not_fatal() {
    let mut site = TestSite::new();
    site.add_extension(ExtensionKind::Module, "system", &[("system.site", json!({"name": "A"}))]);
    site.write_file("modules/system/config/install/system.broken.yml", "name: [unclosed");

    let report = engine(&site).initialize_all(true).unwrap();
    assert_eq!(report.applied_names(), vec!["system.site"]);
    assert!(
        report.warnings.iter().any(|w| w.starts_with("system.broken")),
        "warnings: {:?}",
        report.warnings
    );
}
