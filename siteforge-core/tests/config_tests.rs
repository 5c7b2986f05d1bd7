//! Config loading error messages and path resolution against a real project tree.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use siteforge_core::{config, AssetClass, CoreError, ProjectPaths};

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn corrupt_yaml_returns_parse_error_with_path() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("siteforge.yaml")
        .write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_at(root.path()).unwrap_err();
    assert!(matches!(err, CoreError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("siteforge.yaml"), "got: {err}");
}

#[test]
fn wrong_type_yaml_returns_parse_error() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("siteforge.yaml")
        .write_str("- a list, not a mapping\n")
        .expect("write");

    let err = config::load_at(root.path()).unwrap_err();
    assert!(matches!(err, CoreError::Parse { .. }), "got: {err}");
}

#[test]
fn empty_file_is_all_defaults() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("siteforge.yaml").touch().expect("touch");

    let loaded = config::load_at(root.path()).expect("load");
    assert_eq!(loaded, config::ProjectConfig::default());
}

// ---------------------------------------------------------------------------
// 2. Path resolution
// ---------------------------------------------------------------------------

#[test]
fn custom_dirs_flow_into_resolved_paths() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("siteforge.yaml")
        .write_str("build_dir: public\nassets_dir: assets\nmanifest: rev.json\n")
        .expect("write");

    let loaded = config::load_at(root.path()).expect("load");
    let paths = ProjectPaths::resolve(root.path(), &loaded);

    assert_eq!(paths.class_build(AssetClass::Scripts), root.path().join("public").join("js"));
    assert_eq!(paths.class_source(AssetClass::Fonts), root.path().join("assets").join("fonts"));
    assert_eq!(paths.manifest, root.path().join("rev.json"));
}

#[test]
fn serialized_defaults_load_back_identically() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let yaml = serde_yaml::to_string(&config::ProjectConfig::default()).expect("serialize");
    root.child("siteforge.yaml").write_str(&yaml).expect("write");

    root.child("siteforge.yaml")
        .assert(predicate::str::contains("max-age=31536000, no-transform, public"));
    let loaded = config::load_at(root.path()).expect("load");
    assert_eq!(loaded, config::ProjectConfig::default());
}
