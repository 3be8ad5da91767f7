//! Config file discovery order.

use std::fs;

use skein_config::{ConfigDiscovery, ConfigError, ConfigLoader};
use tempfile::TempDir;

#[test]
fn toml_wins_over_json_and_package_json() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("skein.toml"), "[entry]\nmain = \"./a.js\"\n").unwrap();
    fs::write(dir.path().join("skein.json"), r#"{"entry": {"main": "./b.js"}}"#).unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{"skein": {"entry": {"main": "./c.js"}}}"#,
    )
    .unwrap();

    let found = ConfigDiscovery::new(dir.path()).find().unwrap();
    assert_eq!(found, dir.path().join("skein.toml"));
}

#[test]
fn json_wins_over_package_json() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("skein.json"), r#"{"entry": {"main": "./b.js"}}"#).unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{"skein": {"entry": {"main": "./c.js"}}}"#,
    )
    .unwrap();

    let loaded = ConfigLoader::new(dir.path()).load().unwrap();
    assert_eq!(loaded.source, Some(dir.path().join("skein.json")));
    assert_eq!(loaded.config.entries()[0].specifiers, vec!["./b.js"]);
}

#[test]
fn package_json_field_is_loaded() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("package.json"),
        r#"{"name": "app", "skein": {"entry": {"main": "./src/index.js"}, "clean": true}}"#,
    )
    .unwrap();

    let loaded = ConfigLoader::new(dir.path()).load().unwrap();
    assert!(loaded.config.clean);
    assert_eq!(loaded.base_dir, dir.path());
}

#[test]
fn missing_config_is_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let err = ConfigLoader::new(dir.path()).load().unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
fn explicit_file_resolves_paths_from_its_directory() {
    let dir = TempDir::new().expect("tempdir");
    fs::create_dir_all(dir.path().join("web")).unwrap();
    fs::write(
        dir.path().join("web/build.toml"),
        "context = \"app\"\n[entry]\nmain = \"./src/index.js\"\n[output]\npath = \"../public\"\n",
    )
    .unwrap();

    let loaded = ConfigLoader::new(dir.path())
        .file(Some("web/build.toml"))
        .load()
        .unwrap();
    assert_eq!(loaded.context(), dir.path().join("web/app"));
    assert_eq!(loaded.output_dir(), dir.path().join("public"));
}
