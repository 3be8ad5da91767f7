//! End-to-end tests of the `skein` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = r#"
[entry]
main = "./src/index.js"

[output]
path = "dist"

[module]
noParse = "\\.min\\.js$"

[[module.rules]]
test = "\\.css$"
use = ["style-loader", "css-loader"]

[[module.rules]]
test = "\\.txt$"
use = "raw-loader"

[profiles.release]
mode = "production"
output = { filename = "[name].[contenthash].js" }
"#;

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "skein.toml", CONFIG);
    write(
        root,
        "src/index.js",
        "require('./style.css');\nvar notes = require('./notes.txt');\n",
    );
    write(root, "src/style.css", "main { display: block; }\n");
    write(root, "src/notes.txt", "hello\n");
    dir
}

#[allow(deprecated)]
fn skein_cmd() -> Command {
    Command::cargo_bin("skein").unwrap()
}

fn skein(dir: &TempDir) -> Command {
    let mut cmd = skein_cmd();
    cmd.current_dir(dir.path()).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_commands() {
    skein_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn build_writes_one_bundle_per_entry() {
    let dir = project();

    skein(&dir)
        .arg("build")
        .assert()
        .success()
        .stderr(predicate::str::contains("Build Summary"))
        .stderr(predicate::str::contains("main.js"));

    let bundle = fs::read_to_string(dir.path().join("dist/main.js")).unwrap();
    assert!(bundle.contains("main { display: block; }"));
    assert!(bundle.contains("document.createElement(\"style\")"));
    assert!(bundle.contains("hello"));
}

#[test]
fn out_dir_and_profile_flags() {
    let dir = project();

    skein(&dir)
        .args(["build", "--profile", "release", "--out-dir", "public"])
        .assert()
        .success();

    let names: Vec<String> = fs::read_dir(dir.path().join("public"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1, "{names:?}");
    assert!(names[0].starts_with("main.") && names[0].ends_with(".js"), "{names:?}");
    assert_ne!(names[0], "main.js");
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn unresolved_import_fails_without_output() {
    let dir = project();
    write(dir.path(), "src/index.js", "require('./missing');\n");

    skein(&dir)
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot resolve './missing'"));

    assert!(!dir.path().join("dist").exists());
}

#[test]
fn missing_config_fails() {
    let dir = TempDir::new().unwrap();

    skein(&dir)
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no skein config found"));
}

#[test]
fn check_explains_paths() {
    let dir = project();

    skein(&dir)
        .args(["check", "src/style.css", "src/app.js", "lib/vendor.min.js"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rule:    #0"))
        .stdout(predicate::str::contains("css-loader -> style-loader"))
        .stdout(predicate::str::contains("none (passed through unchanged)"))
        .stdout(predicate::str::contains("skipped (noParse)"));
}

#[test]
fn check_fails_on_ambiguous_rules() {
    let dir = project();
    let config = format!("{CONFIG}\n[[module.rules]]\ntest = \"style\"\nuse = \"raw-loader\"\n");
    write(dir.path(), "skein.toml", &config);

    skein(&dir)
        .args(["check", "src/style.css"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("shadows: #2"))
        .stderr(predicate::str::contains("different loader chains"));
}

#[test]
fn check_reports_unknown_loader() {
    let dir = project();
    write(
        dir.path(),
        "skein.toml",
        "[entry]\nmain = \"./src/index.js\"\n\n[[module.rules]]\ntest = \"\\\\.styl$\"\nuse = \"stylus-loader\"\n",
    );

    skein(&dir)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("stylus"));
}
