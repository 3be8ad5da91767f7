//! Layered loading: file, profile, environment and overrides.

use std::fs;

use skein_config::{ConfigLoader, ConfigOverrides, validate};
use skein_graph::Mode;
use tempfile::TempDir;

const ELM_SASS_CONFIG: &str = r#"
mode = "development"

[entry]
main = ["./src/index.js"]

[output]
path = "dist"
filename = "[name].js"

[module]
noParse = '\.elm$'

[[module.rules]]
test = '\.elm$'
exclude = ['elm-stuff', 'node_modules']
use = { loader = "elm-webpack-loader", options = { cwd = "src" } }

[[module.rules]]
test = '\.s[ca]ss$'
exclude = 'node_modules'
use = ["style-loader", "css-loader", "sass-loader"]

[[module.rules]]
test = '\.html$'
exclude = 'node_modules'
use = "file-loader?name=[name].[ext]"

[profiles.production]
mode = "production"
output = { filename = "[name].[contenthash].js" }
"#;

fn write_config(dir: &TempDir) {
    fs::write(dir.path().join("skein.toml"), ELM_SASS_CONFIG).unwrap();
}

#[test]
fn full_config_compiles_to_rules() {
    let dir = TempDir::new().expect("tempdir");
    write_config(&dir);

    let loaded = ConfigLoader::new(dir.path())
        .env_prefix("SKEIN_TEST_FULL_")
        .load()
        .unwrap();
    validate(&loaded.config).unwrap();

    let rules = loaded.config.module.rule_set().unwrap();
    assert_eq!(rules.len(), 3);
    assert_eq!(rules.rules()[1].loaders.len(), 3);
    assert_eq!(rules.rules()[2].loaders[0].options["name"], "[name].[ext]");

    let no_parse = loaded.config.module.no_parse_set().unwrap();
    assert!(no_parse.is_match(&dir.path().join("src/Main.elm")));
}

#[test]
fn profile_then_overrides() {
    let dir = TempDir::new().expect("tempdir");
    write_config(&dir);

    let loaded = ConfigLoader::new(dir.path())
        .env_prefix("SKEIN_TEST_PROFILE_")
        .profile(Some("production"))
        .load()
        .unwrap();
    assert_eq!(loaded.config.mode, Mode::Production);
    assert_eq!(loaded.config.output.filename, "[name].[contenthash].js");

    let loaded = ConfigLoader::new(dir.path())
        .env_prefix("SKEIN_TEST_PROFILE_")
        .profile(Some("production"))
        .overrides(ConfigOverrides::default().mode(Mode::Development).out_dir("build"))
        .load()
        .unwrap();
    assert_eq!(loaded.config.mode, Mode::Development);
    assert_eq!(loaded.output_dir(), dir.path().join("build"));
    assert_eq!(loaded.config.output.filename, "[name].[contenthash].js");
}

#[test]
fn environment_overrides_file() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("skein.toml", ELM_SASS_CONFIG)?;
        jail.set_env("SKEIN_TEST_ENV_MODE", "production");
        jail.set_env("SKEIN_TEST_ENV_OUTPUT__PATH", "out");
        jail.set_env("SKEIN_TEST_ENV_SETTINGS__PARALLELJOBS", "3");

        let loaded = ConfigLoader::new(jail.directory())
            .env_prefix("SKEIN_TEST_ENV_")
            .load()
            .unwrap();

        assert_eq!(loaded.config.mode, Mode::Production);
        assert_eq!(loaded.output_dir(), jail.directory().join("out"));
        assert_eq!(loaded.config.settings.parallel_jobs, Some(3));
        assert_eq!(loaded.config.output.filename, "[name].js");
        Ok(())
    });
}

#[test]
fn unknown_profile_fails() {
    let dir = TempDir::new().expect("tempdir");
    write_config(&dir);

    let err = ConfigLoader::new(dir.path())
        .env_prefix("SKEIN_TEST_UNKNOWN_")
        .profile(Some("staging"))
        .load()
        .unwrap_err();
    assert!(err.to_string().contains("staging"));
    assert!(err.to_string().contains("production"));
}
