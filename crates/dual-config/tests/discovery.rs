//! Tests for transform config discovery and project config loading

use dual_config::{ConfigError, DualConfig, DifferentialMode, TransformDiscovery};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn discovers_root_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("babel.config.json"),
        r#"{ "presets": [["dual/preset", { "preset-env": { "targets": "chrome 61" } }]] }"#,
    )
    .unwrap();

    let discovery = TransformDiscovery::new(dir.path());
    let found = discovery.find_root_config().unwrap();
    assert_eq!(found.file_name().unwrap(), "babel.config.json");

    let loaded = discovery.load_partial(&dir.path().join("pages")).unwrap().unwrap();
    assert!(loaded.has_filesystem_config());
    assert_eq!(loaded.options.presets.len(), 1);
    assert_eq!(loaded.options.cwd.as_deref(), Some(dir.path()));
}

#[test]
fn discovers_package_json_field() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{
  "name": "test",
  "babel": {
    "plugins": ["transform-x"]
  }
}"#,
    )
    .unwrap();

    let discovery = TransformDiscovery::new(dir.path());
    let found = discovery
        .find_relative_config(&dir.path().join("pages/index.js"))
        .unwrap();
    assert_eq!(found.file_name().unwrap(), "package.json");

    let loaded = discovery.load(&dir.path().join("pages/index.js")).unwrap();
    assert_eq!(loaded.options.plugins[0].name, "transform-x");
}

#[test]
fn package_json_without_field_is_a_boundary() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".babelrc"), r#"{ "presets": ["outer"] }"#).unwrap();
    let pkg = dir.path().join("packages/inner");
    fs::create_dir_all(&pkg).unwrap();
    fs::write(pkg.join("package.json"), r#"{ "name": "inner" }"#).unwrap();

    let discovery = TransformDiscovery::new(dir.path());
    assert!(
        discovery
            .find_relative_config(&pkg.join("index.js"))
            .is_none()
    );
}

#[test]
fn root_and_relative_configs_merge_in_order() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("babel.config.json"), r#"{ "presets": ["root"] }"#).unwrap();
    let pages = dir.path().join("pages");
    fs::create_dir_all(&pages).unwrap();
    fs::write(pages.join(".babelrc"), r#"{ "presets": ["local"] }"#).unwrap();

    let discovery = TransformDiscovery::new(dir.path());
    let loaded = discovery.load(&pages.join("index.js")).unwrap();

    let names: Vec<_> = loaded.options.presets.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["root", "local"]);
    let files: Vec<_> = loaded.files().map(PathBuf::from).collect();
    assert_eq!(files, vec![pages.join(".babelrc"), dir.path().join("babel.config.json")]);
}

#[test]
fn loads_dual_toml() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("dual.toml"),
        r#"
[build]
entry = "src/main.js"
out_dir = "build"

[differential]
enabled = "on"
excluded_plugins = ["analyzer"]
"#,
    )
    .unwrap();

    let config = DualConfig::load(dir.path()).unwrap();
    assert_eq!(config.build.out_dir, PathBuf::from("build"));
    assert_eq!(config.differential.enabled, DifferentialMode::On);
    assert_eq!(config.differential.excluded_plugins, vec!["analyzer".to_string()]);
}

#[test]
fn malformed_dual_toml_is_invalid_value() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("dual.toml"), "[build\nentry = ").unwrap();

    let err = DualConfig::load(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn unknown_split_chunks_mode_in_dual_toml_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("dual.toml"),
        "[optimization.split_chunks]\nchunks = \"bogus\"\n",
    )
    .unwrap();

    let err = DualConfig::load(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}
