//! Config save/load roundtrip integration tests.
//!
//! These tests verify that configuration written to disk loads back with the
//! same values, and that layers combine in precedence order.

use envx_core::config::{Config, ConfigOverlay, KeystoreKind};
use envx_core::error::ConfigError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let global = dir.path().join("home").join("config.json5");

    let config = Config {
        keystore: KeystoreKind::Password,
        name: Some("staging".to_string()),
        account: Some("deploy".to_string()),
        iterations: 250_000,
        backup_on_write: false,
        ..Config::default()
    };
    config.save(&global).unwrap();

    let loaded = Config::load_layered(&global, dir.path()).unwrap();
    assert_eq!(loaded.config, config);
    assert_eq!(loaded.sources, vec![global]);
}

#[test]
fn test_directory_layer_overrides_global() {
    let dir = TempDir::new().unwrap();
    let global = dir.path().join("config.json5");
    fs::write(
        &global,
        "{ keystore: 'keychain', account: 'me', iterations: 200000 }",
    )
    .unwrap();
    fs::write(
        dir.path().join(".envx.json5"),
        "// project settings\n{ keystore: 'password', name: 'dev', }",
    )
    .unwrap();

    let loaded = Config::load_layered(&global, dir.path()).unwrap();
    assert_eq!(loaded.config.keystore, KeystoreKind::Password);
    assert_eq!(loaded.config.account.as_deref(), Some("me"));
    assert_eq!(loaded.config.iterations, 200_000);
    assert_eq!(loaded.config.name.as_deref(), Some("dev"));
    assert_eq!(loaded.sources.len(), 2);
    assert_eq!(
        loaded.config.env_file(None, None),
        Path::new(".env.dev").to_path_buf()
    );
}

#[test]
fn test_no_files_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let loaded = Config::load_layered(&dir.path().join("missing.json5"), dir.path()).unwrap();
    assert_eq!(loaded.config, Config::default());
    assert!(loaded.sources.is_empty());
}

#[test]
fn test_config_parse_invalid() {
    assert!(ConfigOverlay::parse("not valid json5").is_err());
    assert!(ConfigOverlay::parse("{ keystore: 'vault' }").is_err());
    assert!(ConfigOverlay::parse("{ unknown_field: 1 }").is_err());
}

#[test]
fn test_invalid_layer_names_file() {
    let dir = TempDir::new().unwrap();
    let global = dir.path().join("config.json5");
    fs::write(&global, "{ iterations: ").unwrap();

    match Config::load_layered(&global, dir.path()) {
        Err(ConfigError::Json5 { path, .. }) => assert_eq!(path, global),
        other => panic!("expected a JSON5 error, got {other:?}"),
    }
}

#[test]
fn test_validation_after_merge() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".envx.json5"), "{ iterations: 10, file: ' ' }").unwrap();

    match Config::load_layered(&dir.path().join("none.json5"), dir.path()) {
        Err(ConfigError::Validation(message)) => {
            assert!(message.contains("iterations"));
            assert!(message.contains("file"));
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}
