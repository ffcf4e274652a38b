//! Unit tests for configuration loading and root folder resolution
//!
//! Tests that manipulate WATCHME_VAULT_ROOT or WATCHME_LOCAL_DEV are marked
//! with #[serial] so they do not race on the process environment.

use std::env;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;
use vault_common::config::{
    resolve_root_folder, ConfigOverrides, LoggingConfig, TomlConfig, VaultConfig,
    DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT, DEFAULT_ROOT_FOLDER, LOCAL_DEV_ENV_VAR,
    LOCAL_DEV_ROOT_FOLDER, ROOT_ENV_VAR,
};
use vault_common::Error;

fn clear_env() {
    env::remove_var(ROOT_ENV_VAR);
    env::remove_var(LOCAL_DEV_ENV_VAR);
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_default_root_folder() {
    clear_env();
    let root = resolve_root_folder(None, &TomlConfig::default());
    assert_eq!(root, PathBuf::from(DEFAULT_ROOT_FOLDER));
}

#[test]
#[serial]
fn test_cli_argument_wins() {
    clear_env();
    env::set_var(ROOT_ENV_VAR, "/tmp/from-env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..TomlConfig::default()
    };

    let root = resolve_root_folder(Some(Path::new("/tmp/from-cli")), &toml);
    assert_eq!(root, PathBuf::from("/tmp/from-cli"));
    clear_env();
}

#[test]
#[serial]
fn test_env_var_beats_local_dev_and_toml() {
    clear_env();
    env::set_var(ROOT_ENV_VAR, "/tmp/from-env");
    env::set_var(LOCAL_DEV_ENV_VAR, "1");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..TomlConfig::default()
    };

    assert_eq!(resolve_root_folder(None, &toml), PathBuf::from("/tmp/from-env"));
    clear_env();
}

#[test]
#[serial]
fn test_local_dev_flag_selects_local_root() {
    clear_env();
    env::set_var(LOCAL_DEV_ENV_VAR, "1");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..TomlConfig::default()
    };

    assert_eq!(
        resolve_root_folder(None, &toml),
        PathBuf::from(LOCAL_DEV_ROOT_FOLDER)
    );

    // Only the exact value "1" enables it
    env::set_var(LOCAL_DEV_ENV_VAR, "true");
    assert_eq!(resolve_root_folder(None, &toml), PathBuf::from("/tmp/from-toml"));
    clear_env();
}

#[test]
fn test_parse_full_toml() {
    let config = TomlConfig::parse(
        r#"
        root_folder = "/srv/vault"
        bind_addr = "127.0.0.1"
        port = 9001
        max_upload_bytes = 1048576

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/vault")));
    assert_eq!(config.bind_addr.as_deref(), Some("127.0.0.1"));
    assert_eq!(config.port, Some(9001));
    assert_eq!(config.max_upload_bytes, Some(1_048_576));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_parse_empty_toml_uses_defaults() {
    let config = TomlConfig::parse("").unwrap();
    assert!(config.root_folder.is_none());
    assert_eq!(config.logging, LoggingConfig::default());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_explicit_missing_config_is_error() {
    let dir = TempDir::new().unwrap();
    let result = TomlConfig::load_or_default(Some(&dir.path().join("missing.toml")));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_malformed_config_is_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "port = \"not a number\"");
    assert!(matches!(TomlConfig::load(&path), Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_resolve_layers_overrides_over_toml() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        root_folder = "/srv/vault"
        bind_addr = "127.0.0.1"
        port = 9001
        "#,
    );

    let config = VaultConfig::resolve(ConfigOverrides {
        port: Some(7000),
        config_path: Some(path),
        ..ConfigOverrides::default()
    })
    .unwrap();

    assert_eq!(config.root_folder, PathBuf::from("/srv/vault"));
    assert_eq!(config.bind_addr, "127.0.0.1");
    assert_eq!(config.port, 7000);
    assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    assert_eq!(config.socket_addr(), "127.0.0.1:7000");
}

#[test]
fn test_with_root_defaults() {
    let config = VaultConfig::with_root("/tmp/vault");
    assert_eq!(config.root_folder, PathBuf::from("/tmp/vault"));
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.socket_addr(), format!("0.0.0.0:{}", DEFAULT_PORT));
}
