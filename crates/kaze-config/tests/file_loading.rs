//! Loading configuration from files on disk.

use std::fs;

use kaze_config::{ConfigError, ConfigLoader, LogFormat};
use tempfile::TempDir;

#[test]
fn loads_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kaze.toml");
    fs::write(
        &path,
        r#"
[server]
http_addr = "127.0.0.1:7000"

[router]
strict_static_prefix = true

[telemetry.logging]
format = "pretty"
"#,
    )
    .unwrap();

    let config = ConfigLoader::new().with_file(&path).unwrap().load().unwrap();
    assert_eq!(config.server.http_addr, "127.0.0.1:7000");
    assert_eq!(config.server.shutdown_timeout_secs, 30);
    assert!(config.router.strict_static_prefix);
    assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
    assert_eq!(config.telemetry.logging.level, "info");
}

#[test]
fn loads_json_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kaze.json");
    fs::write(&path, r#"{"file_router": {"enabled": true, "lazy_bypass_cache": false}}"#).unwrap();

    let config = ConfigLoader::new().with_optional_file(&path).unwrap().load().unwrap();
    assert!(config.file_router.enabled);
    assert!(!config.file_router.lazy_bypass_cache);
    assert_eq!(config.file_router.root, "routes");
}

#[test]
fn rejects_unknown_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kaze.toml");
    fs::write(&path, "[server]\nport = 8080\n").unwrap();

    let err = ConfigLoader::new().with_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::TomlError(_)));
}

#[test]
fn rejects_unknown_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kaze.yaml");
    fs::write(&path, "server: {}\n").unwrap();

    let err = ConfigLoader::new().with_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
}

#[test]
fn invalid_address_fails_validation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kaze.toml");
    fs::write(&path, "[server]\nhttp_addr = \"not-an-address\"\n").unwrap();

    let err = ConfigLoader::new().with_file(&path).unwrap().load().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "server.http_addr"));
}
