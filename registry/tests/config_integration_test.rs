//! Integration tests for configuration management

use conference_registry::config::Config;
use conference_registry::Policy;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_full_config() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    let path = dir.path().join("config.toml");

    let toml_content = format!(
        r#"
[core]
log_level = "debug"
data_dir = "{}"

[accounts]
seed_test_accounts = false

[policy]
strict_transitions = true
one_review_per_reviewer = true

[notifications]
dismiss_after_ms = 5000
"#,
        data_dir.display()
    );
    std::fs::write(&path, toml_content).unwrap();

    let config = Config::load_from_path(&path).unwrap();

    assert_eq!(config.core.log_level, "debug");
    assert!(!config.accounts.seed_test_accounts);
    assert_eq!(config.policy(), Policy::strict());
    assert_eq!(config.dismiss_after(), Duration::from_millis(5000));
    assert!(data_dir.is_dir());
    assert_eq!(config.snapshot_path(), data_dir.join("registry.json"));
    assert_eq!(config.identity_path(), data_dir.join("identity.json"));
}

#[test]
fn test_invalid_log_level_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[core]\nlog_level = \"loud\"\n").unwrap();

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("Invalid log level"));
}

#[test]
fn test_zero_dismiss_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    let content = format!(
        "[core]\ndata_dir = \"{}\"\n\n[notifications]\ndismiss_after_ms = 0\n",
        dir.path().join("data").display()
    );
    std::fs::write(&path, content).unwrap();

    assert!(Config::load_from_path(&path).is_err());
}

#[test]
fn test_partial_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        format!("[core]\ndata_dir = \"{}\"\n", dir.path().join("d").display()),
    )
    .unwrap();

    let config = Config::load_or_create_at(&path).unwrap();
    assert_eq!(config.core.log_level, "info");
    assert!(config.accounts.seed_test_accounts);
    assert_eq!(config.policy(), Policy::default());
    assert!(dir.path().join("d").is_dir());
}

#[test]
fn test_malformed_toml_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[core\nlog_level = ").unwrap();

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}
