use promptroute_core::{ConfigError, ConfigManager, PromptRouteConfig, Sensitivity};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_default_configuration() {
    let config = PromptRouteConfig::default();
    assert!(ConfigManager::validate_config(&config).is_ok());
    assert_eq!(config.routing.complex_preference_threshold, 60);
    assert_eq!(config.routing.simple_preference_threshold, 25);
    assert_eq!(config.routing.min_score_ratio, 0.8);
    assert_eq!(config.loader.profiles_dir, PathBuf::from("profiles"));
    assert_eq!(config.watch.debounce_ms, 250);
}

#[test]
fn test_load_from_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[parser]
complex_word_threshold = 80
medium_word_threshold = 30

[parser.sensitivity_bands]
medium = 2
high = 4
critical = 8

[routing]
complexity_switching = false
confidence_temperature = 2.5
complex_suffix = "_deep"

[loader]
profiles_dir = "custom/profiles"
file_read_timeout_ms = 500

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let manager = ConfigManager::load_from_path(&path).unwrap();
    assert_eq!(manager.config_path(), Some(path.as_path()));

    let config = manager.config();
    assert_eq!(config.parser.complex_word_threshold, 80);
    assert_eq!(config.parser.sensitivity_bands.level(3), Sensitivity::Medium);
    assert_eq!(config.parser.sensitivity_bands.level(8), Sensitivity::Critical);
    assert!(!config.routing.complexity_switching);
    assert_eq!(config.routing.confidence_temperature, 2.5);
    assert_eq!(config.routing.complex_suffix, "_deep");
    assert_eq!(config.loader.file_read_timeout_ms, 500);
    assert_eq!(config.loader.max_concurrent_reads, 8);
    assert_eq!(config.logging.format, "json");
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let result = ConfigManager::load_from_path(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[routing]\nmin_score_ratio = 1.5\n").unwrap();
    assert!(matches!(
        ConfigManager::load_from_path(&path),
        Err(ConfigError::ValidationError(_))
    ));

    fs::write(&path, "[routing]\nmin_score_ratio = \"high\"\n").unwrap();
    assert!(matches!(
        ConfigManager::load_from_path(&path),
        Err(ConfigError::ParseError(_))
    ));

    let mut config = PromptRouteConfig::default();
    config.routing.simple_preference_threshold = 100;
    assert!(ConfigManager::from_config(config).is_err());
}

#[test]
fn test_environment_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[routing]\ncomplex_preference_threshold = 70\n").unwrap();

    std::env::set_var("PROMPTROUTE_COMPLEX_THRESHOLD", "90");
    let config = ConfigManager::load_from_path(&path).unwrap().into_config();
    std::env::remove_var("PROMPTROUTE_COMPLEX_THRESHOLD");

    assert_eq!(config.routing.complex_preference_threshold, 90);
}
