//! Integration tests for the configuration system

use smartbook_config::{Config, ConfigManager, ConfigSection, FileSessionStore, CONFIG_VERSION};
use smartbook_core::{BookKey, BookSession, SessionSnapshot, SessionStore};
use std::fs;
use tempfile::TempDir;

fn setup_test_manager() -> Result<(TempDir, ConfigManager), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())?;
    Ok((temp_dir, manager))
}

#[test]
fn test_full_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    assert!(manager.initialize()?);

    let config = manager.load()?;
    assert_eq!(config.version, CONFIG_VERSION);

    let mut modified = config.clone();
    modified.player.save_debounce_ms = 1000;
    modified.library.recursive_scan = false;
    manager.save(&modified)?;

    let reloaded = manager.load()?;
    assert_eq!(reloaded.player.save_debounce_ms, 1000);
    assert!(!reloaded.library.recursive_scan);

    manager.reset()?;
    assert_eq!(manager.load()?, Config::default());

    Ok(())
}

#[test]
fn test_invalid_config_is_not_saved() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    manager.save(&Config::default())?;

    let mut invalid = Config::default();
    invalid.player.playback_rates = vec![2.0, 1.0];
    assert!(manager.save(&invalid).is_err());

    assert_eq!(manager.load()?, Config::default());
    Ok(())
}

#[test]
fn test_partial_file_fills_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    fs::write(
        manager.config_path(),
        "[player]\nclip_length_secs = 30.0\n\n[app]\nlog_level = \"debug\"\n",
    )?;

    let config = manager.load()?;
    assert_eq!(config.player.clip_length_secs, 30.0);
    assert_eq!(config.player.save_debounce_ms, 2000);
    assert_eq!(config.app.log_level.to_string(), "debug");
    assert!(config.library.validate().is_ok());
    Ok(())
}

#[test]
fn test_session_store_lives_in_data_dir() -> Result<(), Box<dyn std::error::Error>> {
    let (temp_dir, manager) = setup_test_manager()?;
    let mut config = Config::default();
    config.app.data_dir = Some(temp_dir.path().join("data"));

    let mut store = FileSessionStore::new(manager.session_path(&config));
    let mut snapshot = SessionSnapshot::default();
    snapshot.set_book(
        BookKey::new("a.mp3"),
        BookSession {
            current_time: 12.0,
            ..Default::default()
        },
    );
    store.save(&snapshot)?;

    assert!(temp_dir.path().join("data").join("session.json").exists());
    let reopened = FileSessionStore::new(manager.session_path(&config));
    assert_eq!(reopened.load()?, snapshot);
    Ok(())
}

#[test]
fn test_serialization_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let toml_string = toml::to_string(&config)?;
    let deserialized: Config = toml::from_str(&toml_string)?;
    assert_eq!(config, deserialized);
    Ok(())
}
