//! File system persistence for configuration
//!
//! Config files are written through a temporary file and an atomic rename,
//! with the previous file kept as a `.toml.backup` copy.

use crate::error::join_errors;
use crate::migration::{file_version, migrate_to_latest};
use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::path::{Path, PathBuf};

/// Handles configuration file persistence
pub struct ConfigPersistence {
    config_path: PathBuf,
}

impl ConfigPersistence {
    /// Creates a new persistence handler for the given config file path
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Loads configuration from file
    ///
    /// If the file doesn't exist, returns the default config.
    /// If the file is empty or corrupted, returns an error.
    pub fn load(&self) -> ConfigResult<Config> {
        if !self.config_path.exists() {
            log::info!(
                "Config file not found at {}, using defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        }

        let contents =
            fs::read_to_string(&self.config_path).map_err(|e| ConfigError::Read {
                path: self.config_path.clone(),
                source: e,
            })?;

        // An empty file is a truncated write, not a request for defaults
        if contents.trim().is_empty() {
            return Err(ConfigError::EmptyFile {
                path: self.config_path.clone(),
            });
        }

        let table: toml::Table =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: self.config_path.clone(),
                source: e,
            })?;
        let value = toml::Value::Table(table);
        let needs_upgrade = file_version(&value) < CONFIG_VERSION;

        let config = migrate_to_latest(value)?;

        if needs_upgrade {
            log::info!("Saving migrated config");
            self.save(&config)?;
        }

        // Invalid values are kept so the user can fix them by hand
        if let Err(errors) = config.validate() {
            log::warn!("Config validation warnings: {}", join_errors(&errors));
        }

        Ok(config)
    }

    /// Saves configuration to file atomically
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        if let Err(errors) = config.validate() {
            return Err(ConfigError::Invalid(join_errors(&errors)));
        }

        let toml_string = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;
        write_atomic(&self.config_path, toml_string.as_bytes())?;

        log::info!("Config saved to {}", self.config_path.display());
        Ok(())
    }

    /// Writes the default config to disk
    pub fn generate_default(&self) -> ConfigResult<()> {
        self.save(&Config::default())?;
        log::info!("Generated default config at {}", self.config_path.display());
        Ok(())
    }
}

/// Replaces `path` with `content` via a temporary file in the same directory
///
/// An existing file is copied to `<path>.backup` first; the parent
/// directory is created when missing.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> ConfigResult<()> {
    use std::io::Write;

    let dir = path
        .parent()
        .ok_or_else(|| ConfigError::NoParent {
            path: path.to_path_buf(),
        })?;
    ensure_directory_exists(dir)?;

    if path.exists() {
        let backup_path = backup_path(path);
        fs::copy(path, &backup_path).map_err(|e| ConfigError::Backup {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::debug!("Backed up {} to {}", path.display(), backup_path.display());
    }

    let write_error = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
    temp_file.write_all(content).map_err(write_error)?;
    temp_file.flush().map_err(write_error)?;
    temp_file.persist(path).map_err(|e| write_error(e.error))?;

    Ok(())
}

/// Returns the backup location for a file (`name.ext` becomes `name.ext.backup`)
pub(crate) fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

/// Ensures a directory exists, creating it if necessary
pub(crate) fn ensure_directory_exists(path: &Path) -> ConfigResult<()> {
    if !path.is_dir() {
        fs::create_dir_all(path).map_err(|e| ConfigError::CreateDir {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::info!("Created directory: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup_test_dir() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.toml");
        (temp_dir, config_path)
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path);

        let config = persistence.load().expect("Should load default config");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path);

        let mut config = Config::default();
        config.player.save_debounce_ms = 1500;

        persistence.save(&config).expect("Should save config");
        let loaded = persistence.load().expect("Should load config");

        assert_eq!(loaded.player.save_debounce_ms, 1500);
    }

    #[test]
    fn test_save_creates_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("subdir").join("config.toml");
        let persistence = ConfigPersistence::new(config_path.clone());

        persistence
            .save(&Config::default())
            .expect("Should create directory and save");

        assert!(config_path.exists());
    }

    #[test]
    fn test_backup_created_on_overwrite() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path.clone());

        let config = Config::default();
        persistence.save(&config).expect("Should save config");
        persistence.save(&config).expect("Should save config again");

        assert!(config_path.with_extension("toml.backup").exists());
    }

    #[test]
    fn test_empty_file_is_an_error() {
        let (_temp_dir, config_path) = setup_test_dir();
        fs::write(&config_path, "  \n ").expect("Should write file");

        let result = ConfigPersistence::new(config_path).load();
        assert!(matches!(result, Err(ConfigError::EmptyFile { .. })));
    }

    #[test]
    fn test_invalid_config_returns_error() {
        let (_temp_dir, config_path) = setup_test_dir();
        fs::write(&config_path, "this is not valid TOML {{{").expect("Should write file");

        let result = ConfigPersistence::new(config_path).load();
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_old_version_is_migrated_and_rewritten() {
        let (_temp_dir, config_path) = setup_test_dir();
        fs::write(&config_path, "version = 0\n[player]\nsave_debounce_ms = 4000\n")
            .expect("Should write file");

        let persistence = ConfigPersistence::new(config_path.clone());
        let config = persistence.load().expect("Should migrate");
        assert_eq!(config.player.save_debounce_ms, 4000);

        let rewritten = fs::read_to_string(&config_path).expect("Should read");
        assert!(rewritten.contains(&format!("version = {}", CONFIG_VERSION)));
    }

    #[test]
    fn test_validate_before_save() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path);

        let mut config = Config::default();
        config.player.default_volume = 1.5;

        let result = persistence.save(&config);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_generate_default() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path.clone());

        persistence.generate_default().expect("Should generate default config");

        assert!(config_path.exists());
        let loaded = persistence.load().expect("Should load generated config");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("/data/session.json")),
            PathBuf::from("/data/session.json.backup")
        );
    }
}
