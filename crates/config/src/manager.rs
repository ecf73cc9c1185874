//! Configuration manager - main API for config operations

use crate::app_config::LogLevel;
use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Prefix of environment overrides (`SMARTBOOK_SECTION_FIELD`)
pub const ENV_PREFIX: &str = "SMARTBOOK";

/// Main configuration manager
///
/// Owns the config directory and resolves the data locations derived from it.
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a new config manager using the default config directory
    ///
    /// - Linux: `~/.config/smartbook/`
    /// - macOS: `~/Library/Application Support/smartbook/`
    /// - Windows: `%APPDATA%\smartbook\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = project_dirs()?.config_dir().to_path_buf();
        Self::with_directory(config_dir)
    }

    /// Creates a config manager with a custom config directory
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        if config_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyConfigDir);
        }

        let persistence = ConfigPersistence::new(config_dir.join("config.toml"));
        Ok(Self {
            persistence,
            config_dir,
        })
    }

    /// Returns the config directory path
    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    /// Returns the full config file path
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Resolves the data directory for a config
    ///
    /// An explicit `app.data_dir` wins; otherwise the platform data directory
    /// is used, falling back to the config directory.
    pub fn data_dir(&self, config: &Config) -> PathBuf {
        if let Some(ref dir) = config.app.data_dir {
            return dir.clone();
        }
        match project_dirs() {
            Ok(dirs) => dirs.data_dir().to_path_buf(),
            Err(_) => self.config_dir.clone(),
        }
    }

    /// Location of the session snapshot file
    pub fn session_path(&self, config: &Config) -> PathBuf {
        self.data_dir(config).join(&config.app.session_file)
    }

    /// Location of the library directory
    pub fn library_path(&self, config: &Config) -> PathBuf {
        self.data_dir(config).join(&config.app.library_dir)
    }

    /// Loads the configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file is corrupted, returns an error.
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Saves the configuration to file
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Loads, applies `update_fn` and saves the result atomically
    ///
    /// ```rust,no_run
    /// # use smartbook_config::ConfigManager;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let manager = ConfigManager::new()?;
    /// manager.update(|config| {
    ///     config.player.clip_length_secs = 30.0;
    /// })?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Generates a default config file if one doesn't exist
    ///
    /// Returns Ok(true) if a new file was created, Ok(false) if one already exists.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.persistence.generate_default()?;
        Ok(true)
    }

    /// Resets the configuration to defaults
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Validates the current configuration file
    ///
    /// Returns all validation errors found, or an empty list if valid.
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the config and applies `SMARTBOOK_SECTION_FIELD` overrides
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |name| std::env::var(name).ok());

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }

        Ok(config)
    }
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("", "", "smartbook").ok_or(ConfigError::NoPlatformDirs)
}

/// Applies overrides read through `lookup`
///
/// Unparseable values are ignored with a warning.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |field: &str| lookup(&format!("{}_{}", ENV_PREFIX, field));

    if let Some(level) = var("APP_LOG_LEVEL") {
        match LogLevel::parse(&level) {
            Some(parsed) => config.app.log_level = parsed,
            None => log::warn!("Ignoring invalid log level override: {}", level),
        }
    }

    if let Some(dir) = var("APP_DATA_DIR") {
        if !dir.trim().is_empty() {
            config.app.data_dir = Some(PathBuf::from(dir));
        }
    }

    if let Some(value) = var("PLAYER_SAVE_DEBOUNCE_MS") {
        match value.trim().parse::<u64>() {
            Ok(ms) => config.player.save_debounce_ms = ms,
            Err(_) => log::warn!("Ignoring invalid debounce override: {}", value),
        }
    }

    if let Some(value) = var("PLAYER_DEFAULT_VOLUME") {
        match value.trim().parse::<f64>() {
            Ok(volume) => config.player.default_volume = volume,
            Err(_) => log::warn!("Ignoring invalid volume override: {}", value),
        }
    }

    if let Some(value) = var("PLAYER_DEFAULT_RATE") {
        match value.trim().parse::<f64>() {
            Ok(rate) => config.player.default_rate = rate,
            Err(_) => log::warn!("Ignoring invalid rate override: {}", value),
        }
    }
}
