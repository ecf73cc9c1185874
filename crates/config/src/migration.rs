//! Configuration migration system
//!
//! Upgrades old config file formats to the current version. When
//! `CONFIG_VERSION` is incremented, add a migration here.

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};

/// A single upgrade step between two adjacent versions
pub trait Migration {
    /// Returns the version this migration upgrades TO
    fn target_version(&self) -> u32;

    /// Rewrites the raw TOML tree in place
    fn migrate(&self, value: &mut toml::Value) -> ConfigResult<()>;
}

/// Reads the version field of a raw config tree
///
/// Files without a version field are treated as current.
pub fn file_version(value: &toml::Value) -> u32 {
    value
        .get("version")
        .and_then(|v| v.as_integer())
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(CONFIG_VERSION)
}

/// Migrates a raw config tree from its version to the latest and parses it
pub fn migrate_to_latest(mut value: toml::Value) -> ConfigResult<Config> {
    let version = file_version(&value);

    if version > CONFIG_VERSION {
        log::warn!(
            "Config version {} is newer than supported version {}. Attempting to use as-is.",
            version,
            CONFIG_VERSION
        );
    }

    if version < CONFIG_VERSION {
        log::info!(
            "Migrating config from version {} to {}",
            version,
            CONFIG_VERSION
        );

        for next_version in (version + 1)..=CONFIG_VERSION {
            match migration_for(next_version) {
                Some(migration) => {
                    migration.migrate(&mut value)?;
                    log::info!("Applied migration to version {}", migration.target_version());
                }
                None => log::debug!("No migration defined for version {}", next_version),
            }
        }

        if let Some(table) = value.as_table_mut() {
            table.insert(
                "version".to_string(),
                toml::Value::Integer(i64::from(CONFIG_VERSION)),
            );
        }
    }

    value
        .try_into()
        .map_err(ConfigError::Layout)
}

/// Returns the migration for a specific version, if one exists
///
/// The format has not changed since version 1.
fn migration_for(_version: u32) -> Option<Box<dyn Migration>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(config: &Config) -> toml::Value {
        toml::Value::try_from(config).expect("Should convert")
    }

    fn parse(text: &str) -> toml::Value {
        toml::Value::Table(toml::from_str::<toml::Table>(text).expect("Should parse"))
    }

    #[test]
    fn test_migrate_same_version() {
        let config = Config::default();
        let migrated = migrate_to_latest(tree(&config)).expect("Should migrate");
        assert_eq!(migrated, config);
    }

    #[test]
    fn test_migrate_newer_version() {
        let mut config = Config::default();
        config.version = CONFIG_VERSION + 1;

        let migrated = migrate_to_latest(tree(&config)).expect("Should handle newer version");
        assert_eq!(migrated.version, CONFIG_VERSION + 1);
    }

    #[test]
    fn test_missing_version_is_current() {
        let value = parse("[player]\nclip_length_secs = 30.0");
        assert_eq!(file_version(&value), CONFIG_VERSION);
    }

    #[test]
    fn test_older_version_is_restamped() {
        let value = parse(
            r#"
            version = 0
            [player]
            clip_length_secs = 30.0
            "#,
        );
        assert_eq!(file_version(&value), 0);

        let migrated = migrate_to_latest(value).expect("Should migrate");
        assert_eq!(migrated.version, CONFIG_VERSION);
        assert_eq!(migrated.player.clip_length_secs, 30.0);
    }

    #[test]
    fn test_wrong_field_type_is_layout_error() {
        let value = parse("[player]
clip_length_secs = \"long\"");
        let result = migrate_to_latest(value);
        assert!(matches!(result, Err(ConfigError::Layout(_))));
    }

    #[test]
    fn test_config_to_toml_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).expect("Should serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("Should deserialize");
        assert_eq!(parsed, config);
    }
}
