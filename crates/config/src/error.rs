//! Errors raised while reading and writing the config and session files

use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures of the config layer
///
/// File variants carry the path because the same write path serves both
/// `config.toml` and the session file in the data directory.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Whitespace-only file, usually a truncated write
    #[error("{path} is empty")]
    EmptyFile { path: PathBuf },

    #[error("{path} is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// The TOML parsed but does not fit the `Config` layout
    #[error("Config has an unexpected layout: {0}")]
    Layout(#[source] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Rejected on save; joined field messages
    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to back up {path}: {source}")]
    Backup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} has no parent directory")]
    NoParent { path: PathBuf },

    #[error("Config directory must not be empty")]
    EmptyConfigDir,

    #[error("Could not determine the platform config and data directories")]
    NoPlatformDirs,
}

/// One rejected config field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path such as `player.save_debounce_ms`
    pub field: String,
    pub message: String,
    pub value: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    pub fn with_value(
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            value: Some(value.to_string()),
            ..Self::new(field, message)
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.message)?;
        match &self.value {
            Some(value) => write!(f, " (got {})", value),
            None => Ok(()),
        }
    }
}

impl std::error::Error for ValidationError {}

pub(crate) fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("app.session_file", "must not be empty");
        assert_eq!(err.to_string(), "app.session_file must not be empty");

        let err = ValidationError::with_value(
            "player.clip_length_secs",
            "must be between 1 and 600",
            900,
        );
        assert_eq!(
            err.to_string(),
            "player.clip_length_secs must be between 1 and 600 (got 900)"
        );
    }

    #[test]
    fn test_join_errors() {
        let errors = vec![
            ValidationError::new("a", "is bad"),
            ValidationError::new("b", "is worse"),
        ];
        assert_eq!(join_errors(&errors), "a is bad; b is worse");
    }

    #[test]
    fn test_file_errors_name_the_file() {
        let path = Path::new("/data/smartbook/session.json");
        let err = ConfigError::Write {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to write /data/smartbook/session.json: denied"
        );

        let err = ConfigError::EmptyFile {
            path: PathBuf::from("config.toml"),
        };
        assert_eq!(err.to_string(), "config.toml is empty");
    }
}
