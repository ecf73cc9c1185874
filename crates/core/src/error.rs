//! Error types and recovery strategies for SmartBook
//!
//! Every failure falls into one of four categories:
//! - **Input**: bad file, unparseable chapters, not enough playback for a clip.
//!   Reported to the caller, state is left unchanged.
//! - **Resource**: library or session store unavailable. Logged, and the
//!   operation continues with defaults.
//! - **Transient**: cover/genre lookups. Silently replaced by fallbacks.
//! - **Invariant**: values that can never be valid (non-finite times).
//!   Rejected at the boundary.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure category, used to pick a recovery strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Input,
    Resource,
    Transient,
    Invariant,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "Input"),
            Self::Resource => write!(f, "Resource"),
            Self::Transient => write!(f, "Transient"),
            Self::Invariant => write!(f, "Invariant"),
        }
    }
}

/// What the caller should do after an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Show a message, keep the current state
    ReportToUser,
    /// Continue with default values (empty library, fresh stats)
    UseDefaults,
    /// Substitute a fallback value without telling the user
    UseFallback,
    /// Drop the request at the boundary
    Reject,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReportToUser => write!(f, "Reporting to user"),
            Self::UseDefaults => write!(f, "Continuing with defaults"),
            Self::UseFallback => write!(f, "Using fallback value"),
            Self::Reject => write!(f, "Rejecting request"),
        }
    }
}

/// Main error type for SmartBook
#[derive(Error, Debug)]
pub enum AppError {
    /// Audiobook data failed validation
    #[error("Invalid audiobook: {}", .reasons.join("; "))]
    InvalidAudiobook { reasons: Vec<String> },

    /// Requested entity does not exist
    #[error("Not found: {entity} with {identifier}")]
    NotFound { entity: String, identifier: String },

    /// Invalid argument provided
    #[error("Invalid argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },

    /// Chapter data could not be parsed
    #[error("Chapter parse error: {reason}")]
    ChapterParse { reason: String },

    /// Backing store cannot be reached
    #[error("Store unavailable: {store} - {reason}")]
    StoreUnavailable { store: String, reason: String },

    /// Stored data could not be decoded
    #[error("Store corrupted at {path}: {reason}")]
    StoreCorrupted { path: PathBuf, reason: String },

    /// General I/O error
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },

    /// Serialization of stored data failed
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Cover or genre lookup failed
    #[error("Lookup failed: {service} - {reason}")]
    LookupFailed { service: String, reason: String },

    /// A time or level was NaN or infinite
    #[error("Non-finite value for {field}")]
    NonFiniteValue { field: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Returns the failure category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidAudiobook { .. }
            | Self::NotFound { .. }
            | Self::InvalidArgument { .. }
            | Self::ChapterParse { .. } => ErrorCategory::Input,

            Self::StoreUnavailable { .. }
            | Self::StoreCorrupted { .. }
            | Self::Io { .. }
            | Self::Serialization { .. }
            | Self::Internal { .. } => ErrorCategory::Resource,

            Self::LookupFailed { .. } => ErrorCategory::Transient,

            Self::NonFiniteValue { .. } => ErrorCategory::Invariant,
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self.category() {
            ErrorCategory::Input => RecoveryAction::ReportToUser,
            ErrorCategory::Resource => RecoveryAction::UseDefaults,
            ErrorCategory::Transient => RecoveryAction::UseFallback,
            ErrorCategory::Invariant => RecoveryAction::Reject,
        }
    }

    /// Returns a user-friendly error message suitable for display in the UI
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidAudiobook { .. } => "This audiobook could not be opened.".to_string(),
            Self::NotFound { entity, .. } => format!("The requested {} was not found.", entity),
            Self::InvalidArgument { .. } => "Invalid input provided.".to_string(),
            Self::ChapterParse { .. } => {
                "Chapters could not be read. The book will play as a single chapter.".to_string()
            }
            Self::StoreUnavailable { .. } | Self::Io { .. } => {
                "Saved data is temporarily unavailable. Continuing with defaults.".to_string()
            }
            Self::StoreCorrupted { .. } | Self::Serialization { .. } => {
                "Saved data is damaged and was reset.".to_string()
            }
            Self::LookupFailed { .. } => String::new(),
            Self::NonFiniteValue { .. } => "That position is not valid.".to_string(),
            Self::Internal { .. } => "An unexpected error occurred. Please try again.".to_string(),
        }
    }

    /// Returns true if the error should be shown to the user at all
    pub fn is_user_visible(&self) -> bool {
        self.category() != ErrorCategory::Transient
    }

    /// Helper to create a not-found error
    pub fn not_found(entity: impl Into<String>, identifier: impl fmt::Display) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.to_string(),
        }
    }

    /// Helper to create a store-unavailable error
    pub fn store_unavailable(store: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::StoreUnavailable {
            store: store.into(),
            reason: reason.to_string(),
        }
    }

    /// Helper to reject a non-finite number
    pub fn non_finite(field: impl Into<String>) -> Self {
        Self::NonFiniteValue {
            field: field.into(),
        }
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
        }
    }
}
