use smartbook_core::{AppError, EntryId, ErrorCategory};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No audiobook is loaded")]
    NoAudioLoaded,

    #[error("Need at least {required}s of playback to create a clip (at {position}s)")]
    InsufficientPlayback { position: f64, required: f64 },

    #[error("A clip is already being created")]
    ClipBusy,

    #[error("Clip not found: {0}")]
    ClipNotFound(EntryId),

    #[error("No clip is open")]
    NoClipActive,

    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(EntryId),

    #[error("Chapter {index} out of range ({count} chapters)")]
    ChapterOutOfRange { index: usize, count: usize },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: f64 },

    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Seek error: {0}")]
    Seek(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Clip {0} is already being exported")]
    ExportInProgress(EntryId),

    #[error("Session engine has shut down")]
    ShutDown,

    #[error(transparent)]
    Core(#[from] AppError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::NoAudioLoaded
            | EngineError::InsufficientPlayback { .. }
            | EngineError::ClipBusy
            | EngineError::ClipNotFound(_)
            | EngineError::NoClipActive
            | EngineError::BookmarkNotFound(_)
            | EngineError::ChapterOutOfRange { .. }
            | EngineError::ExportInProgress(_) => ErrorCategory::Input,
            EngineError::InvalidValue { .. } => ErrorCategory::Invariant,
            EngineError::Device(_)
            | EngineError::Decode(_)
            | EngineError::Seek(_)
            | EngineError::Export(_)
            | EngineError::ShutDown
            | EngineError::Io(_) => ErrorCategory::Resource,
            EngineError::Core(err) => err.category(),
        }
    }

    /// Message suitable for showing to the listener
    pub fn user_message(&self) -> String {
        match self {
            EngineError::InsufficientPlayback { required, .. } => {
                format!("Play at least {} second(s) before creating a clip", required)
            }
            EngineError::Core(err) => err.user_message(),
            other => other.to_string(),
        }
    }

    pub(crate) fn invalid(field: &'static str, value: f64) -> Self {
        EngineError::InvalidValue { field, value }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(EngineError::ClipBusy.category(), ErrorCategory::Input);
        assert_eq!(
            EngineError::invalid("seek", f64::NAN).category(),
            ErrorCategory::Invariant
        );
        assert_eq!(
            EngineError::Device("gone".into()).category(),
            ErrorCategory::Resource
        );
        let store = AppError::store_unavailable("session file", "disk full");
        assert_eq!(EngineError::from(store).category(), ErrorCategory::Resource);
    }

    #[test]
    fn test_insufficient_playback_message() {
        let err = EngineError::InsufficientPlayback {
            position: 0.5,
            required: 1.0,
        };
        assert!(err.to_string().contains("0.5"));
        assert!(err.user_message().contains("1 second"));
    }
}
