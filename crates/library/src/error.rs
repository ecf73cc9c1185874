// crates/library/src/error.rs

use smartbook_core::{AppError, ErrorCategory};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error(transparent)]
    Core(#[from] AppError),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Metadata extraction failed: {0}")]
    MetadataError(String),

    #[error("Library record is corrupted: {0}")]
    Corrupted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LibraryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Core(e) => e.category(),
            Self::FileNotFound(_)
            | Self::BookNotFound(_)
            | Self::InvalidFile(_)
            | Self::UnsupportedFormat(_)
            | Self::MetadataError(_) => ErrorCategory::Input,
            Self::Corrupted(_) | Self::Io(_) | Self::Json(_) => ErrorCategory::Resource,
        }
    }
}

pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
