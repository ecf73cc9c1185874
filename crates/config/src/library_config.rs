//! Library and import configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Library management and import settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LibraryConfig {
    /// Audio file extensions accepted by import, lowercase without the dot
    pub supported_extensions: Vec<String>,

    /// Recurse into subdirectories when importing a directory
    pub recursive_scan: bool,

    /// Read title/author/narrator tags from imported files
    pub extract_tags: bool,

    /// Ask the cover lookup service for artwork on import
    pub fetch_cover_art: bool,

    /// Ask the genre classifier for a genre on import
    pub classify_genre: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            supported_extensions: vec![
                "mp3".to_string(),
                "m4a".to_string(),
                "m4b".to_string(),
                "ogg".to_string(),
                "flac".to_string(),
                "wav".to_string(),
            ],
            recursive_scan: true,
            extract_tags: true,
            fetch_cover_art: false,
            classify_genre: false,
        }
    }
}

impl LibraryConfig {
    /// Returns true if a file extension is accepted, ignoring case
    pub fn accepts_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.supported_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}

impl ConfigSection for LibraryConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![Validator::non_empty_list(
            &self.supported_extensions,
            "library.supported_extensions",
        )];

        for (i, ext) in self.supported_extensions.iter().enumerate() {
            let field = format!("library.supported_extensions[{}]", i);
            results.push(Validator::not_empty(ext, &field));
            if ext.starts_with('.') {
                results.push(Err(ValidationError::with_value(
                    field,
                    "must not start with a dot",
                    ext,
                )));
            }
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.supported_extensions = other.supported_extensions;
        self.recursive_scan = other.recursive_scan;
        self.extract_tags = other.extract_tags;
        self.fetch_cover_art = other.fetch_cover_art;
        self.classify_genre = other.classify_genre;
    }

    fn section_name(&self) -> &'static str {
        "library"
    }
}
