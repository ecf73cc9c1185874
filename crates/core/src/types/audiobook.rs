//! Audiobook and chapter domain models

use crate::types::{AudioHandle, BookKey, Validator};
use serde::{Deserialize, Serialize};

/// A named interval of an audiobook's timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Unique within the audiobook, 1-based
    pub id: u32,
    pub title: String,
    /// Start of the chapter in seconds
    pub start_time: f64,
}

impl Chapter {
    pub fn new(id: u32, title: impl Into<String>, start_time: f64) -> Self {
        Self {
            id,
            title: title.into(),
            start_time,
        }
    }
}

/// An audiobook as loaded into the session engine
///
/// Immutable once loaded; a fresh load replaces it wholesale. The audio handle
/// belongs to whoever performed the load and must be released by them.
#[derive(Debug, Clone, PartialEq)]
pub struct Audiobook {
    pub key: BookKey,
    pub title: String,
    pub author: String,
    pub narrator: String,
    /// Cover image reference (URL, data URI or path)
    pub cover: String,
    pub genre: Option<String>,
    pub chapters: Vec<Chapter>,
    pub audio: AudioHandle,
}

impl Audiobook {
    /// Creates an audiobook with placeholder metadata
    pub fn new(
        key: BookKey,
        title: impl Into<String>,
        chapters: Vec<Chapter>,
        audio: AudioHandle,
    ) -> Self {
        Self {
            key,
            title: title.into(),
            author: "Unknown Author".to_string(),
            narrator: "Unknown Narrator".to_string(),
            cover: String::new(),
            genre: None,
            chapters,
            audio,
        }
    }

    /// Builder method to set the author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Builder method to set the narrator
    pub fn with_narrator(mut self, narrator: impl Into<String>) -> Self {
        self.narrator = narrator.into();
        self
    }

    /// Builder method to set the cover reference
    pub fn with_cover(mut self, cover: impl Into<String>) -> Self {
        self.cover = cover.into();
        self
    }

    /// Returns the chapter at `index`, if any
    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }
}

impl Validator for Audiobook {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.key.as_str().trim().is_empty() {
            errors.push("Key cannot be empty".to_string());
        }

        if self.title.trim().is_empty() {
            errors.push("Title cannot be empty".to_string());
        }

        if self.chapters.is_empty() {
            errors.push("Audiobook must have at least one chapter".to_string());
        }

        if self
            .chapters
            .iter()
            .any(|c| !c.start_time.is_finite() || c.start_time < 0.0)
        {
            errors.push("Chapter start times must be finite and non-negative".to_string());
        }

        if self
            .chapters
            .windows(2)
            .any(|pair| pair[1].start_time < pair[0].start_time)
        {
            errors.push("Chapters must be sorted by start time".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(chapters: Vec<Chapter>) -> Audiobook {
        Audiobook::new(
            BookKey::new("dune.m4b"),
            "Dune",
            chapters,
            AudioHandle::new("/tmp/dune.m4b"),
        )
    }

    #[test]
    fn test_new_audiobook_defaults() {
        let b = book(vec![Chapter::new(1, "Introduction", 0.0)]);
        assert_eq!(b.author, "Unknown Author");
        assert_eq!(b.narrator, "Unknown Narrator");
        assert!(b.is_valid());
    }

    #[test]
    fn test_builder_methods() {
        let b = book(vec![Chapter::new(1, "Introduction", 0.0)])
            .with_author("Frank Herbert")
            .with_narrator("Scott Brick")
            .with_cover("cover.jpg");
        assert_eq!(b.author, "Frank Herbert");
        assert_eq!(b.narrator, "Scott Brick");
        assert_eq!(b.cover, "cover.jpg");
    }

    #[test]
    fn test_validation_rejects_empty_chapters() {
        let errors = book(Vec::new()).validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("at least one chapter")));
    }

    #[test]
    fn test_validation_rejects_unsorted_chapters() {
        let b = book(vec![
            Chapter::new(1, "A", 0.0),
            Chapter::new(2, "B", 100.0),
            Chapter::new(3, "C", 50.0),
        ]);
        let errors = b.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("sorted")));
    }

    #[test]
    fn test_validation_rejects_nan_start() {
        let b = book(vec![Chapter::new(1, "A", f64::NAN)]);
        assert!(!b.is_valid());
    }

    #[test]
    fn test_chapter_serialization() {
        let json = serde_json::to_string(&Chapter::new(2, "One", 12.5)).unwrap();
        assert!(json.contains("\"start_time\":12.5"));
    }
}
