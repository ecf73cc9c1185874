//! Bookmark domain model

use crate::time::format_time;
use crate::types::{EntryId, Validator};
use serde::{Deserialize, Serialize};

/// A user bookmark at a position in the active audiobook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: EntryId,
    /// Position in seconds
    pub time: f64,
    pub title: String,
    /// Index of the chapter covering `time` when the bookmark was made
    pub chapter: usize,
}

impl Bookmark {
    /// Creates a bookmark titled after its formatted position
    pub fn new(id: EntryId, time: f64, chapter: usize) -> Self {
        Self {
            id,
            time,
            title: format!("Bookmark at {}", format_time(time)),
            chapter,
        }
    }
}

impl Validator for Bookmark {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.time.is_finite() || self.time < 0.0 {
            errors.push("Bookmark time must be finite and non-negative".to_string());
        }

        if self.title.trim().is_empty() {
            errors.push("Bookmark title cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Inserts a bookmark and keeps the list ordered by time
///
/// Bookmarks at the same time keep their insertion order.
pub fn insert_sorted(bookmarks: &mut Vec<Bookmark>, bookmark: Bookmark) {
    bookmarks.push(bookmark);
    bookmarks.sort_by(|a, b| a.time.total_cmp(&b.time));
}
