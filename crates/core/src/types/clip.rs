//! Clip domain model

use crate::time::format_time;
use crate::types::{EntryId, Validator};
use serde::{Deserialize, Serialize};

/// A user-marked region of the parent audiobook
///
/// A clip is a view over the book's audio: it stores offsets only. The audio
/// handle is resolved from the loaded audiobook whenever the clip is played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: EntryId,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    /// Description or transcript placeholder
    pub text: String,
    pub title: String,
    /// Chapter index at creation
    pub chapter: usize,
    /// Local calendar date of creation, for display
    pub created_at: String,
    pub original_start_time: f64,
    pub original_end_time: f64,
}

impl Clip {
    /// Creates a clip covering `[start, end)` of the parent audiobook
    pub fn new(
        id: EntryId,
        start: f64,
        end: f64,
        chapter: usize,
        created_at: impl Into<String>,
    ) -> Self {
        let from = format_time(start);
        let to = format_time(end);
        Self {
            id,
            start_time: start,
            end_time: end,
            duration: end - start,
            text: format!(
                "Audio clip from {} to {}. [Transcription would appear here]",
                from, to
            ),
            title: format!("Clip {}-{}", from, to),
            chapter,
            created_at: created_at.into(),
            original_start_time: start,
            original_end_time: end,
        }
    }

    /// Returns true if `time` (absolute, in the parent audiobook) lies inside the clip
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time
    }
}

impl Validator for Clip {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.start_time.is_finite() || !self.end_time.is_finite() {
            errors.push("Clip bounds must be finite".to_string());
        } else {
            if self.start_time < 0.0 {
                errors.push("Clip cannot start before 0".to_string());
            }
            if self.start_time >= self.end_time {
                errors.push("Clip start must be before its end".to_string());
            }
            if (self.duration - (self.end_time - self.start_time)).abs() > 1e-6 {
                errors.push("Clip duration does not match its bounds".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
