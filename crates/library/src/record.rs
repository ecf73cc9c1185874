//! Library records

use serde::{Deserialize, Serialize};
use smartbook_core::{AudioHandle, Audiobook, BookKey, Chapter, Timestamp};

/// Metadata kept for an imported audiobook
///
/// This is what listing the library returns; the raw audio bytes are stored
/// next to it and only read on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub key: BookKey,
    pub title: String,
    pub author: String,
    pub narrator: String,
    /// Image URL or inline `data:` URI
    pub cover: String,
    #[serde(default)]
    pub genre: Option<String>,
    pub chapters: Vec<Chapter>,
    /// Size of the stored audio in bytes
    pub size_bytes: u64,
    pub added_at: Timestamp,
}

impl BookRecord {
    /// Builds the audiobook the session engine loads
    pub fn to_audiobook(&self, audio: AudioHandle) -> Audiobook {
        let mut audiobook = Audiobook::new(
            self.key.clone(),
            self.title.clone(),
            self.chapters.clone(),
            audio,
        )
        .with_author(self.author.clone())
        .with_narrator(self.narrator.clone())
        .with_cover(self.cover.clone());
        audiobook.genre = self.genre.clone();
        audiobook
    }
}

/// A record together with its audio bytes
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBook {
    pub record: BookRecord,
    pub audio: Vec<u8>,
}
