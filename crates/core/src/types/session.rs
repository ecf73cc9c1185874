//! Persisted session snapshot

use crate::types::{BookKey, Bookmark, Clip, ListeningStats, RemoteControlMapping};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Per-audiobook session state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookSession {
    /// Last known position in seconds
    pub current_time: f64,
    /// Ordered by time ascending
    pub bookmarks: Vec<Bookmark>,
    /// Most recently created first
    pub clips: Vec<Clip>,
}

/// Everything the engine persists, written as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSnapshot {
    pub version: u32,
    pub remote_controls: RemoteControlMapping,
    pub stats: ListeningStats,
    pub books: BTreeMap<BookKey, BookSession>,
    pub last_opened: Option<BookKey>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            remote_controls: RemoteControlMapping::default(),
            stats: ListeningStats::default(),
            books: BTreeMap::new(),
            last_opened: None,
        }
    }
}

impl SessionSnapshot {
    /// Returns the stored session for a book
    pub fn book(&self, key: &BookKey) -> Option<&BookSession> {
        self.books.get(key)
    }

    /// Replaces the stored session for a book
    pub fn set_book(&mut self, key: BookKey, session: BookSession) {
        self.books.insert(key, session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryId;

    #[test]
    fn test_snapshot_json_round_trip() {
        let mut snapshot = SessionSnapshot::default();
        let key = BookKey::new("book.mp3");
        snapshot.set_book(
            key.clone(),
            BookSession {
                current_time: 123.25,
                bookmarks: vec![Bookmark::new(EntryId::from_raw(1), 100.0, 0)],
                clips: vec![Clip::new(EntryId::from_raw(2), 63.25, 123.25, 0, "1/2/2024")],
            },
        );
        snapshot.last_opened = Some(key.clone());

        let json = serde_json::to_string_pretty(&snapshot).unwrap();
        let back: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(back.book(&key).map(|s| s.current_time), Some(123.25));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let snapshot: SessionSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert!(snapshot.books.is_empty());
    }
}
