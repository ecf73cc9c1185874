//! SmartBook core domain types
//!
//! Plain data shared by the session engine, the stores and the hosts:
//! audiobooks and their chapters, bookmarks, clips, remote-control
//! bindings, listening statistics and the persisted session snapshot.

pub mod chapters;
pub mod error;
pub mod store;
pub mod time;
pub mod types;

pub use chapters::{
    fallback_chapters, locate, normalize_chapters, ParsedChapter, INTRODUCTION_TITLE,
};
pub use error::{AppError, ErrorCategory, RecoveryAction, Result};
pub use store::{MemorySessionStore, SessionStore};
pub use time::format_time;
pub use types::{
    insert_sorted, AudioHandle, Audiobook, BookKey, BookSession, BookStats, Bookmark, Chapter,
    Clip, EntryId, IdGenerator, ListeningStats, PressKind, RemoteAction, RemoteButton,
    RemoteControlMapping, SessionSnapshot, Timestamp, Validator, SNAPSHOT_VERSION,
};
