//! SmartBook audiobook library
//!
//! Imports audio files into a keyed on-disk library: chapter extraction with
//! a single-chapter fallback, tag reading, and optional cover and genre
//! lookups that never block an import.

pub mod chapters;
pub mod error;
pub mod import;
pub mod lookup;
pub mod metadata;
pub mod record;
pub mod scanner;
pub mod store;

pub use chapters::{ChapterParser, Mp4ChapterParser, NoChapters};
pub use error::{LibraryError, LibraryResult};
pub use import::{BookImporter, ImportOptions, ImportReport};
pub use lookup::{
    clean_title, placeholder_cover, resolve_cover, resolve_genre, CoverLookup, GenreClassifier,
    DEFAULT_GENRE, GENRES,
};
pub use metadata::{ExtractedTags, MetadataExtractor};
pub use record::{BookRecord, StoredBook};
pub use scanner::LibraryScanner;
pub use store::{FsLibrary, LibraryStore};
