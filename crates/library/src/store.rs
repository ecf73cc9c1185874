//! Library storage
//!
//! [`FsLibrary`] keeps one JSON file per book under `books/` and the raw
//! audio under `audio/`, both named after the book key. Files are replaced
//! through a temporary file and a rename, so a crash never leaves a half
//! written record.

use crate::error::{LibraryError, LibraryResult};
use crate::record::{BookRecord, StoredBook};
use smartbook_core::BookKey;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const BOOKS_DIR: &str = "books";
const AUDIO_DIR: &str = "audio";

/// Keyed storage for imported audiobooks
pub trait LibraryStore: Send {
    /// Inserts or replaces the book stored under its record's key
    fn put(&mut self, book: &StoredBook) -> LibraryResult<()>;

    fn get(&self, key: &BookKey) -> LibraryResult<Option<StoredBook>>;

    /// All records, without audio, ordered by key
    fn list(&self) -> LibraryResult<Vec<BookRecord>>;

    /// Deletes a book; returns false if it was not stored
    fn remove(&mut self, key: &BookKey) -> LibraryResult<bool>;
}

/// Library kept in a directory on disk
#[derive(Debug, Clone)]
pub struct FsLibrary {
    root: PathBuf,
}

impl FsLibrary {
    /// Opens (and creates if needed) a library rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> LibraryResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(BOOKS_DIR))?;
        fs::create_dir_all(root.join(AUDIO_DIR))?;
        log::debug!("Opened library at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a book's audio file; it keeps the source extension
    pub fn audio_path(&self, key: &BookKey) -> LibraryResult<PathBuf> {
        let name = file_name(key)?;
        Ok(self.root.join(AUDIO_DIR).join(name))
    }

    /// Reads only the metadata of one book
    pub fn record(&self, key: &BookKey) -> LibraryResult<Option<BookRecord>> {
        let path = self.record_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        read_record(&path).map(Some)
    }

    fn record_path(&self, key: &BookKey) -> LibraryResult<PathBuf> {
        let name = file_name(key)?;
        Ok(self.root.join(BOOKS_DIR).join(format!("{}.json", name)))
    }
}

impl LibraryStore for FsLibrary {
    fn put(&mut self, book: &StoredBook) -> LibraryResult<()> {
        let key = &book.record.key;
        let json = serde_json::to_vec_pretty(&book.record)?;

        // Audio first: a record must never point at missing audio
        write_atomic(&self.audio_path(key)?, &book.audio)?;
        write_atomic(&self.record_path(key)?, &json)?;

        log::info!("Stored '{}' ({} bytes)", book.record.title, book.audio.len());
        Ok(())
    }

    fn get(&self, key: &BookKey) -> LibraryResult<Option<StoredBook>> {
        let Some(record) = self.record(key)? else {
            return Ok(None);
        };

        let audio_path = self.audio_path(key)?;
        let audio = fs::read(&audio_path).map_err(|e| {
            LibraryError::Corrupted(format!("audio for {} unreadable: {}", key, e))
        })?;
        Ok(Some(StoredBook { record, audio }))
    }

    fn list(&self) -> LibraryResult<Vec<BookRecord>> {
        let mut records = Vec::new();

        for entry in fs::read_dir(self.root.join(BOOKS_DIR))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_record(&path) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping library entry {}: {}", path.display(), e),
            }
        }

        records.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(records)
    }

    fn remove(&mut self, key: &BookKey) -> LibraryResult<bool> {
        let record_path = self.record_path(key)?;
        let audio_path = self.audio_path(key)?;
        let existed = record_path.exists();

        if existed {
            fs::remove_file(&record_path)?;
        }
        if audio_path.exists() {
            fs::remove_file(&audio_path)?;
        }
        if existed {
            log::info!("Removed {} from the library", key);
        }
        Ok(existed)
    }
}

/// Checks that a key can be used as a file name
fn file_name(key: &BookKey) -> LibraryResult<&str> {
    let name = key.as_str();
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(LibraryError::InvalidFile(format!(
            "'{}' cannot be used as a library key",
            name
        )));
    }
    Ok(name)
}

fn read_record(path: &Path) -> LibraryResult<BookRecord> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| LibraryError::Corrupted(format!("{}: {}", path.display(), e)))
}

fn write_atomic(path: &Path, content: &[u8]) -> LibraryResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| LibraryError::InvalidFile(format!("{} has no parent", path.display())))?;

    let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
    temp_file.write_all(content)?;
    temp_file.flush()?;
    temp_file.persist(path).map_err(|e| LibraryError::Io(e.error))?;
    Ok(())
}
