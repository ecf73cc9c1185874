// crates/library/src/import.rs

use crate::chapters::{ChapterParser, Mp4ChapterParser};
use crate::error::{LibraryError, LibraryResult};
use crate::lookup::{resolve_cover, resolve_genre, CoverLookup, GenreClassifier};
use crate::metadata::MetadataExtractor;
use crate::record::{BookRecord, StoredBook};
use crate::scanner::LibraryScanner;
use crate::store::LibraryStore;
use smartbook_config::LibraryConfig;
use smartbook_core::{fallback_chapters, BookKey, Timestamp};
use std::path::{Path, PathBuf};

const UNKNOWN_AUTHOR: &str = "Unknown Author";
const UNKNOWN_NARRATOR: &str = "Unknown Narrator";

/// Which optional import steps run
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    pub extract_tags: bool,
    pub fetch_cover_art: bool,
    pub classify_genre: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::from(&LibraryConfig::default())
    }
}

impl From<&LibraryConfig> for ImportOptions {
    fn from(config: &LibraryConfig) -> Self {
        Self {
            extract_tags: config.extract_tags,
            fetch_cover_art: config.fetch_cover_art,
            classify_genre: config.classify_genre,
        }
    }
}

/// Outcome of importing a file or a directory
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<BookRecord>,
    pub failed: Vec<(PathBuf, LibraryError)>,
}

/// Turns audio files into library records
pub struct BookImporter {
    options: ImportOptions,
    scanner: LibraryScanner,
    tags: MetadataExtractor,
    chapters: Box<dyn ChapterParser>,
    covers: Option<Box<dyn CoverLookup>>,
    genres: Option<Box<dyn GenreClassifier>>,
}

impl BookImporter {
    pub fn new(config: &LibraryConfig) -> Self {
        Self {
            options: ImportOptions::from(config),
            scanner: LibraryScanner::new(config),
            tags: MetadataExtractor::new(),
            chapters: Box::new(Mp4ChapterParser::new()),
            covers: None,
            genres: None,
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the parser used for chaptered containers (M4B/M4A/MP4)
    pub fn with_chapter_parser(mut self, parser: Box<dyn ChapterParser>) -> Self {
        self.chapters = parser;
        self
    }

    pub fn with_cover_lookup(mut self, lookup: Box<dyn CoverLookup>) -> Self {
        self.covers = Some(lookup);
        self
    }

    pub fn with_genre_classifier(mut self, classifier: Box<dyn GenreClassifier>) -> Self {
        self.genres = Some(classifier);
        self
    }

    /// Reads a file and builds its record without storing it
    pub fn prepare(&self, path: &Path) -> LibraryResult<StoredBook> {
        if !path.is_file() {
            return Err(LibraryError::FileNotFound(path.to_path_buf()));
        }
        if !self.scanner.is_supported(path) {
            return Err(LibraryError::UnsupportedFormat(path.display().to_string()));
        }
        let key = BookKey::from_path(path).ok_or_else(|| {
            LibraryError::InvalidFile(format!("{} has no usable file name", path.display()))
        })?;

        let audio = std::fs::read(path)?;
        if audio.is_empty() {
            return Err(LibraryError::InvalidFile(format!(
                "{} is empty",
                path.display()
            )));
        }

        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(key.as_str())
            .to_string();

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let chapters = if Mp4ChapterParser::handles_extension(extension) {
            self.chapters.chapters_or_fallback(&audio)
        } else {
            fallback_chapters()
        };

        let tags = if self.options.extract_tags {
            self.tags.extract(&audio)
        } else {
            Default::default()
        };
        let author = tags.author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        let narrator = tags.narrator.unwrap_or_else(|| UNKNOWN_NARRATOR.to_string());

        let covers = self.covers.as_deref().filter(|_| self.options.fetch_cover_art);
        let cover = resolve_cover(covers, &title, &author);

        let genre = self
            .genres
            .as_deref()
            .filter(|_| self.options.classify_genre)
            .map(|classifier| resolve_genre(Some(classifier), &title));

        log::debug!(
            "Prepared '{}' with {} chapters ({} bytes)",
            title,
            chapters.len(),
            audio.len()
        );

        Ok(StoredBook {
            record: BookRecord {
                key,
                title,
                author,
                narrator,
                cover,
                genre,
                chapters,
                size_bytes: audio.len() as u64,
                added_at: Timestamp::now(),
            },
            audio,
        })
    }

    /// Imports one file, replacing any book stored under the same key
    pub fn import_file(
        &self,
        store: &mut dyn LibraryStore,
        path: &Path,
    ) -> LibraryResult<BookRecord> {
        let book = self.prepare(path)?;
        store.put(&book)?;
        log::info!("Imported '{}' as {}", book.record.title, book.record.key);
        Ok(book.record)
    }

    /// Imports a file, or every supported file under a directory
    ///
    /// Failures of individual files are collected rather than aborting
    /// the import.
    pub fn import_path(&self, store: &mut dyn LibraryStore, path: &Path) -> ImportReport {
        let files = if path.is_dir() {
            self.scanner.scan(path)
        } else {
            vec![path.to_path_buf()]
        };

        let mut report = ImportReport::default();
        for file in files {
            match self.import_file(store, &file) {
                Ok(record) => report.imported.push(record),
                Err(e) => {
                    log::warn!("Failed to import {}: {}", file.display(), e);
                    report.failed.push((file, e));
                }
            }
        }
        report
    }
}
