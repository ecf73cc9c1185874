// crates/library/src/scanner.rs

use smartbook_config::LibraryConfig;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Finds importable audio files under a directory
#[derive(Debug, Clone)]
pub struct LibraryScanner {
    extensions: Vec<String>,
    recursive: bool,
}

impl LibraryScanner {
    pub fn new(config: &LibraryConfig) -> Self {
        Self {
            extensions: config.supported_extensions.clone(),
            recursive: config.recursive_scan,
        }
    }

    /// Returns matching files sorted by path
    ///
    /// Unreadable entries are logged and skipped.
    pub fn scan(&self, root: &Path) -> Vec<PathBuf> {
        let walker = WalkDir::new(root)
            .follow_links(false)
            .max_depth(if self.recursive { usize::MAX } else { 1 });

        let mut files: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Error walking directory: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.is_supported(path))
            .collect();

        files.sort();
        log::info!("Found {} audio files under {}", files.len(), root.display());
        files
    }

    /// Checks the extension, ignoring case
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}
