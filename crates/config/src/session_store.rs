//! JSON file backend for the session snapshot
//!
//! The whole snapshot is rewritten on every save through the same atomic
//! write path as the config file, so a crash leaves either the old or the
//! new snapshot on disk.

use crate::persistence::{backup_path, write_atomic};
use smartbook_core::{AppError, Result, SessionSnapshot, SessionStore, SNAPSHOT_VERSION};
use std::fs;
use std::path::{Path, PathBuf};

/// Session store backed by a single JSON file
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_snapshot(path: &Path) -> Result<SessionSnapshot> {
        let bytes = fs::read(path)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::StoreCorrupted {
                path: path.to_path_buf(),
                reason: "file is empty".to_string(),
            });
        }

        let snapshot: SessionSnapshot =
            serde_json::from_slice(&bytes).map_err(|e| AppError::StoreCorrupted {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if snapshot.version > SNAPSHOT_VERSION {
            log::warn!(
                "Session file version {} is newer than supported version {}",
                snapshot.version,
                SNAPSHOT_VERSION
            );
        }

        Ok(snapshot)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<SessionSnapshot> {
        if !self.path.exists() {
            log::debug!(
                "No session file at {}, starting fresh",
                self.path.display()
            );
            return Ok(SessionSnapshot::default());
        }

        match Self::read_snapshot(&self.path) {
            Ok(snapshot) => Ok(snapshot),
            Err(err @ AppError::StoreCorrupted { .. }) => {
                let backup = backup_path(&self.path);
                if !backup.exists() {
                    return Err(err);
                }
                log::warn!("{}; trying backup {}", err, backup.display());
                Self::read_snapshot(&backup).map_err(|_| err)
            }
            Err(err) => Err(err),
        }
    }

    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        let json = serde_json::to_vec_pretty(snapshot).map_err(|e| AppError::Serialization {
            message: e.to_string(),
        })?;

        write_atomic(&self.path, &json)
            .map_err(|e| AppError::store_unavailable("session file", e))?;

        log::debug!("Session saved to {}", self.path.display());
        Ok(())
    }
}
