//! Session store seam
//!
//! The engine is the only writer of session data. A store is a dumb sink
//! that reads and replaces the whole snapshot at once.

use crate::error::{AppError, Result};
use crate::types::SessionSnapshot;
use std::sync::{Arc, Mutex, MutexGuard};

/// Whole-snapshot persistence
pub trait SessionStore: Send {
    /// Reads the stored snapshot, or the default one if nothing was saved yet
    fn load(&self) -> Result<SessionSnapshot>;

    /// Replaces the stored snapshot
    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<()>;
}

#[derive(Debug, Default)]
struct MemoryState {
    snapshot: Option<SessionSnapshot>,
    writes: usize,
    unavailable: bool,
}

/// In-memory store, shared between clones
///
/// Counts writes and can be switched into a failing mode, which makes it
/// useful for hosts without storage as well as for tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with a snapshot
    pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        let store = Self::new();
        store.lock().snapshot = Some(snapshot);
        store
    }

    /// Number of successful saves so far
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    /// The most recently saved snapshot
    pub fn last_saved(&self) -> Option<SessionSnapshot> {
        self.lock().snapshot.clone()
    }

    /// Makes every subsequent load and save fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A poisoned lock still holds a consistent snapshot: saves replace it whole.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<SessionSnapshot> {
        let state = self.lock();
        if state.unavailable {
            return Err(AppError::store_unavailable("memory", "store disabled"));
        }
        Ok(state.snapshot.clone().unwrap_or_default())
    }

    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(AppError::store_unavailable("memory", "store disabled"));
        }
        state.snapshot = Some(snapshot.clone());
        state.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BookKey;

    #[test]
    fn test_empty_store_loads_default() {
        let store = MemorySessionStore::new();
        assert_eq!(store.load().unwrap(), SessionSnapshot::default());
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_save_is_visible_through_clones() {
        let store = MemorySessionStore::new();
        let mut writer = store.clone();
        let mut snapshot = SessionSnapshot::default();
        snapshot.last_opened = Some(BookKey::new("a.mp3"));

        writer.save(&snapshot).unwrap();
        assert_eq!(store.writes(), 1);
        assert_eq!(store.load().unwrap(), snapshot);
        assert_eq!(store.last_saved(), Some(snapshot));
    }

    #[test]
    fn test_unavailable_store_fails() {
        let mut store = MemorySessionStore::new();
        store.set_unavailable(true);
        assert!(store.load().is_err());
        assert!(store.save(&SessionSnapshot::default()).is_err());
        assert_eq!(store.writes(), 0);
    }
}
