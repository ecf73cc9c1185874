//! Domain types for SmartBook
//!
//! This module contains all domain models organized by responsibility:
//! - `audiobook`: Audiobook and Chapter types
//! - `bookmark`: User bookmarks
//! - `clip`: Clips extracted from the playback position
//! - `remote`: Headset button bindings and the action table
//! - `stats`: Per-day listening totals
//! - `session`: The persisted session snapshot
//! - `common`: Identifiers, timestamps and shared traits

mod audiobook;
mod bookmark;
mod clip;
mod common;
mod remote;
mod session;
mod stats;

pub use audiobook::{Audiobook, Chapter};
pub use bookmark::{insert_sorted, Bookmark};
pub use clip::Clip;
pub use common::{AudioHandle, BookKey, EntryId, IdGenerator, Timestamp, Validator};
pub use remote::{PressKind, RemoteAction, RemoteButton, RemoteControlMapping};
pub use session::{BookSession, SessionSnapshot, SNAPSHOT_VERSION};
pub use stats::{BookStats, ListeningStats};
