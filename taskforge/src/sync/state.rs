//! Persisted sync metadata: current scrap pointer and bounded history.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persist::{self, PersistenceError};

/// Maximum number of records retained in the sync history.
pub const HISTORY_LIMIT: usize = 10;

/// Describes the remote counterpart of the local task set.
///
/// An offline-mode sync leaves `id` and the URLs null while still carrying
/// an owner key, so a later retry can reclaim the scrap name-space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncRecord {
    /// Remote scrap identifier (null after an offline sync).
    pub id: Option<String>,
    /// Owner key authorizing updates.
    pub owner_key: Option<String>,
    /// Access key protecting a private scrap.
    pub access_key: Option<String>,
    /// Human-facing view URL.
    pub url: Option<String>,
    /// Raw-content URL.
    pub raw_url: Option<String>,
    /// When this record was produced.
    pub time: Option<DateTime<Utc>>,
}

impl SyncRecord {
    /// Whether this record points at a reachable remote scrap.
    #[must_use]
    pub const fn is_linked(&self) -> bool {
        self.id.is_some() && self.owner_key.is_some()
    }
}

/// The sync metadata file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncState {
    /// When a sync was last attempted (advanced on every create/update,
    /// including offline ones).
    pub last_sync: Option<DateTime<Utc>>,
    /// The current remote counterpart, empty when never synced.
    pub current_scrap: SyncRecord,
    /// Prior records, most recent first, capped at [`HISTORY_LIMIT`].
    pub history: Vec<SyncRecord>,
}

/// Loads sync state from `path`, falling back to the empty state on a
/// missing, unreadable, or corrupt file.
#[must_use]
pub fn load_state(path: &Path) -> SyncState {
    let contents = match persist::read_file_if_exists(path) {
        Ok(Some(contents)) => contents,
        Ok(None) => return SyncState::default(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read sync state; starting empty");
            return SyncState::default();
        }
    };
    serde_json::from_str(&contents).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "corrupt sync state; starting empty");
        SyncState::default()
    })
}

/// Persists sync state to `path`.
///
/// # Errors
///
/// Returns a [`PersistenceError`] if the file cannot be written.
pub fn save_state(path: &Path, state: &SyncState) -> Result<(), PersistenceError> {
    let contents = serde_json::to_string_pretty(state).map_err(|e| PersistenceError {
        path: path.to_path_buf(),
        source: std::io::Error::other(e),
    })?;
    persist::write_file(path, &contents)
}
