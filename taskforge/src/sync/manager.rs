//! The sync reconciler: pushes and pulls the task list through the
//! paste-service client and maintains the sync metadata file.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rand::Rng;

use taskforge_proto::payload;
use taskforge_proto::task::Task;

use crate::persist::PersistenceError;
use crate::remote::{CreateScrap, RemoteError, ScrapClient, extract_scrap_id};
use crate::sync::state::{self, HISTORY_LIMIT, SyncRecord, SyncState};

/// Length of generated access keys protecting private scraps.
const ACCESS_KEY_LENGTH: usize = 16;

/// Length of fallback owner keys generated when the service is unreachable.
const OWNER_KEY_LENGTH: usize = 32;

/// Result of a create/update sync, including the offline downgrade.
///
/// `offline` distinguishes "attempted" from "succeeded": an offline sync
/// still advances `last_sync` and (for creates) the stored record, so the
/// flag is the only reliable success signal.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// Remote scrap identifier, when known.
    pub scrap_id: Option<String>,
    /// View URL, when the service returned one.
    pub url: Option<String>,
    /// Raw-content URL, when the service returned one.
    pub raw_url: Option<String>,
    /// Owner key (remote-issued or locally generated fallback).
    pub owner_key: Option<String>,
    /// Access key for a private scrap.
    pub access_key: Option<String>,
    /// Whether the sync completed in offline mode.
    pub offline: bool,
    /// The client failure that caused the offline downgrade.
    pub error: Option<String>,
}

/// Drives create/update/import against the remote client and owns the
/// sync metadata file.
///
/// Construct once at startup and pass by reference; every mutating
/// operation rewrites the metadata file before returning. Client failures
/// never escape this type.
pub struct SyncManager<C> {
    client: C,
    state: SyncState,
    state_path: PathBuf,
    warnings: Vec<PersistenceError>,
}

impl<C: ScrapClient> SyncManager<C> {
    /// Opens the reconciler, loading sync state from `state_path`.
    ///
    /// A missing or corrupt state file yields the empty state.
    #[must_use]
    pub fn open(state_path: PathBuf, client: C) -> Self {
        let state = state::load_state(&state_path);
        Self {
            client,
            state,
            state_path,
            warnings: Vec::new(),
        }
    }

    /// Pushes the task collection as a new remote scrap.
    ///
    /// Private scraps (the default) are protected by a generated access
    /// key. A client failure downgrades to offline mode: the record is
    /// still saved (with a generated fallback owner key and null URLs)
    /// and the failure is carried in the outcome instead of raised.
    pub fn sync_create(&mut self, tasks: &[Task], public: bool) -> SyncOutcome {
        let access_key = if public {
            None
        } else {
            Some(random_key(ACCESS_KEY_LENGTH))
        };
        let now = Utc::now();

        let mut error = None;
        let record = match encode_payload(tasks).and_then(|content| {
            self.client.create(CreateScrap {
                content,
                title: Some(format!(
                    "TaskForge Sync: {}",
                    now.format("%Y-%m-%d %H:%M:%S")
                )),
                public,
                access_key: access_key.clone(),
                owner_key: None,
            })
        }) {
            Ok(handle) => {
                let (url, raw_url) = if public {
                    (handle.view, handle.raw)
                } else {
                    (handle.view_with_key, handle.raw_with_key)
                };
                SyncRecord {
                    id: handle.id,
                    owner_key: handle.owner_key,
                    access_key,
                    url,
                    raw_url,
                    time: Some(now),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "sync create failed; recording offline sync");
                error = Some(e.to_string());
                SyncRecord {
                    id: None,
                    owner_key: Some(random_key(OWNER_KEY_LENGTH)),
                    access_key,
                    url: None,
                    raw_url: None,
                    time: Some(now),
                }
            }
        };

        self.state.last_sync = Some(now);
        self.state.current_scrap = record.clone();
        self.state.history.insert(0, record.clone());
        self.state.history.truncate(HISTORY_LIMIT);
        self.persist();

        SyncOutcome {
            scrap_id: record.id,
            url: record.url,
            raw_url: record.raw_url,
            owner_key: record.owner_key,
            access_key: record.access_key,
            offline: error.is_some(),
            error,
        }
    }

    /// Pushes the task collection to the existing remote scrap.
    ///
    /// Falls back to [`sync_create`](Self::sync_create) when there is no
    /// current record or the update path fails unexpectedly. A transport
    /// failure keeps the stored URLs and still advances `last_sync`; the
    /// outcome's `offline` flag is the only success signal in that case.
    pub fn sync_update(&mut self, tasks: &[Task]) -> SyncOutcome {
        let (Some(id), Some(owner_key)) = (
            self.state.current_scrap.id.clone(),
            self.state.current_scrap.owner_key.clone(),
        ) else {
            return self.sync_create(tasks, false);
        };

        let content = match encode_payload(tasks) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = %e, "sync update failed to encode; creating a new scrap");
                return self.sync_create(tasks, false);
            }
        };

        let now = Utc::now();
        match self.client.replace(&id, &owner_key, &content) {
            Ok(handle) => {
                let (url, raw_url) = if handle.view_with_key.is_some() {
                    (handle.view_with_key, handle.raw_with_key)
                } else {
                    (handle.view, handle.raw)
                };
                self.state.last_sync = Some(now);
                self.persist();
                SyncOutcome {
                    scrap_id: Some(id),
                    url,
                    raw_url,
                    owner_key: Some(owner_key),
                    access_key: self.state.current_scrap.access_key.clone(),
                    offline: false,
                    error: None,
                }
            }
            Err(RemoteError::Transport(e)) => {
                tracing::warn!(error = %e, "sync update failed; keeping previous record");
                self.state.last_sync = Some(now);
                self.persist();
                SyncOutcome {
                    scrap_id: Some(id),
                    url: self.state.current_scrap.url.clone(),
                    raw_url: self.state.current_scrap.raw_url.clone(),
                    owner_key: Some(owner_key),
                    access_key: self.state.current_scrap.access_key.clone(),
                    offline: true,
                    error: Some(e),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "unexpected sync update failure; creating a new scrap");
                self.sync_create(tasks, false)
            }
        }
    }

    /// Fetches and decodes a remote task set.
    ///
    /// `source` may be a view link, an API link, or a bare scrap id. When
    /// no access key is supplied and the resolved id matches the current
    /// record, the stored access key is reused. Any fetch or parse failure
    /// yields an empty vec — callers must treat that as "import
    /// unavailable", not as zero tasks.
    #[must_use]
    pub fn import(&self, source: &str, access_key: Option<&str>) -> Vec<Task> {
        let scrap_id = extract_scrap_id(source).unwrap_or_else(|| source.trim().to_string());
        let stored_key = if access_key.is_none()
            && self.state.current_scrap.id.as_deref() == Some(scrap_id.as_str())
        {
            self.state.current_scrap.access_key.clone()
        } else {
            None
        };
        let key = access_key.map(str::to_string).or(stored_key);

        let content = match self.client.fetch_raw(&scrap_id, key.as_deref(), None) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(scrap_id = %scrap_id, error = %e, "failed to fetch remote tasks");
                return Vec::new();
            }
        };
        match payload::decode_tasks(&content) {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(scrap_id = %scrap_id, error = %e, "failed to parse remote task payload");
                Vec::new()
            }
        }
    }

    /// The current sync record (empty when never synced).
    #[must_use]
    pub const fn current(&self) -> &SyncRecord {
        &self.state.current_scrap
    }

    /// Prior sync records, most recent first.
    #[must_use]
    pub fn history(&self) -> &[SyncRecord] {
        &self.state.history
    }

    /// When a sync was last attempted.
    #[must_use]
    pub const fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.state.last_sync
    }

    /// Resets the current record and history to empty and persists that
    /// empty state. The task files are untouched.
    pub fn clear(&mut self) {
        self.state = SyncState::default();
        self.persist();
    }

    /// Drains any persistence warnings accumulated since the last call.
    pub fn take_warnings(&mut self) -> Vec<PersistenceError> {
        std::mem::take(&mut self.warnings)
    }

    fn persist(&mut self) {
        if let Err(e) = state::save_state(&self.state_path, &self.state) {
            tracing::warn!(error = %e, "failed to persist sync state; in-memory state kept");
            self.warnings.push(e);
        }
    }
}

fn encode_payload(tasks: &[Task]) -> Result<String, RemoteError> {
    payload::encode_tasks(tasks).map_err(|e| RemoteError::InvalidResponse(e.to_string()))
}

/// Generates a random alphanumeric key of the given length.
fn random_key(length: usize) -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
