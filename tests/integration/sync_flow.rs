//! Integration tests for the sync reconciler driving a scripted client.
//!
//! Covers the create/update/import flows end to end against a store,
//! including the offline downgrades and the merge reconciliation policy.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::cell::RefCell;

use taskforge::remote::{CreateScrap, RemoteError, ScrapClient, ScrapHandle};
use taskforge::store::TaskStore;
use taskforge::sync::{HISTORY_LIMIT, SyncManager};
use taskforge_proto::payload;
use taskforge_proto::task::Task;

// ---------------------------------------------------------------------------
// Scripted client
// ---------------------------------------------------------------------------

/// A paste-service double that either serves a shared in-memory scrap or
/// fails every call, depending on `online`.
struct ScriptedService {
    online: bool,
    stored_content: RefCell<Option<String>>,
    create_requests: RefCell<Vec<CreateScrap>>,
}

impl ScriptedService {
    fn online() -> Self {
        Self {
            online: true,
            stored_content: RefCell::new(None),
            create_requests: RefCell::new(Vec::new()),
        }
    }

    fn offline() -> Self {
        Self {
            online: false,
            stored_content: RefCell::new(None),
            create_requests: RefCell::new(Vec::new()),
        }
    }

    fn handle() -> ScrapHandle {
        ScrapHandle {
            id: Some("AbCdEf123456".to_string()),
            owner_key: Some("owner-key".to_string()),
            view: Some("https://rubis.app/s/AbCdEf123456".to_string()),
            raw: Some("https://api.rubis.app/v2/scrap/AbCdEf123456/raw".to_string()),
            view_with_key: Some("https://rubis.app/s/AbCdEf123456?accessKey=k".to_string()),
            raw_with_key: Some(
                "https://api.rubis.app/v2/scrap/AbCdEf123456/raw?accessKey=k".to_string(),
            ),
        }
    }
}

impl ScrapClient for ScriptedService {
    fn create(&self, request: CreateScrap) -> Result<ScrapHandle, RemoteError> {
        if !self.online {
            return Err(RemoteError::Transport("connection refused".to_string()));
        }
        *self.stored_content.borrow_mut() = Some(request.content.clone());
        self.create_requests.borrow_mut().push(request);
        Ok(Self::handle())
    }

    fn fetch_raw(
        &self,
        _scrap_id: &str,
        _access_key: Option<&str>,
        _owner_key: Option<&str>,
    ) -> Result<String, RemoteError> {
        if !self.online {
            return Err(RemoteError::Transport("connection refused".to_string()));
        }
        self.stored_content
            .borrow()
            .clone()
            .ok_or_else(|| RemoteError::Transport("no such scrap".to_string()))
    }

    fn replace(
        &self,
        _scrap_id: &str,
        _owner_key: &str,
        content: &str,
    ) -> Result<ScrapHandle, RemoteError> {
        if !self.online {
            return Err(RemoteError::Transport("connection refused".to_string()));
        }
        *self.stored_content.borrow_mut() = Some(content.to_string());
        Ok(Self::handle())
    }
}

fn make_sync(service: ScriptedService) -> (SyncManager<ScriptedService>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let manager = SyncManager::open(dir.path().join("rubis_sync.json"), service);
    (manager, dir)
}

// ---------------------------------------------------------------------------
// Create / update flows
// ---------------------------------------------------------------------------

#[test]
fn create_pushes_current_task_list_as_payload() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TaskStore::open(dir.path());
    store.add(Task::new("Pushed task").unwrap());

    let (mut sync, _sync_dir) = make_sync(ScriptedService::online());
    let tasks = store.active_snapshot();
    let outcome = sync.sync_create(&tasks, false);
    assert!(!outcome.offline);

    // The pushed blob is the payload codec's output for the same list.
    let pushed = sync
        .import("AbCdEf123456", None);
    assert_eq!(pushed, tasks);
}

#[test]
fn create_offline_still_records_sync_attempt() {
    let (mut sync, _dir) = make_sync(ScriptedService::offline());
    let outcome = sync.sync_create(&[Task::new("Unsent").unwrap()], false);

    assert!(outcome.offline);
    assert!(outcome.url.is_none());
    assert_eq!(outcome.owner_key.as_ref().map(String::len), Some(32));
    assert_eq!(sync.history().len(), 1);
    assert!(sync.last_sync().is_some());
    assert!(sync.current().id.is_none());
}

#[test]
fn private_create_records_access_key_public_does_not() {
    let (mut sync, _dir) = make_sync(ScriptedService::online());
    let private = sync.sync_create(&[], false);
    let public = sync.sync_create(&[], true);

    assert_eq!(private.access_key.map(|k| k.len()), Some(16));
    assert!(public.access_key.is_none());

    // History holds both records, newest first.
    assert_eq!(sync.history().len(), 2);
    assert!(sync.history()[0].access_key.is_none());
    assert!(sync.history()[1].access_key.is_some());
}

#[test]
fn update_round_trips_new_content_to_same_scrap() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TaskStore::open(dir.path());
    store.add(Task::new("First").unwrap());

    let (mut sync, _sync_dir) = make_sync(ScriptedService::online());
    sync.sync_create(&store.active_snapshot(), false);

    store.add(Task::new("Second").unwrap());
    let outcome = sync.sync_update(&store.active_snapshot());
    assert!(!outcome.offline);
    assert_eq!(outcome.scrap_id.as_deref(), Some("AbCdEf123456"));
    // History did not grow on update.
    assert_eq!(sync.history().len(), 1);

    let imported = sync.import("AbCdEf123456", None);
    assert_eq!(imported.len(), 2);
}

#[test]
fn update_with_no_prior_sync_creates() {
    let (mut sync, _dir) = make_sync(ScriptedService::online());
    let outcome = sync.sync_update(&[Task::new("Fresh").unwrap()]);
    assert!(!outcome.offline);
    assert_eq!(sync.history().len(), 1);
    assert!(sync.current().is_linked());
}

#[test]
fn history_is_capped_and_newest_first() {
    let (mut sync, _dir) = make_sync(ScriptedService::online());
    for _ in 0..(HISTORY_LIMIT + 3) {
        sync.sync_create(&[], true);
    }
    assert_eq!(sync.history().len(), HISTORY_LIMIT);
    let times: Vec<_> = sync.history().iter().map(|r| r.time).collect();
    let mut sorted = times.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(times, sorted);
}

// ---------------------------------------------------------------------------
// Import + merge against a store
// ---------------------------------------------------------------------------

#[test]
fn merge_import_keeps_local_edits_and_gains_new_tasks() {
    // Machine A pushes tasks A and B.
    let remote_a = Task::new("Remote title for A").unwrap();
    let remote_b = Task::new("Task B").unwrap();
    let service = ScriptedService::online();
    *service.stored_content.borrow_mut() =
        Some(payload::encode_tasks(&[remote_a.clone(), remote_b.clone()]).unwrap());

    // Machine B has its own copy of A under the same id, different title.
    let dir = tempfile::tempdir().unwrap();
    let mut store = TaskStore::open(dir.path());
    let mut local_a = remote_a.clone();
    local_a.title = "Local title for A".to_string();
    store.add(local_a);

    let (sync, _sync_dir) = make_sync(service);
    let imported = sync.import("https://rubis.app/s/AbCdEf123456", None);
    assert_eq!(imported.len(), 2);

    let added = store.import_merge(imported);
    assert_eq!(added, 1);
    assert_eq!(store.get(&remote_a.id).unwrap().title, "Local title for A");
    assert_eq!(store.get(&remote_b.id).unwrap().title, "Task B");
}

#[test]
fn import_failure_is_empty_not_destructive() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TaskStore::open(dir.path());
    store.add(Task::new("Precious local state").unwrap());

    let (sync, _sync_dir) = make_sync(ScriptedService::offline());
    let imported = sync.import("AbCdEf123456", None);
    assert!(imported.is_empty());
    // Caller treats empty as unavailable; the local store is untouched.
    assert_eq!(store.list(None).len(), 1);
}

#[test]
fn clear_forgets_remote_pointer_but_not_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TaskStore::open(dir.path());
    store.add(Task::new("Stays put").unwrap());

    let (mut sync, _sync_dir) = make_sync(ScriptedService::online());
    sync.sync_create(&store.active_snapshot(), false);
    assert!(sync.current().is_linked());

    sync.clear();
    assert!(!sync.current().is_linked());
    assert!(sync.history().is_empty());
    assert_eq!(store.list(None).len(), 1);
}
