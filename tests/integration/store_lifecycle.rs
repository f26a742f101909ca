//! Integration tests for the local task store lifecycle.
//!
//! Exercises the archive/restore partition invariant, list ordering,
//! copy/snooze transitions, import reconciliation policies, and the
//! persistence round trip across store reopens.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{TimeZone, Utc};

use taskforge::store::{StoreError, TaskStore};
use taskforge_proto::task::{Priority, Task};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn make_task(title: &str, priority: Priority) -> Task {
    Task::new(title).unwrap().with_priority(priority)
}

fn titles(tasks: &[&Task]) -> Vec<String> {
    tasks.iter().map(|t| t.title.clone()).collect()
}

// ---------------------------------------------------------------------------
// Partition invariant
// ---------------------------------------------------------------------------

#[test]
fn task_is_never_in_both_partitions() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TaskStore::open(dir.path());
    let task = store.add(make_task("Flip-flop", Priority::Medium));

    // Active: present in active, absent from archive, flag false.
    assert!(!store.get(&task.id).unwrap().archived);
    assert!(store.get_archived(&task.id).is_none());

    // Archived: moved, flag true.
    store.archive(&task.id).unwrap();
    assert!(store.get(&task.id).is_none());
    assert!(store.get_archived(&task.id).unwrap().archived);

    // Restored: moved back, flag false again.
    store.restore(&task.id).unwrap();
    assert!(!store.get(&task.id).unwrap().archived);
    assert!(store.get_archived(&task.id).is_none());
}

#[test]
fn archive_then_restore_is_identity_on_field_set() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TaskStore::open(dir.path());
    let mut task = make_task("Unchanged", Priority::Urgent)
        .with_description(Some("important details".to_string()))
        .with_tags(vec!["keep".to_string()]);
    task.complete();
    let task = store.add(task);

    store.archive(&task.id).unwrap();
    let restored = store.restore(&task.id).unwrap();
    assert_eq!(restored, task);
}

// ---------------------------------------------------------------------------
// List ordering
// ---------------------------------------------------------------------------

#[test]
fn list_orders_by_priority_rank_then_due_date() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TaskStore::open(dir.path());
    let due = |day| Utc.with_ymd_and_hms(2025, 7, day, 12, 0, 0).unwrap();

    store.add(make_task("medium-early", Priority::Medium).with_due_date(Some(due(1))));
    store.add(make_task("urgent-late", Priority::Urgent).with_due_date(Some(due(20))));
    store.add(make_task("high-no-due", Priority::High));
    store.add(make_task("high-due", Priority::High).with_due_date(Some(due(5))));
    store.add(make_task("low-any", Priority::Low));

    let listed = store.list(None);
    assert_eq!(
        titles(&listed),
        vec![
            "urgent-late",
            "high-due",
            "high-no-due",
            "medium-early",
            "low-any"
        ]
    );
    // The ordering contract: rank never decreases, and within a rank the
    // effective due date never decreases.
    for pair in listed.windows(2) {
        assert!(pair[0].priority.rank() <= pair[1].priority.rank());
        if pair[0].priority.rank() == pair[1].priority.rank() {
            let a = pair[0].due_date.unwrap_or(chrono::DateTime::<Utc>::MAX_UTC);
            let b = pair[1].due_date.unwrap_or(chrono::DateTime::<Utc>::MAX_UTC);
            assert!(a <= b);
        }
    }
}

#[test]
fn lone_low_task_without_due_date_sorts_after_everything() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TaskStore::open(dir.path());
    store.add(make_task("Pay rent", Priority::Urgent));
    store.add(make_task("Review PR", Priority::High));
    store.add(make_task("Tidy desk", Priority::Medium));
    store.add(make_task("Buy milk", Priority::Low));

    let listed = store.list(None);
    assert_eq!(listed.last().unwrap().title, "Buy milk");
}

// ---------------------------------------------------------------------------
// Copy and snooze
// ---------------------------------------------------------------------------

#[test]
fn copy_produces_reset_twin_under_fresh_id() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TaskStore::open(dir.path());
    let mut source = make_task("Template", Priority::High)
        .with_tags(vec!["recurring".to_string()])
        .with_description(Some("weekly".to_string()));
    source.complete();
    let source = store.add(source);

    let copy = store.copy(&source.id, None, None).unwrap();
    assert_ne!(copy.id, source.id);
    assert!(!copy.completed);
    assert!(!copy.archived);
    assert_eq!(copy.title, source.title);
    assert_eq!(copy.description, source.description);
    assert_eq!(copy.priority, source.priority);
    assert_eq!(copy.tags, source.tags);
    assert_eq!(store.list(None).len(), 2);
}

#[test]
fn snooze_adds_a_day_to_existing_due_date() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TaskStore::open(dir.path());
    let due = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
    let task = store.add(make_task("Sleepy", Priority::Medium).with_due_date(Some(due)));

    let updated = store.snooze(&task.id, 1, 0, 0).unwrap();
    assert_eq!(
        updated.due_date,
        Some(Utc.with_ymd_and_hms(2025, 1, 2, 10, 0, 0).unwrap())
    );
}

#[test]
fn snooze_without_due_date_lands_near_now_plus_duration() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TaskStore::open(dir.path());
    let task = store.add(make_task("Dateless", Priority::Medium));

    let updated = store.snooze(&task.id, 1, 0, 0).unwrap();
    let due = updated.due_date.unwrap();
    let expected = Utc::now() + chrono::Duration::days(1);
    let drift = (due - expected).num_seconds().abs();
    assert!(drift < 5, "due date drifted {drift}s from now + 1 day");
}

#[test]
fn operations_on_missing_ids_report_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TaskStore::open(dir.path());
    let ghost = Task::new("Ghost").unwrap();

    assert_eq!(
        store.archive(&ghost.id),
        Err(StoreError::NotFound(ghost.id.clone()))
    );
    assert_eq!(
        store.copy(&ghost.id, None, None),
        Err(StoreError::NotFound(ghost.id.clone()))
    );
    assert_eq!(
        store.snooze(&ghost.id, 1, 0, 0),
        Err(StoreError::NotFound(ghost.id.clone()))
    );
    assert!(!store.delete(&ghost.id));
}

// ---------------------------------------------------------------------------
// Import reconciliation policies
// ---------------------------------------------------------------------------

#[test]
fn merge_import_is_union_by_id_identity_wins() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TaskStore::open(dir.path());
    let local = store.add(make_task("Local title", Priority::Medium));

    let mut remote_edit = local.clone();
    remote_edit.title = "Remote edit".to_string();
    let remote_new = make_task("Remote only", Priority::Low);

    let added = store.import_merge(vec![remote_edit, remote_new.clone()]);
    assert_eq!(added, 1);
    // Pre-existing id keeps its local content.
    assert_eq!(store.get(&local.id).unwrap().title, "Local title");
    // New id arrives unchanged.
    assert_eq!(store.get(&remote_new.id).unwrap().title, "Remote only");
}

#[test]
fn replace_import_substitutes_wholesale_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TaskStore::open(dir.path());
    store.add(make_task("Will vanish", Priority::Medium));

    let incoming = vec![
        make_task("Imported A", Priority::High),
        make_task("Imported B", Priority::Low),
    ];
    assert_eq!(store.import_replace(incoming.clone()), 2);
    assert_eq!(store.import_replace(incoming), 2);
    let listed = store.list(None);
    assert_eq!(titles(&listed), vec!["Imported A", "Imported B"]);
}

// ---------------------------------------------------------------------------
// Persistence round trip
// ---------------------------------------------------------------------------

#[test]
fn full_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let (active_task, archived_task) = {
        let mut store = TaskStore::open(dir.path());
        let mut active_task = make_task("Survivor", Priority::Urgent)
            .with_due_date(Some(Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap()))
            .with_tags(vec!["persist".to_string()]);
        active_task.complete();
        let active_task = store.add(active_task);
        let archived_task = store.add(make_task("Old news", Priority::Low));
        store.archive(&archived_task.id).unwrap();
        (
            active_task,
            store.get_archived(&archived_task.id).unwrap().clone(),
        )
    };

    let reopened = TaskStore::open(dir.path());
    assert_eq!(reopened.get(&active_task.id), Some(&active_task));
    assert_eq!(reopened.get_archived(&archived_task.id), Some(&archived_task));
    assert_eq!(reopened.list(None).len(), 1);
    assert_eq!(reopened.list_archived(None).len(), 1);
}

#[test]
fn corrupt_files_fall_back_to_empty_partitions() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tasks.json"), "[{\"broken\": ").unwrap();
    std::fs::write(dir.path().join("archived_tasks.json"), "also broken").unwrap();
    let store = TaskStore::open(dir.path());
    assert!(store.list(None).is_empty());
    assert!(store.list_archived(None).is_empty());
}
