//! Local task store: active and archived partitions with file persistence.
//!
//! `TaskStore` owns two disjoint id-keyed maps (active and archived) backed
//! by `tasks.json` and `archived_tasks.json` in the data directory. Every
//! mutation flushes the affected file(s) before returning; flush failures
//! are recorded as warnings while the in-memory state stays authoritative.
//! A corrupt file at startup falls back to an empty partition.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use taskforge_proto::payload;
use taskforge_proto::task::{Task, TaskId};

use crate::persist::{self, PersistenceError};

/// File name of the active task list inside the data directory.
const TASKS_FILE: &str = "tasks.json";

/// File name of the archived task list inside the data directory.
const ARCHIVE_FILE: &str = "archived_tasks.json";

/// Errors that can occur during store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Task with the given id was not found in the expected partition.
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

/// In-memory task collections with synchronous file persistence.
///
/// A task is never present in both partitions at once: `archive` and
/// `restore` move it between them, flushing the destination file before
/// the source file so a crash between the two flushes can duplicate a
/// task but never lose it.
pub struct TaskStore {
    active: HashMap<TaskId, Task>,
    archived: HashMap<TaskId, Task>,
    tasks_file: PathBuf,
    archive_file: PathBuf,
    warnings: Vec<PersistenceError>,
}

impl TaskStore {
    /// Opens the store rooted at `data_dir`, loading both task files.
    ///
    /// Missing files yield empty partitions. A corrupt file is logged and
    /// also yields an empty partition rather than aborting.
    #[must_use]
    pub fn open(data_dir: &Path) -> Self {
        let tasks_file = data_dir.join(TASKS_FILE);
        let archive_file = data_dir.join(ARCHIVE_FILE);
        let mut warnings = Vec::new();
        let active = load_partition(&tasks_file, &mut warnings);
        let archived = load_partition(&archive_file, &mut warnings);
        Self {
            active,
            archived,
            tasks_file,
            archive_file,
            warnings,
        }
    }

    /// Inserts a task into the active partition and flushes.
    ///
    /// An existing task with the same id is silently overwritten; callers
    /// are expected to pass fresh ids.
    pub fn add(&mut self, task: Task) -> Task {
        self.active.insert(task.id.clone(), task.clone());
        self.flush_active();
        task
    }

    /// Looks up an active task by id.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.active.get(id)
    }

    /// Looks up an archived task by id.
    #[must_use]
    pub fn get_archived(&self, id: &TaskId) -> Option<&Task> {
        self.archived.get(id)
    }

    /// Replaces an active task and flushes.
    ///
    /// The replacement must carry the same id as the task it replaces.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `id` is not in the active
    /// partition.
    pub fn update(&mut self, id: &TaskId, task: Task) -> Result<Task, StoreError> {
        if !self.active.contains_key(id) {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.active.insert(id.clone(), task.clone());
        self.flush_active();
        Ok(task)
    }

    /// Removes an active task, returning whether a removal occurred.
    pub fn delete(&mut self, id: &TaskId) -> bool {
        if self.active.remove(id).is_none() {
            return false;
        }
        self.flush_active();
        true
    }

    /// Archives an active task, moving it to the archived partition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `id` is not in the active
    /// partition.
    pub fn archive(&mut self, id: &TaskId) -> Result<Task, StoreError> {
        let mut task = self
            .active
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        task.archive();
        self.archived.insert(id.clone(), task.clone());
        // Destination file first: a crash between flushes must not leave
        // the task absent from both.
        self.flush_archived();
        self.flush_active();
        Ok(task)
    }

    /// Restores an archived task back to the active partition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `id` is not in the archived
    /// partition.
    pub fn restore(&mut self, id: &TaskId) -> Result<Task, StoreError> {
        let mut task = self
            .archived
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        task.restore();
        self.active.insert(id.clone(), task.clone());
        self.flush_active();
        self.flush_archived();
        Ok(task)
    }

    /// Duplicates an active task under a fresh id with reset lifecycle
    /// state, optionally overriding the due date and/or tag set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the source id is not in the
    /// active partition.
    pub fn copy(
        &mut self,
        id: &TaskId,
        due_date: Option<DateTime<Utc>>,
        tags: Option<Vec<String>>,
    ) -> Result<Task, StoreError> {
        let source = self
            .active
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let copy = source.duplicate(due_date, tags);
        Ok(self.add(copy))
    }

    /// Postpones a task's due date by the given duration.
    ///
    /// A task without a due date is first given one of "now", then the
    /// duration is added.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `id` is not in the active
    /// partition.
    pub fn snooze(
        &mut self,
        id: &TaskId,
        days: i64,
        hours: i64,
        minutes: i64,
    ) -> Result<Task, StoreError> {
        let task = self
            .active
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let base = task.due_date.unwrap_or_else(Utc::now);
        task.due_date =
            Some(base + Duration::days(days) + Duration::hours(hours) + Duration::minutes(minutes));
        let updated = task.clone();
        self.flush_active();
        Ok(updated)
    }

    /// Lists active tasks, optionally filtered by completion state.
    ///
    /// Sorted by priority descending (urgent first), then by due date
    /// ascending with missing due dates last.
    #[must_use]
    pub fn list(&self, completed: Option<bool>) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .active
            .values()
            .filter(|t| completed.is_none_or(|c| t.completed == c))
            .collect();
        tasks.sort_by_key(|t| {
            (
                t.priority.rank(),
                t.due_date.unwrap_or(DateTime::<Utc>::MAX_UTC),
            )
        });
        tasks
    }

    /// Lists archived tasks, optionally filtered by completion state.
    ///
    /// Sorted by archive timestamp descending (most recently archived
    /// first), with missing timestamps last.
    #[must_use]
    pub fn list_archived(&self, completed: Option<bool>) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .archived
            .values()
            .filter(|t| completed.is_none_or(|c| t.completed == c))
            .collect();
        tasks.sort_by_key(|t| {
            std::cmp::Reverse(t.archived_at.unwrap_or(DateTime::<Utc>::MIN_UTC))
        });
        tasks
    }

    /// Returns all tasks carrying `tag` (exact match), active first, plus
    /// archived tasks when requested.
    #[must_use]
    pub fn filter_by_tag(&self, tag: &str, include_archived: bool) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.list(None).into_iter().filter(|t| t.has_tag(tag)).collect();
        if include_archived {
            tasks.extend(self.list_archived(None).into_iter().filter(|t| t.has_tag(tag)));
        }
        tasks
    }

    /// Replaces the active partition wholesale with `tasks` and flushes.
    ///
    /// Idempotent to re-invocation with the same set. Returns the number
    /// of tasks now active.
    pub fn import_replace(&mut self, tasks: Vec<Task>) -> usize {
        self.active = tasks
            .into_iter()
            .map(normalize_imported)
            .map(|t| (t.id.clone(), t))
            .collect();
        let count = self.active.len();
        self.flush_active();
        count
    }

    /// Merges `tasks` into the active partition by id: a task is added
    /// only when its id is not already present, so existing local tasks
    /// are never overwritten. Returns the number of tasks added.
    pub fn import_merge(&mut self, tasks: Vec<Task>) -> usize {
        let mut added = 0;
        for task in tasks {
            if !self.active.contains_key(&task.id) {
                let task = normalize_imported(task);
                self.active.insert(task.id.clone(), task);
                added += 1;
            }
        }
        if added > 0 {
            self.flush_active();
        }
        added
    }

    /// Clones the active task list in display order, for serialization.
    #[must_use]
    pub fn active_snapshot(&self) -> Vec<Task> {
        self.list(None).into_iter().cloned().collect()
    }

    /// Drains any persistence warnings accumulated since the last call.
    pub fn take_warnings(&mut self) -> Vec<PersistenceError> {
        std::mem::take(&mut self.warnings)
    }

    fn flush_active(&mut self) {
        Self::flush(&self.tasks_file, &self.active, &mut self.warnings);
    }

    fn flush_archived(&mut self) {
        Self::flush(&self.archive_file, &self.archived, &mut self.warnings);
    }

    fn flush(path: &Path, tasks: &HashMap<TaskId, Task>, warnings: &mut Vec<PersistenceError>) {
        let mut ordered: Vec<Task> = tasks.values().cloned().collect();
        // Stable file order keeps diffs readable across runs.
        ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        let contents = match payload::encode_tasks(&ordered) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to encode task file");
                return;
            }
        };
        if let Err(e) = persist::write_file(path, &contents) {
            tracing::warn!(error = %e, "failed to flush task file; in-memory state kept");
            warnings.push(e);
        }
    }
}

/// Imported tasks land in the active partition, so any archive flag that
/// travelled with the payload is cleared to keep the partition invariant.
fn normalize_imported(mut task: Task) -> Task {
    if task.archived {
        task.restore();
    }
    task
}

fn load_partition(path: &Path, warnings: &mut Vec<PersistenceError>) -> HashMap<TaskId, Task> {
    let contents = match persist::read_file_if_exists(path) {
        Ok(Some(contents)) => contents,
        Ok(None) => return HashMap::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read task file; starting empty");
            warnings.push(e);
            return HashMap::new();
        }
    };
    match payload::decode_tasks(&contents) {
        Ok(tasks) => tasks.into_iter().map(|t| (t.id.clone(), t)).collect(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corrupt task file; starting empty");
            HashMap::new()
        }
    }
}
