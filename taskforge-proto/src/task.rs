//! Core task model for `TaskForge`.
//!
//! Defines the [`Task`] record, its priority scale, and the pure lifecycle
//! transitions (complete/uncomplete, archive/restore). Construction-time
//! validation lives here; partition bookkeeping (active vs. archived) is
//! the store's responsibility.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Maximum allowed task title length in characters.
pub const MAX_TASK_TITLE_LENGTH: usize = 256;

/// Errors raised when constructing or editing a task with bad field values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Task title cannot be empty.
    #[error("task title cannot be empty")]
    TitleEmpty,
    /// Task title exceeds the maximum length.
    #[error("task title too long (max {MAX_TASK_TITLE_LENGTH} characters)")]
    TitleTooLong,
    /// The given string is not a known priority level.
    #[error("unknown priority: {0} (expected low, medium, high, or urgent)")]
    UnknownPriority(String),
}

/// Unique identifier for a task, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Task priority scale, totally ordered `Urgent > High > Medium > Low`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Lowest priority.
    Low,
    /// Default priority.
    #[default]
    Medium,
    /// Elevated priority.
    High,
    /// Highest priority.
    Urgent,
}

impl Priority {
    /// Sort rank with `Urgent` first (0) and `Low` last (3).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Urgent => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    /// Returns the next level up, or `None` when already at `Urgent`.
    #[must_use]
    pub const fn bump(self) -> Option<Self> {
        match self {
            Self::Low => Some(Self::Medium),
            Self::Medium => Some(Self::High),
            Self::High => Some(Self::Urgent),
            Self::Urgent => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Urgent => write!(f, "urgent"),
        }
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(ValidationError::UnknownPriority(other.to_string())),
        }
    }
}

/// Where an attachment's bytes currently live, relative to this machine.
///
/// Imported task sets may reference attachments whose bytes were never
/// transferred; this records that explicitly instead of leaving the
/// attachment list silently dangling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentPresence {
    /// The file exists in the local attachment directory.
    Local,
    /// The file is referenced by a remote task set but not present locally.
    RemoteOnly,
    /// The file is referenced but could not be found anywhere.
    Missing,
}

/// A single task record.
///
/// Lifecycle flags come in pairs: `completed`/`completed_at` and
/// `archived`/`archived_at`, where the timestamp is non-null iff the flag
/// is set. Whether the task lives in the active or archived partition is
/// owned by the store; `archived` merely mirrors it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier, immutable after creation.
    pub id: TaskId,
    /// Required non-empty title.
    pub title: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// Optional due date.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Priority level (defaults to medium).
    #[serde(default)]
    pub priority: Priority,
    /// Tags in insertion order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the task is completed.
    #[serde(default)]
    pub completed: bool,
    /// When the task was completed (set iff `completed`).
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Whether the task is archived.
    #[serde(default)]
    pub archived: bool,
    /// When the task was archived (set iff `archived`).
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
    /// Filenames of attached files; the bytes live outside this model.
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Per-attachment presence map, populated on import when attachment
    /// bytes may not have travelled with the task set.
    #[serde(default)]
    pub attachment_presence: Option<BTreeMap<String, AttachmentPresence>>,
}

impl Task {
    /// Creates a new task with a fresh id and the given title.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TitleEmpty`] if the title is empty, or
    /// [`ValidationError::TitleTooLong`] if it exceeds 256 characters.
    pub fn new(title: &str) -> Result<Self, ValidationError> {
        validate_title(title)?;
        Ok(Self {
            id: TaskId::new(),
            title: title.to_string(),
            description: None,
            created_at: Utc::now(),
            due_date: None,
            priority: Priority::default(),
            tags: Vec::new(),
            completed: false,
            completed_at: None,
            archived: false,
            archived_at: None,
            attachments: Vec::new(),
            attachment_presence: None,
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: Option<DateTime<Utc>>) -> Self {
        self.due_date = due_date;
        self
    }

    /// Sets the tag list.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Replaces the title, re-running construction-time validation.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the new title is empty or too long.
    pub fn rename(&mut self, title: &str) -> Result<(), ValidationError> {
        validate_title(title)?;
        self.title = title.to_string();
        Ok(())
    }

    /// Marks the task as completed, stamping `completed_at`.
    pub fn complete(&mut self) {
        self.completed = true;
        self.completed_at = Some(Utc::now());
    }

    /// Marks the task as not completed, clearing `completed_at`.
    pub fn uncomplete(&mut self) {
        self.completed = false;
        self.completed_at = None;
    }

    /// Marks the task as archived, stamping `archived_at`.
    ///
    /// Moving the task between partitions is the store's job.
    pub fn archive(&mut self) {
        self.archived = true;
        self.archived_at = Some(Utc::now());
    }

    /// Marks the task as not archived, clearing `archived_at`.
    pub fn restore(&mut self) {
        self.archived = false;
        self.archived_at = None;
    }

    /// Builds a duplicate with a fresh id and reset lifecycle state.
    ///
    /// All copyable fields carry over; completion and archive state reset
    /// to "new". `due_date` and `tags` may be overridden.
    #[must_use]
    pub fn duplicate(
        &self,
        due_date: Option<DateTime<Utc>>,
        tags: Option<Vec<String>>,
    ) -> Self {
        let mut copy = self.clone();
        copy.id = TaskId::new();
        copy.completed = false;
        copy.completed_at = None;
        copy.archived = false;
        copy.archived_at = None;
        if let Some(due) = due_date {
            copy.due_date = Some(due);
        }
        if let Some(tags) = tags {
            copy.tags = tags;
        }
        copy
    }

    /// Whether the tag list contains `tag` (exact string match).
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Err(ValidationError::TitleEmpty);
    }
    if title.chars().count() > MAX_TASK_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(())
}
