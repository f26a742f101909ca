//! Command-line interface definition for `TaskForge`.
//!
//! Argument parsing only; behavior lives in [`crate::commands`].

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use taskforge_proto::task::{Priority, ValidationError};

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(
    name = "taskforge",
    version,
    about = "TaskForge: a cross-platform CLI task manager"
)]
pub struct Cli {
    /// Directory where the task files are stored.
    #[arg(long, env = "TASKFORGE_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the remote paste service API.
    #[arg(long, env = "TASKFORGE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Path to config file (default: `~/.config/taskforge/config.toml`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn", env = "TASKFORGE_LOG", global = true)]
    pub log_level: String,

    /// The command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// All `taskforge` subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task.
    Add {
        /// The title of the task.
        title: String,
        /// Task description.
        #[arg(long = "desc", short = 'd')]
        description: Option<String>,
        /// Task priority.
        #[arg(long, short, value_parser = parse_priority, default_value = "medium")]
        priority: Priority,
        /// Due date (e.g., `2025-05-10 14:00`, `tomorrow`).
        #[arg(long)]
        due: Option<String>,
        /// Comma-separated list of tags.
        #[arg(long, short)]
        tags: Option<String>,
    },

    /// List tasks.
    List {
        /// Show all tasks including completed ones.
        #[arg(long, short)]
        all: bool,
        /// Show only completed tasks.
        #[arg(long, short)]
        completed: bool,
        /// Filter tasks by tag.
        #[arg(long, short)]
        tag: Option<String>,
    },

    /// Show detailed information about a task.
    Info {
        /// ID (or unique prefix) of the task to show.
        task_id: String,
    },

    /// Mark a task as completed.
    Complete {
        /// ID (or unique prefix) of the task to mark as completed.
        task_id: String,
    },

    /// Mark a task as not completed.
    Uncomplete {
        /// ID (or unique prefix) of the task to mark as not completed.
        task_id: String,
    },

    /// Edit an existing task.
    Edit {
        /// ID (or unique prefix) of the task to edit.
        task_id: String,
        /// New title for the task.
        #[arg(long, short)]
        title: Option<String>,
        /// New description for the task.
        #[arg(long = "desc", short = 'd')]
        description: Option<String>,
        /// New priority for the task.
        #[arg(long, short, value_parser = parse_priority)]
        priority: Option<Priority>,
        /// New due date, or `none` to clear it.
        #[arg(long)]
        due: Option<String>,
        /// New comma-separated list of tags, or `none` to clear them.
        #[arg(long)]
        tags: Option<String>,
    },

    /// Delete a task.
    Delete {
        /// ID (or unique prefix) of the task to delete.
        task_id: String,
        /// Delete without confirmation.
        #[arg(long, short)]
        force: bool,
    },

    /// Show upcoming tasks with due dates.
    Remind,

    /// Archive a task to keep it for reference without cluttering the list.
    Archive {
        /// ID (or unique prefix) of the task to archive.
        task_id: String,
    },

    /// List archived tasks.
    #[command(name = "list-archived")]
    ListArchived {
        /// Show all archived tasks including completed ones.
        #[arg(long, short)]
        all: bool,
        /// Show only completed archived tasks.
        #[arg(long, short)]
        completed: bool,
        /// Filter archived tasks by tag.
        #[arg(long, short)]
        tag: Option<String>,
    },

    /// Restore an archived task to active status.
    Restore {
        /// ID (or unique prefix) of the archived task to restore.
        task_id: String,
    },

    /// Duplicate a task, optionally with a new due date or tags.
    Copy {
        /// ID (or unique prefix) of the task to copy.
        task_id: String,
        /// Due date for the copied task.
        #[arg(long)]
        due: Option<String>,
        /// Comma-separated list of tags for the copied task.
        #[arg(long)]
        tags: Option<String>,
        /// Do not merge the original task's tags into `--tags`.
        #[arg(long)]
        no_keep_tags: bool,
    },

    /// Postpone a task's due date by a duration like `1d2h30m`.
    Snooze {
        /// ID (or unique prefix) of the task to snooze.
        task_id: String,
        /// Duration to postpone (e.g., `1d`, `2h`, `30m`, `1d2h30m`).
        duration: String,
    },

    /// Change a task's priority level.
    Prioritize {
        /// ID (or unique prefix) of the task to prioritize.
        task_id: String,
        /// Set task priority directly.
        #[arg(long, short, value_parser = parse_priority)]
        priority: Option<Priority>,
        /// Bump task priority up one level.
        #[arg(long, short)]
        bump: bool,
    },

    /// Export tasks to a JSON file.
    Export {
        /// Path to export the tasks to.
        output: PathBuf,
    },

    /// Import tasks from a JSON file.
    Import {
        /// Path to import tasks from.
        input: PathBuf,
        /// Merge into the current list instead of replacing it.
        #[arg(long)]
        merge: bool,
    },

    /// Synchronize tasks with the remote paste service.
    #[command(subcommand)]
    Sync(SyncCommand),
}

/// `taskforge sync` subcommands.
#[derive(Subcommand, Debug)]
pub enum SyncCommand {
    /// Push the current task list as a new remote scrap.
    Create {
        /// Make the scrap publicly readable (no access key).
        #[arg(long)]
        public: bool,
    },

    /// Push the current task list to the existing remote scrap.
    Update,

    /// Import tasks from a remote scrap URL or id.
    Import {
        /// Scrap URL or bare id to import from.
        source: String,
        /// Access key for a private scrap.
        #[arg(long)]
        access_key: Option<String>,
        /// Replace the local task list instead of merging.
        #[arg(long)]
        replace: bool,
    },

    /// Show the sync history.
    History,

    /// Clear all saved sync information.
    Clear,
}

/// clap value parser for [`Priority`].
fn parse_priority(s: &str) -> Result<Priority, String> {
    s.parse().map_err(|e: ValidationError| e.to_string())
}
