//! Command handlers: wire CLI input to the store and sync reconciler.
//!
//! Handlers never panic or terminate the process; every failure is
//! rendered as a status line and control returns to the caller. The store
//! and reconciler are constructed once in `main` and passed in by
//! reference.

use std::io::{self, Write};

use chrono::Utc;

use taskforge_proto::payload;
use taskforge_proto::task::{Priority, Task, TaskId};

use crate::cli::{Command, SyncCommand};
use crate::config::Config;
use crate::dates;
use crate::persist;
use crate::remote::ScrapClient;
use crate::render;
use crate::store::TaskStore;
use crate::sync::{SyncManager, SyncOutcome};

/// Runs a parsed command against the store and reconciler.
#[allow(clippy::too_many_lines)]
pub fn dispatch<C: ScrapClient>(
    command: Command,
    store: &mut TaskStore,
    sync: &mut SyncManager<C>,
    config: &Config,
) {
    match command {
        Command::Add {
            title,
            description,
            priority,
            due,
            tags,
        } => {
            let due_date = match due.map(|d| dates::parse_date(&d)).transpose() {
                Ok(due_date) => due_date,
                Err(e) => {
                    render::error(&e.to_string());
                    return;
                }
            };
            let task = match Task::new(&title) {
                Ok(task) => task,
                Err(e) => {
                    render::error(&format!("Error creating task: {e}"));
                    return;
                }
            };
            let task = task
                .with_description(description)
                .with_priority(priority)
                .with_due_date(due_date)
                .with_tags(tags.map(|t| parse_tags(&t)).unwrap_or_default());
            let task = store.add(task);
            report_store_warnings(store);
            render::success(&format!(
                "Task added successfully with ID: {}",
                render::short_id(&task)
            ));
            show_task(&task, config);
        }

        Command::List {
            all,
            completed,
            tag,
        } => {
            let filter_completed = if all { None } else { Some(completed) };
            if let Some(tag) = tag {
                let mut tasks = store.filter_by_tag(&tag, false);
                let mut title = format!("Tasks with tag #{tag}");
                if let Some(wanted) = filter_completed {
                    tasks.retain(|t| t.completed == wanted);
                    let status = if wanted { "Completed" } else { "Pending" };
                    title = format!("{status} tasks with tag #{tag}");
                }
                render::print_task_table(&tasks, &title, &config.date_format);
            } else {
                let title = if all {
                    "All Tasks"
                } else if completed {
                    "Completed Tasks"
                } else {
                    "Pending Tasks"
                };
                render::print_task_table(&store.list(filter_completed), title, &config.date_format);
            }
        }

        Command::Info { task_id } => {
            let Some(id) = resolve_active(store, &task_id) else {
                return;
            };
            if let Some(task) = store.get(&id) {
                show_task(task, config);
            }
        }

        Command::Complete { task_id } => {
            let Some(id) = resolve_active(store, &task_id) else {
                return;
            };
            let Some(task) = store.get(&id) else { return };
            if task.completed {
                render::notice(&format!(
                    "Task {} is already marked as completed.",
                    render::short_id(task)
                ));
                return;
            }
            let mut task = task.clone();
            task.complete();
            match store.update(&id, task) {
                Ok(task) => {
                    report_store_warnings(store);
                    render::success(&format!(
                        "Task {} marked as completed.",
                        render::short_id(&task)
                    ));
                }
                Err(e) => render::error(&e.to_string()),
            }
        }

        Command::Uncomplete { task_id } => {
            let Some(id) = resolve_active(store, &task_id) else {
                return;
            };
            let Some(task) = store.get(&id) else { return };
            if !task.completed {
                render::notice(&format!(
                    "Task {} is already marked as not completed.",
                    render::short_id(task)
                ));
                return;
            }
            let mut task = task.clone();
            task.uncomplete();
            match store.update(&id, task) {
                Ok(task) => {
                    report_store_warnings(store);
                    render::success(&format!(
                        "Task {} marked as not completed.",
                        render::short_id(&task)
                    ));
                }
                Err(e) => render::error(&e.to_string()),
            }
        }

        Command::Edit {
            task_id,
            title,
            description,
            priority,
            due,
            tags,
        } => {
            let Some(id) = resolve_active(store, &task_id) else {
                return;
            };
            let Some(task) = store.get(&id) else { return };
            let mut task = task.clone();
            if let Some(title) = title {
                if let Err(e) = task.rename(&title) {
                    render::error(&format!("Error updating task: {e}"));
                    return;
                }
            }
            if let Some(description) = description {
                task.description = Some(description);
            }
            if let Some(priority) = priority {
                task.priority = priority;
            }
            if let Some(due) = due {
                if due.eq_ignore_ascii_case("none") {
                    task.due_date = None;
                } else {
                    match dates::parse_date(&due) {
                        Ok(parsed) => task.due_date = Some(parsed),
                        Err(e) => {
                            render::error(&e.to_string());
                            return;
                        }
                    }
                }
            }
            if let Some(tags) = tags {
                task.tags = if tags.eq_ignore_ascii_case("none") {
                    Vec::new()
                } else {
                    parse_tags(&tags)
                };
            }
            match store.update(&id, task) {
                Ok(task) => {
                    report_store_warnings(store);
                    render::success(&format!(
                        "Task {} updated successfully.",
                        render::short_id(&task)
                    ));
                    show_task(&task, config);
                }
                Err(e) => render::error(&e.to_string()),
            }
        }

        Command::Delete { task_id, force } => {
            let Some(id) = resolve_active(store, &task_id) else {
                return;
            };
            let Some(task) = store.get(&id).cloned() else {
                return;
            };
            if !force {
                show_task(&task, config);
                if !confirm("Are you sure you want to delete this task?") {
                    render::notice("Task deletion cancelled.");
                    return;
                }
            }
            if store.delete(&id) {
                report_store_warnings(store);
                render::success(&format!(
                    "Task {} deleted successfully.",
                    render::short_id(&task)
                ));
            } else {
                render::error(&format!(
                    "Failed to delete task {}.",
                    render::short_id(&task)
                ));
            }
        }

        Command::Remind => {
            let now = Utc::now();
            let mut due_tasks: Vec<&Task> = store
                .list(Some(false))
                .into_iter()
                .filter(|t| t.due_date.is_some_and(|d| d > now))
                .collect();
            due_tasks.sort_by_key(|t| t.due_date);
            if due_tasks.is_empty() {
                render::notice("No upcoming tasks with due dates.");
                return;
            }
            render::print_task_table(&due_tasks, "Upcoming Tasks", &config.date_format);
        }

        Command::Archive { task_id } => {
            let Some(id) = resolve_active(store, &task_id) else {
                return;
            };
            match store.archive(&id) {
                Ok(task) => {
                    report_store_warnings(store);
                    render::success(&format!(
                        "Task {} archived successfully.",
                        render::short_id(&task)
                    ));
                    show_task(&task, config);
                }
                Err(e) => render::error(&e.to_string()),
            }
        }

        Command::ListArchived {
            all,
            completed,
            tag,
        } => {
            let filter_completed = if all { None } else { Some(completed) };
            if let Some(tag) = tag {
                let mut tasks: Vec<&Task> = store
                    .filter_by_tag(&tag, true)
                    .into_iter()
                    .filter(|t| t.archived)
                    .collect();
                let mut title = format!("Archived tasks with tag #{tag}");
                if let Some(wanted) = filter_completed {
                    tasks.retain(|t| t.completed == wanted);
                    let status = if wanted { "completed" } else { "pending" };
                    title = format!("Archived {status} tasks with tag #{tag}");
                }
                render::print_archived_table(&tasks, &title, &config.date_format);
            } else {
                let title = if all {
                    "All Archived Tasks"
                } else if completed {
                    "Archived Completed Tasks"
                } else {
                    "Archived Pending Tasks"
                };
                render::print_archived_table(
                    &store.list_archived(filter_completed),
                    title,
                    &config.date_format,
                );
            }
        }

        Command::Restore { task_id } => {
            let Some(id) = resolve_archived(store, &task_id) else {
                return;
            };
            match store.restore(&id) {
                Ok(task) => {
                    report_store_warnings(store);
                    render::success(&format!(
                        "Task {} restored successfully.",
                        render::short_id(&task)
                    ));
                    show_task(&task, config);
                }
                Err(e) => render::error(&e.to_string()),
            }
        }

        Command::Copy {
            task_id,
            due,
            tags,
            no_keep_tags,
        } => {
            let Some(id) = resolve_active(store, &task_id) else {
                return;
            };
            let due_date = match due.map(|d| dates::parse_date(&d)).transpose() {
                Ok(due_date) => due_date,
                Err(e) => {
                    render::error(&e.to_string());
                    return;
                }
            };
            let new_tags = tags.map(|t| {
                let parsed = parse_tags(&t);
                if no_keep_tags {
                    parsed
                } else {
                    let original = store.get(&id).map(|task| task.tags.clone()).unwrap_or_default();
                    merge_tags(&original, parsed)
                }
            });
            match store.copy(&id, due_date, new_tags) {
                Ok(task) => {
                    report_store_warnings(store);
                    render::success(&format!(
                        "Task copied successfully with new ID: {}",
                        render::short_id(&task)
                    ));
                    show_task(&task, config);
                }
                Err(e) => render::error(&e.to_string()),
            }
        }

        Command::Snooze { task_id, duration } => {
            let Some(id) = resolve_active(store, &task_id) else {
                return;
            };
            let (days, hours, minutes) = match dates::parse_duration(&duration) {
                Ok(components) => components,
                Err(e) => {
                    render::notice(&e.to_string());
                    return;
                }
            };
            let old_due = store.get(&id).and_then(|t| t.due_date);
            match store.snooze(&id, days, hours, minutes) {
                Ok(task) => {
                    report_store_warnings(store);
                    let old = old_due.map_or_else(
                        || "None".to_string(),
                        |d| render::format_date(d, &config.date_format),
                    );
                    let new = task.due_date.map_or_else(
                        || "None".to_string(),
                        |d| render::format_date(d, &config.date_format),
                    );
                    render::success(&format!(
                        "Task {} snoozed successfully.",
                        render::short_id(&task)
                    ));
                    println!("Due date changed from {old} to {new}");
                    show_task(&task, config);
                }
                Err(e) => render::error(&e.to_string()),
            }
        }

        Command::Prioritize {
            task_id,
            priority,
            bump,
        } => {
            let Some(id) = resolve_active(store, &task_id) else {
                return;
            };
            let Some(task) = store.get(&id) else { return };
            let mut task = task.clone();
            let old_priority = task.priority;
            let new_priority = if let Some(priority) = priority {
                priority
            } else if bump {
                match task.priority.bump() {
                    Some(priority) => priority,
                    None => {
                        render::notice(&format!(
                            "Task {} is already at the highest priority (URGENT).",
                            render::short_id(&task)
                        ));
                        return;
                    }
                }
            } else {
                let Some(priority) = prompt_priority() else {
                    return;
                };
                priority
            };
            task.priority = new_priority;
            match store.update(&id, task) {
                Ok(task) => {
                    report_store_warnings(store);
                    render::success(&format!(
                        "Task {} priority updated successfully.",
                        render::short_id(&task)
                    ));
                    println!(
                        "Priority changed from {} to {}",
                        old_priority.to_string().to_uppercase(),
                        task.priority.to_string().to_uppercase()
                    );
                    show_task(&task, config);
                }
                Err(e) => render::error(&e.to_string()),
            }
        }

        Command::Export { output } => {
            let tasks = store.active_snapshot();
            let result = payload::encode_tasks(&tasks)
                .map_err(|e| e.to_string())
                .and_then(|contents| {
                    persist::write_file(&output, &contents).map_err(|e| e.to_string())
                });
            match result {
                Ok(()) => render::success(&format!("Tasks exported to {}", output.display())),
                Err(e) => render::error(&format!("Error exporting tasks: {e}")),
            }
        }

        Command::Import { input, merge } => {
            let contents = match std::fs::read_to_string(&input) {
                Ok(contents) => contents,
                Err(e) => {
                    render::error(&format!("Error importing tasks: {e}"));
                    return;
                }
            };
            let tasks = match payload::decode_tasks(&contents) {
                Ok(tasks) => tasks,
                Err(e) => {
                    render::error(&format!("Error importing tasks: {e}"));
                    return;
                }
            };
            let count = if merge {
                store.import_merge(tasks)
            } else {
                store.import_replace(tasks)
            };
            report_store_warnings(store);
            let verb = if merge { "merged" } else { "imported" };
            render::success(&format!(
                "Successfully {verb} {count} tasks from {}",
                input.display()
            ));
        }

        Command::Sync(sync_command) => run_sync(sync_command, store, sync, config),
    }
}

fn run_sync<C: ScrapClient>(
    command: SyncCommand,
    store: &mut TaskStore,
    sync: &mut SyncManager<C>,
    config: &Config,
) {
    match command {
        SyncCommand::Create { public } => {
            let tasks = store.active_snapshot();
            let outcome = sync.sync_create(&tasks, public);
            report_sync_warnings(sync);
            print_outcome(&outcome, "Sync created");
        }

        SyncCommand::Update => {
            let tasks = store.active_snapshot();
            let outcome = sync.sync_update(&tasks);
            report_sync_warnings(sync);
            print_outcome(&outcome, "Sync updated");
        }

        SyncCommand::Import {
            source,
            access_key,
            replace,
        } => {
            let tasks = sync.import(&source, access_key.as_deref());
            if tasks.is_empty() {
                render::notice(&format!(
                    "No tasks found at {source} — import unavailable or the scrap is empty."
                ));
                return;
            }
            let total = tasks.len();
            if replace {
                let count = store.import_replace(tasks);
                report_store_warnings(store);
                render::success(&format!("Replaced local tasks with {count} imported tasks."));
            } else {
                let added = store.import_merge(tasks);
                report_store_warnings(store);
                render::success(&format!(
                    "Merged {added} new tasks ({} already present).",
                    total - added
                ));
            }
        }

        SyncCommand::History => {
            let history = sync.history();
            if history.is_empty() {
                render::notice("No sync history.");
                return;
            }
            let lines: Vec<String> = history
                .iter()
                .enumerate()
                .map(|(index, record)| {
                    let time = record.time.map_or_else(
                        || "-".to_string(),
                        |t| render::format_date(t, &config.date_format),
                    );
                    let id = record.id.as_deref().unwrap_or("(offline)");
                    let url = record.url.as_deref().unwrap_or("-");
                    format!("{:>2}. {time}  {id}  {url}", index + 1)
                })
                .collect();
            render::print_panel("Sync History", &lines);
        }

        SyncCommand::Clear => {
            sync.clear();
            report_sync_warnings(sync);
            render::success("Sync information cleared.");
        }
    }
}

fn show_task(task: &Task, config: &Config) {
    render::print_panel(
        &format!("Task {}", render::short_id(task)),
        &render::task_detail_lines(task, &config.date_format),
    );
}

fn print_outcome(outcome: &SyncOutcome, verb: &str) {
    if outcome.offline {
        render::notice(&format!(
            "Warning: {verb} in offline mode - {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        ));
    } else {
        render::success(&format!("{verb} successfully."));
    }
    let mut lines = Vec::new();
    if let Some(id) = &outcome.scrap_id {
        lines.push(format!("Scrap ID: {id}"));
    }
    if let Some(url) = &outcome.url {
        lines.push(format!("URL: {url}"));
    }
    if let Some(raw) = &outcome.raw_url {
        lines.push(format!("Raw URL: {raw}"));
    }
    if let Some(owner) = &outcome.owner_key {
        lines.push(format!("Owner key: {owner}"));
    }
    if let Some(access) = &outcome.access_key {
        lines.push(format!("Access key: {access}"));
    }
    if !lines.is_empty() {
        render::print_panel("Sync", &lines);
    }
}

fn report_store_warnings(store: &mut TaskStore) {
    for warning in store.take_warnings() {
        render::notice(&format!("Warning: {warning}"));
    }
}

fn report_sync_warnings<C: ScrapClient>(sync: &mut SyncManager<C>) {
    for warning in sync.take_warnings() {
        render::notice(&format!("Warning: {warning}"));
    }
}

/// Resolves a task-id prefix against the active partition, reporting
/// misses and ambiguity to the user.
fn resolve_active(store: &TaskStore, prefix: &str) -> Option<TaskId> {
    resolve_in(&store.list(None), prefix, "Task")
}

/// Resolves a task-id prefix against the archived partition.
fn resolve_archived(store: &TaskStore, prefix: &str) -> Option<TaskId> {
    resolve_in(&store.list_archived(None), prefix, "Archived task")
}

fn resolve_in(tasks: &[&Task], prefix: &str, kind: &str) -> Option<TaskId> {
    let matches: Vec<&TaskId> = tasks
        .iter()
        .map(|t| &t.id)
        .filter(|id| id.to_string().starts_with(prefix))
        .collect();
    match matches.as_slice() {
        [] => {
            render::error(&format!("{kind} with ID {prefix} not found."));
            None
        }
        [id] => Some((*id).clone()),
        _ => {
            render::error(&format!(
                "{kind} ID {prefix} is ambiguous ({} matches); use more characters.",
                matches.len()
            ));
            None
        }
    }
}

/// Splits a comma-separated tag string, trimming whitespace and dropping
/// empty entries.
fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Stable union: original tags first, then new tags not already present.
fn merge_tags(original: &[String], extra: Vec<String>) -> Vec<String> {
    let mut merged = original.to_vec();
    for tag in extra {
        if !merged.contains(&tag) {
            merged.push(tag);
        }
    }
    merged
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn prompt_priority() -> Option<Priority> {
    println!("Select new priority:");
    println!("1. LOW");
    println!("2. MEDIUM");
    println!("3. HIGH");
    println!("4. URGENT");
    print!("Enter choice (1-4): ");
    if io::stdout().flush().is_err() {
        return None;
    }
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        render::error("Failed to read input.");
        return None;
    }
    match input.trim() {
        "1" => Some(Priority::Low),
        "2" => Some(Priority::Medium),
        "3" => Some(Priority::High),
        "4" => Some(Priority::Urgent),
        _ => {
            render::error("Invalid choice. Please enter a number between 1 and 4.");
            None
        }
    }
}
