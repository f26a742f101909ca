//! Terminal rendering for task lists, panels, and status lines.
//!
//! Presentation only: the priority→color mapping lives here, never in the
//! core model. Cells are padded before styling so ANSI escapes don't skew
//! column alignment.

use chrono::{DateTime, Local, Utc};
use crossterm::style::{Color, Stylize};

use taskforge_proto::task::{Priority, Task};

/// Number of id characters shown in listings.
pub const SHORT_ID_LENGTH: usize = 8;

/// The display form of a task id.
#[must_use]
pub fn short_id(task: &Task) -> String {
    task.id.to_string().chars().take(SHORT_ID_LENGTH).collect()
}

/// Formats a timestamp for display in the local timezone.
#[must_use]
pub fn format_date(ts: DateTime<Utc>, format: &str) -> String {
    ts.with_timezone(&Local).format(format).to_string()
}

/// Prints a green status line.
pub fn success(message: &str) {
    println!("{}", message.green());
}

/// Prints a yellow notice line.
pub fn notice(message: &str) {
    println!("{}", message.yellow());
}

/// Prints a red error line.
pub fn error(message: &str) {
    println!("{}", message.red());
}

const fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Blue,
        Priority::Medium => Color::Green,
        Priority::High => Color::Yellow,
        Priority::Urgent => Color::Red,
    }
}

/// One table cell: text plus an optional foreground color.
type Cell = (String, Option<Color>);

fn status_cell(task: &Task) -> Cell {
    if task.completed {
        ("✓".to_string(), Some(Color::Green))
    } else {
        ("✗".to_string(), Some(Color::Red))
    }
}

fn priority_cell(task: &Task) -> Cell {
    (
        task.priority.to_string().to_uppercase(),
        Some(priority_color(task.priority)),
    )
}

fn tags_cell(task: &Task) -> Cell {
    let tags = task
        .tags
        .iter()
        .map(|t| format!("#{t}"))
        .collect::<Vec<_>>()
        .join(", ");
    (tags, Some(Color::Cyan))
}

/// Prints active tasks as a table with a due-date column.
pub fn print_task_table(tasks: &[&Task], title: &str, date_format: &str) {
    if tasks.is_empty() {
        print_panel(title, &["No tasks found.".to_string()]);
        return;
    }
    let rows: Vec<Vec<Cell>> = tasks
        .iter()
        .map(|task| {
            vec![
                status_cell(task),
                (short_id(task), Some(Color::DarkGrey)),
                (task.title.clone(), None),
                priority_cell(task),
                (
                    task.due_date
                        .map(|d| format_date(d, date_format))
                        .unwrap_or_default(),
                    None,
                ),
                tags_cell(task),
            ]
        })
        .collect();
    print_table(title, &["", "ID", "Title", "Priority", "Due Date", "Tags"], &rows);
}

/// Prints archived tasks as a table with an archived-on column.
pub fn print_archived_table(tasks: &[&Task], title: &str, date_format: &str) {
    if tasks.is_empty() {
        print_panel(title, &["No archived tasks found.".to_string()]);
        return;
    }
    let rows: Vec<Vec<Cell>> = tasks
        .iter()
        .map(|task| {
            vec![
                status_cell(task),
                (short_id(task), Some(Color::DarkGrey)),
                (task.title.clone(), None),
                priority_cell(task),
                (
                    task.archived_at
                        .map(|d| format_date(d, date_format))
                        .unwrap_or_default(),
                    None,
                ),
                tags_cell(task),
            ]
        })
        .collect();
    print_table(
        title,
        &["", "ID", "Title", "Priority", "Archived On", "Tags"],
        &rows,
    );
}

/// Builds the detail lines for a task, used by the `info` panel and the
/// confirmation panels after mutations.
#[must_use]
pub fn task_detail_lines(task: &Task, date_format: &str) -> Vec<String> {
    let mut lines = vec![format!("Title: {}", task.title)];
    if let Some(description) = &task.description {
        lines.push(format!("Description: {description}"));
    }
    lines.push(format!(
        "Status: {}",
        if task.completed { "Completed" } else { "Pending" }
    ));
    lines.push(format!(
        "Priority: {}",
        task.priority.to_string().to_uppercase()
    ));
    lines.push(format!("Created: {}", format_date(task.created_at, date_format)));
    if let Some(due) = task.due_date {
        lines.push(format!("Due Date: {}", format_date(due, date_format)));
    }
    if let Some(completed_at) = task.completed_at {
        lines.push(format!(
            "Completed At: {}",
            format_date(completed_at, date_format)
        ));
    }
    if let Some(archived_at) = task.archived_at {
        lines.push(format!(
            "Archived At: {}",
            format_date(archived_at, date_format)
        ));
    }
    if !task.tags.is_empty() {
        let tags = task
            .tags
            .iter()
            .map(|t| format!("#{t}"))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("Tags: {tags}"));
    }
    if !task.attachments.is_empty() {
        lines.push(format!("Attachments: {}", task.attachments.join(", ")));
    }
    if let Some(presence) = &task.attachment_presence {
        for (name, state) in presence {
            lines.push(format!("  {name}: {state:?}"));
        }
    }
    lines
}

/// Prints a bordered panel with a title and body lines.
pub fn print_panel(title: &str, lines: &[String]) {
    let width = lines
        .iter()
        .map(|l| display_width(l))
        .chain(std::iter::once(display_width(title) + 2))
        .max()
        .unwrap_or(0);
    println!(
        "╭─ {} {}╮",
        title.bold(),
        "─".repeat(width.saturating_sub(display_width(title) + 1))
    );
    for line in lines {
        println!(
            "│ {}{} │",
            line,
            " ".repeat(width.saturating_sub(display_width(line)))
        );
    }
    println!("╰{}╯", "─".repeat(width + 2));
}

fn print_table(title: &str, headers: &[&str], rows: &[Vec<Cell>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (i, (text, _)) in row.iter().enumerate() {
            widths[i] = widths[i].max(display_width(text));
        }
    }

    println!("{}", title.bold());
    let header_line = headers
        .iter()
        .enumerate()
        .map(|(i, h)| pad(h, widths[i]))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", header_line.bold());
    println!("{}", "─".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
    for row in rows {
        let line = row
            .iter()
            .enumerate()
            .map(|(i, (text, color))| {
                let padded = pad(text, widths[i]);
                color.map_or(padded.clone(), |c| padded.with(c).to_string())
            })
            .collect::<Vec<_>>()
            .join("  ");
        println!("{line}");
    }
}

fn pad(text: &str, width: usize) -> String {
    format!("{text}{}", " ".repeat(width.saturating_sub(display_width(text))))
}

/// Character count stands in for display width; wide glyphs may misalign
/// but never panic.
fn display_width(text: &str) -> usize {
    text.chars().count()
}
