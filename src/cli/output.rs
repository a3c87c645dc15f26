use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::task::{Priority, Task};
use crate::util::unicode::{display_width, pad_to_width, truncate_to_width};

// ---------------------------------------------------------------------------
// Priority colors
// ---------------------------------------------------------------------------

/// Display color for a priority. Presentation only; the store never looks at it.
pub fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "green",
        Priority::Medium => "orange",
        Priority::High => "red",
    }
}

/// ANSI SGR code for a color name. Terminals have no orange, so it maps to yellow.
fn ansi_code(color: &str) -> &'static str {
    match color {
        "green" => "32",
        "orange" => "33",
        "red" => "31",
        _ => "39",
    }
}

fn paint(text: &str, color: &str) -> String {
    format!("\x1b[{}m{}\x1b[0m", ansi_code(color), text)
}

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson {
    /// 1-based position in the listing this task came from
    pub position: usize,
    pub id: Uuid,
    pub title: String,
    pub is_completed: bool,
    pub priority: Priority,
    pub color: &'static str,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

pub fn task_to_json(position: usize, task: &Task) -> TaskJson {
    TaskJson {
        position,
        id: task.id,
        title: task.title.clone(),
        is_completed: task.is_completed,
        priority: task.priority,
        color: priority_color(task.priority),
        category: task.category.clone(),
        created_at: task.created_at,
    }
}

/// Tasks numbered from 1, as `tm rm` expects them
pub fn listing_to_json(tasks: &[&Task]) -> Vec<TaskJson> {
    tasks
        .iter()
        .enumerate()
        .map(|(i, t)| task_to_json(i + 1, t))
        .collect()
}

#[derive(Serialize)]
pub struct AddedJson {
    pub id: Uuid,
    pub position: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggledJson {
    pub id: Uuid,
    pub is_completed: bool,
}

#[derive(Serialize)]
pub struct DeletedJson {
    pub deleted: Vec<Uuid>,
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// How listings are laid out
#[derive(Debug, Clone, Copy)]
pub struct ListStyle {
    pub max_title_width: usize,
    pub color: bool,
}

fn checkbox(task: &Task) -> &'static str {
    if task.is_completed { "[x]" } else { "[ ]" }
}

/// Format a single task as a one-line summary
pub fn format_task_line(task: &Task) -> String {
    format!(
        "{} {}  {}  {}  {}",
        checkbox(task),
        task.short_id(),
        task.title,
        task.priority,
        task.category
    )
}

/// Format a numbered listing with the title column aligned
pub fn format_listing(tasks: &[&Task], style: ListStyle) -> Vec<String> {
    let titles: Vec<String> = tasks
        .iter()
        .map(|t| truncate_to_width(&t.title, style.max_title_width))
        .collect();
    let title_width = titles.iter().map(|t| display_width(t)).max().unwrap_or(0);
    let num_width = tasks.len().to_string().len();

    tasks
        .iter()
        .zip(&titles)
        .enumerate()
        .map(|(i, (task, title))| {
            let priority = pad_to_width(task.priority.as_str(), "medium".len());
            let priority = if style.color {
                paint(&priority, priority_color(task.priority))
            } else {
                priority
            };
            let line = format!(
                "{:>width$}  {} {}  {}  {}  {}",
                i + 1,
                checkbox(task),
                task.short_id(),
                pad_to_width(title, title_width),
                priority,
                task.category,
                width = num_width,
            );
            line.trim_end().to_string()
        })
        .collect()
}
