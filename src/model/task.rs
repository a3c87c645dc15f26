use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category given to tasks when the caller doesn't pick one
pub const DEFAULT_CATEGORY: &str = "Personal";

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Lowercase name, as accepted on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid priority '{0}' (expected low, medium or high)")]
pub struct ParsePriorityError(String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "l" => Ok(Priority::Low),
            "medium" | "med" | "m" => Ok(Priority::Medium),
            "high" | "h" => Ok(Priority::High),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

/// A single to-do item.
///
/// `id` is the only identity: two tasks with the same id are the same task,
/// whatever their other fields say. Serialized with camelCase keys
/// (`isCompleted`, `createdAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_category")]
    pub category: String,
    pub created_at: DateTime<Utc>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Task {
    /// Create a new, not yet completed task with a fresh id, stamped now
    pub fn new(title: impl Into<String>, priority: Priority, category: impl Into<String>) -> Self {
        Task {
            id: Uuid::new_v4(),
            title: title.into(),
            is_completed: false,
            priority,
            category: category.into(),
            created_at: Utc::now(),
        }
    }

    /// First 8 hex digits of the id
    pub fn short_id(&self) -> String {
        let mut s = self.id.simple().to_string();
        s.truncate(8);
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_defaults() {
        let task = Task::new("Buy milk", Priority::Medium, "Shopping");
        assert_eq!(task.title, "Buy milk");
        assert!(!task.is_completed);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, "Shopping");
        assert!(task.created_at <= Utc::now());
    }

    #[test]
    fn new_tasks_get_distinct_ids() {
        let a = Task::new("a", Priority::Low, DEFAULT_CATEGORY);
        let b = Task::new("a", Priority::Low, DEFAULT_CATEGORY);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn short_id_is_uuid_prefix() {
        let task = Task::new("x", Priority::High, "Work");
        let short = task.short_id();
        assert_eq!(short.len(), 8);
        assert!(task.id.simple().to_string().starts_with(&short));
    }

    #[test]
    fn priority_default_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn priority_parses_loosely() {
        assert_eq!("LOW".parse::<Priority>().unwrap(), Priority::Low);
        assert_eq!(" med ".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!("h".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn priority_serializes_capitalized() {
        assert_eq!(serde_json::to_string(&Priority::Low).unwrap(), "\"Low\"");
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"High\"");
        let p: Priority = serde_json::from_str("\"Medium\"").unwrap();
        assert_eq!(p, Priority::Medium);
    }

    #[test]
    fn task_json_field_names() {
        let task = Task::new("Walk", Priority::Low, "Health");
        let value = serde_json::to_value(&task).unwrap();
        let obj = value.as_object().unwrap();
        for key in ["id", "title", "isCompleted", "priority", "category", "createdAt"] {
            assert!(obj.contains_key(key), "missing {}", key);
        }
        assert_eq!(obj["priority"], "Low");
        assert_eq!(obj["isCompleted"], false);
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let json = r#"{
            "id": "5f0c6f4e-8a0b-4c1e-9d2a-1b2c3d4e5f60",
            "title": "Old task",
            "createdAt": "2025-12-16T10:00:00Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(!task.is_completed);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, DEFAULT_CATEGORY);
    }
}
