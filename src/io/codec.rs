use crate::model::task::Task;

/// Encode the full task list as a JSON array
pub fn encode_tasks(tasks: &[Task]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(tasks)
}

/// Decode a JSON array of tasks, preserving order
pub fn decode_tasks(bytes: &[u8]) -> Result<Vec<Task>, serde_json::Error> {
    serde_json::from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Priority;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn sample() -> Vec<Task> {
        let mut done = Task::new("Ship release", Priority::High, "Work");
        done.is_completed = true;
        vec![
            Task::new("Buy milk", Priority::Medium, "Shopping"),
            done,
            Task::new("", Priority::Low, "Personal"),
            Task::new("Café ☕ run", Priority::Low, "Other"),
        ]
    }

    #[test]
    fn round_trip_preserves_fields_and_order() {
        let tasks = sample();
        let bytes = encode_tasks(&tasks).unwrap();
        assert_eq!(decode_tasks(&bytes).unwrap(), tasks);
    }

    #[test]
    fn round_trip_empty() {
        let bytes = encode_tasks(&[]).unwrap();
        assert_eq!(decode_tasks(&bytes).unwrap(), Vec::<Task>::new());
    }

    #[test]
    fn decodes_known_document() {
        let json = br#"[
            {
                "id": "0b9f6a3e-2c1d-4e5f-8a9b-0c1d2e3f4a5b",
                "title": "Walk the dog",
                "isCompleted": true,
                "priority": "Low",
                "category": "Health",
                "createdAt": "2025-12-16T08:30:00Z"
            }
        ]"#;
        let tasks = decode_tasks(json).unwrap();
        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        assert_eq!(
            task.id,
            Uuid::parse_str("0b9f6a3e-2c1d-4e5f-8a9b-0c1d2e3f4a5b").unwrap()
        );
        assert_eq!(task.title, "Walk the dog");
        assert!(task.is_completed);
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.category, "Health");
        assert_eq!(task.created_at, Utc.with_ymd_and_hms(2025, 12, 16, 8, 30, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_tasks(b"\x00\xffnot json").is_err());
        assert!(decode_tasks(b"{\"title\": \"not a list\"}").is_err());
        assert!(decode_tasks(br#"[{"title": "no id"}]"#).is_err());
        assert!(decode_tasks(br#"[{"id": "x", "title": "t", "createdAt": "2025-01-01T00:00:00Z"}]"#).is_err());
    }

    #[test]
    fn rejects_unknown_priority() {
        let json = br#"[{
            "id": "0b9f6a3e-2c1d-4e5f-8a9b-0c1d2e3f4a5b",
            "title": "t",
            "priority": "Urgent",
            "createdAt": "2025-12-16T08:30:00Z"
        }]"#;
        assert!(decode_tasks(json).is_err());
    }
}
