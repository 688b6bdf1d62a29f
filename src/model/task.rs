use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type TaskId = u64;
pub type SubtaskId = u64;

/// A top-level task with its ordered subtasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// When the task was added. Older snapshots call this `timestamp`.
    #[serde(default, alias = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Day the task was last completed; `None` while open
    #[serde(default)]
    pub completion_date: Option<NaiveDate>,
}

/// A subtask. Ids are unique across all tasks, not just within the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: SubtaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completion_date: Option<NaiveDate>,
}

impl Task {
    pub fn new(id: TaskId, text: String, created_at: DateTime<Utc>) -> Self {
        Task {
            id,
            text,
            completed: false,
            subtasks: Vec::new(),
            created_at,
            completion_date: None,
        }
    }

    pub fn subtask(&self, id: SubtaskId) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == id)
    }

    pub fn subtask_mut(&mut self, id: SubtaskId) -> Option<&mut Subtask> {
        self.subtasks.iter_mut().find(|s| s.id == id)
    }

    /// Number of subtasks currently marked completed
    pub fn completed_subtasks(&self) -> usize {
        self.subtasks.iter().filter(|s| s.completed).count()
    }

    /// Set completion state, keeping `completion_date` in step with `completed`
    pub fn set_completed(&mut self, completed: bool, today: NaiveDate) {
        self.completed = completed;
        self.completion_date = completed.then_some(today);
    }
}

impl Subtask {
    pub fn new(id: SubtaskId, text: String) -> Self {
        Subtask {
            id,
            text,
            completed: false,
            completion_date: None,
        }
    }

    pub fn set_completed(&mut self, completed: bool, today: NaiveDate) {
        self.completed = completed;
        self.completion_date = completed.then_some(today);
    }
}

/// Task list filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !task.completed,
            TaskFilter::Completed => task.completed,
        }
    }

    /// Parse a filter name
    pub fn parse(s: &str) -> Result<TaskFilter, String> {
        match s {
            "all" => Ok(TaskFilter::All),
            "active" => Ok(TaskFilter::Active),
            "completed" | "done" => Ok(TaskFilter::Completed),
            _ => Err(format!(
                "unknown filter '{}' (expected: all, active, completed)",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn set_completed_tracks_date() {
        let mut task = Task::new(1, "Buy milk".into(), Utc::now());
        task.set_completed(true, day("2025-03-04"));
        assert!(task.completed);
        assert_eq!(task.completion_date, Some(day("2025-03-04")));
        task.set_completed(false, day("2025-03-05"));
        assert!(!task.completed);
        assert_eq!(task.completion_date, None);
    }

    #[test]
    fn deserialize_legacy_snapshot() {
        let json = r#"{
            "id": 3,
            "text": "Write report",
            "completed": true,
            "subtasks": [{"id": 7, "text": "Outline", "completed": true, "completionDate": "2025-01-02"}],
            "timestamp": "2025-01-01T10:00:00.000Z",
            "completionDate": "2025-01-02"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, 3);
        assert_eq!(task.completion_date, Some(day("2025-01-02")));
        assert_eq!(task.subtasks[0].completion_date, Some(day("2025-01-02")));
        assert_eq!(task.created_at.to_rfc3339(), "2025-01-01T10:00:00+00:00");
    }

    #[test]
    fn serde_defaults_on_minimal_object() {
        let task: Task = serde_json::from_str(r#"{"id": 1, "text": "x"}"#).unwrap();
        assert!(!task.completed);
        assert!(task.subtasks.is_empty());
        assert!(task.completion_date.is_none());
    }

    #[test]
    fn filter_parse_and_match() {
        let mut task = Task::new(1, "x".into(), Utc::now());
        assert!(TaskFilter::Active.matches(&task));
        assert!(!TaskFilter::Completed.matches(&task));
        task.set_completed(true, day("2025-01-01"));
        assert!(TaskFilter::Completed.matches(&task));
        assert!(TaskFilter::All.matches(&task));
        assert_eq!(TaskFilter::parse("done"), Ok(TaskFilter::Completed));
        assert!(TaskFilter::parse("blocked").is_err());
    }
}
