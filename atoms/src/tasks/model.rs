use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Task status - the only states a task may be stored with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Open,
    Completed,
    Todo,
    Working,
    Deferred,
    Pending,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::Open,
        TaskStatus::Completed,
        TaskStatus::Todo,
        TaskStatus::Working,
        TaskStatus::Deferred,
        TaskStatus::Pending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::Completed => "completed",
            TaskStatus::Todo => "todo",
            TaskStatus::Working => "working",
            TaskStatus::Deferred => "deferred",
            TaskStatus::Pending => "pending",
        }
    }

    /// "open, completed, todo, ..." for error messages
    pub fn allowed_list() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or(())
    }
}

/// Task as embedded in an intern document.
/// Stored as one JSON string per task inside `tasksAssigned`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub assigned_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Task as it arrives in a request body. Everything is optional so that
/// validation can name the missing field instead of failing in serde.
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub assigned_at: Option<String>,
}

impl From<Task> for TaskPayload {
    fn from(task: Task) -> Self {
        Self {
            id: Some(task.id),
            title: Some(task.title),
            description: Some(task.description),
            status: Some(task.status.as_str().to_string()),
            assigned_at: Some(task.assigned_at),
        }
    }
}

/// One element of a decoded `tasksAssigned` list.
/// Elements that do not decode are handed back untouched.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum TaskEntry {
    Task(Task),
    Raw(Value),
}

impl TaskEntry {
    pub fn as_task(&self) -> Option<&Task> {
        match self {
            TaskEntry::Task(task) => Some(task),
            TaskEntry::Raw(_) => None,
        }
    }
}
