use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use super::model::{Task, TaskEntry, TaskPayload, TaskStatus};
use crate::clock::timestamp;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid task status. Must be one of: {}", TaskStatus::allowed_list())]
    InvalidStatus(String),

    #[error("Invalid request body: {0}")]
    Malformed(String),
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Check a task payload without touching it
pub fn validate(task: &TaskPayload) -> Result<TaskStatus, ValidationError> {
    if present(&task.title).is_none() {
        return Err(ValidationError::MissingField("Task title"));
    }
    let status = present(&task.status).ok_or(ValidationError::MissingField("Task status"))?;
    status
        .parse::<TaskStatus>()
        .map_err(|_| ValidationError::InvalidStatus(status.to_string()))
}

/// Read a task payload out of an arbitrary request JSON element
pub fn payload_from_value(value: &Value) -> Result<TaskPayload, ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::Malformed(
            "each task must be an object".to_string(),
        ));
    }
    serde_json::from_value(value.clone()).map_err(|e| ValidationError::Malformed(e.to_string()))
}

/// Build the canonical task record for `now`.
/// `assignedAt` survives re-encoding, `updatedAt` never does.
pub fn canonical_at(task: &TaskPayload, now: DateTime<Utc>) -> Result<Task, ValidationError> {
    let status = validate(task)?;
    let stamp = timestamp(now);

    Ok(Task {
        id: present(&task.id)
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        title: task.title.clone().unwrap_or_default(),
        description: task.description.clone().unwrap_or_default(),
        status,
        assigned_at: present(&task.assigned_at)
            .map(str::to_string)
            .unwrap_or_else(|| stamp.clone()),
        updated_at: stamp,
    })
}

pub fn encode_at(task: &TaskPayload, now: DateTime<Utc>) -> Result<String, ValidationError> {
    let canonical = canonical_at(task, now)?;
    serde_json::to_string(&canonical).map_err(|e| ValidationError::Malformed(e.to_string()))
}

pub fn encode(task: &TaskPayload) -> Result<String, ValidationError> {
    encode_at(task, Utc::now())
}

/// Encode a whole `tasksAssigned` list. One bad task fails the lot.
pub fn encode_all(tasks: &[Value]) -> Result<Vec<String>, ValidationError> {
    let now = Utc::now();
    tasks
        .iter()
        .map(|value| payload_from_value(value).and_then(|payload| encode_at(&payload, now)))
        .collect()
}

/// Decode one stored task string. JSON that is not a valid task comes back
/// parsed but unchecked; only text that is not JSON is handed back as is.
pub fn decode(raw: &str) -> TaskEntry {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => match serde_json::from_value::<Task>(value.clone()) {
            Ok(task) => TaskEntry::Task(task),
            Err(_) => TaskEntry::Raw(value),
        },
        Err(_) => TaskEntry::Raw(Value::String(raw.to_string())),
    }
}

/// Decode one element of a stored list, whatever its JSON type
pub fn decode_value(value: &Value) -> TaskEntry {
    match value {
        Value::String(raw) => decode(raw),
        Value::Object(_) => match serde_json::from_value::<Task>(value.clone()) {
            Ok(task) => TaskEntry::Task(task),
            Err(_) => TaskEntry::Raw(value.clone()),
        },
        other => TaskEntry::Raw(other.clone()),
    }
}

/// Decode a document's whole `tasksAssigned` field.
/// Nothing is dropped: every stored element yields exactly one entry.
pub fn decode_list(value: Option<&Value>) -> Vec<TaskEntry> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(decode_value).collect(),
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => items.iter().map(decode_value).collect(),
            _ => vec![TaskEntry::Raw(Value::String(raw.clone()))],
        },
        Some(other) => vec![TaskEntry::Raw(other.clone())],
    }
}
