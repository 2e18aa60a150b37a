use serde::Serialize;
use serde_json::Value;

use super::model::TaskStatus;
use crate::store::{Document, DocumentStore, Fields, StoreError};

pub const TASKS_FIELD: &str = "tasksAssigned";

/// Per-status task counts across every intern
#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSummary {
    pub open: u64,
    pub completed: u64,
    pub todo: u64,
    pub working: u64,
    pub deferred: u64,
    pub pending: u64,
    pub total: u64,
}

impl TaskSummary {
    pub fn record(&mut self, status: TaskStatus) {
        let slot = match status {
            TaskStatus::Open => &mut self.open,
            TaskStatus::Completed => &mut self.completed,
            TaskStatus::Todo => &mut self.todo,
            TaskStatus::Working => &mut self.working,
            TaskStatus::Deferred => &mut self.deferred,
            TaskStatus::Pending => &mut self.pending,
        };
        *slot += 1;
        self.total += 1;
    }

    pub fn count(&self, status: TaskStatus) -> u64 {
        match status {
            TaskStatus::Open => self.open,
            TaskStatus::Completed => self.completed,
            TaskStatus::Todo => self.todo,
            TaskStatus::Working => self.working,
            TaskStatus::Deferred => self.deferred,
            TaskStatus::Pending => self.pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Stored text that is not JSON, or JSON that is not a task object
    Undecodable,
    MissingStatus,
    UnknownStatus,
    /// The list itself has a shape no version of the service ever wrote
    UnsupportedShape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallyOutcome {
    Counted(TaskStatus),
    Skipped(SkipReason),
}

/// How a document's `tasksAssigned` happens to be stored.
/// Every encoding the service has used is still out there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskListShape<'a> {
    Missing,
    /// Oldest: the whole array as one JSON string
    RawString(&'a str),
    /// Array of task objects
    ArrayOfObjects(&'a [Value]),
    /// Array of per-task JSON strings (what is written today)
    ArrayOfStrings(&'a [Value]),
    Mixed(&'a [Value]),
    Unrecognized,
}

impl<'a> TaskListShape<'a> {
    pub fn classify(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => TaskListShape::Missing,
            Some(Value::String(raw)) => TaskListShape::RawString(raw),
            Some(Value::Array(items)) if items.iter().all(Value::is_object) => {
                TaskListShape::ArrayOfObjects(items)
            }
            Some(Value::Array(items)) if items.iter().all(Value::is_string) => {
                TaskListShape::ArrayOfStrings(items)
            }
            Some(Value::Array(items)) => TaskListShape::Mixed(items),
            Some(_) => TaskListShape::Unrecognized,
        }
    }

    pub fn tallies(&self) -> Vec<TallyOutcome> {
        match self {
            TaskListShape::Missing => Vec::new(),
            TaskListShape::RawString(raw) => tally_encoded_list(raw),
            TaskListShape::ArrayOfObjects(items) => items.iter().map(tally_object).collect(),
            TaskListShape::ArrayOfStrings(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(tally_encoded)
                        .unwrap_or(TallyOutcome::Skipped(SkipReason::Undecodable))
                })
                .collect(),
            TaskListShape::Mixed(items) => items.iter().map(tally_element).collect(),
            TaskListShape::Unrecognized => {
                vec![TallyOutcome::Skipped(SkipReason::UnsupportedShape)]
            }
        }
    }
}

fn tally_object(task: &Value) -> TallyOutcome {
    match task.get("status") {
        None | Some(Value::Null) => TallyOutcome::Skipped(SkipReason::MissingStatus),
        Some(Value::String(s)) if s.is_empty() => TallyOutcome::Skipped(SkipReason::MissingStatus),
        Some(Value::String(s)) => s
            .parse::<TaskStatus>()
            .map(TallyOutcome::Counted)
            .unwrap_or(TallyOutcome::Skipped(SkipReason::UnknownStatus)),
        Some(_) => TallyOutcome::Skipped(SkipReason::UnknownStatus),
    }
}

fn tally_encoded(raw: &str) -> TallyOutcome {
    match serde_json::from_str::<Value>(raw) {
        Ok(task @ Value::Object(_)) => tally_object(&task),
        _ => TallyOutcome::Skipped(SkipReason::Undecodable),
    }
}

fn tally_element(item: &Value) -> TallyOutcome {
    match item {
        Value::Object(_) => tally_object(item),
        Value::String(raw) => tally_encoded(raw),
        _ => TallyOutcome::Skipped(SkipReason::Undecodable),
    }
}

fn tally_encoded_list(raw: &str) -> Vec<TallyOutcome> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items.iter().map(tally_element).collect(),
        Ok(_) => vec![TallyOutcome::Skipped(SkipReason::UnsupportedShape)],
        Err(_) => vec![TallyOutcome::Skipped(SkipReason::Undecodable)],
    }
}

pub fn tally_fields(fields: &Fields) -> Vec<TallyOutcome> {
    TaskListShape::classify(fields.get(TASKS_FIELD)).tallies()
}

pub fn tally_document(document: &Document) -> Vec<TallyOutcome> {
    tally_fields(&document.fields)
}

/// Fold documents into a summary; also returns how many tasks were skipped
pub fn tally_documents(documents: &[Document]) -> (TaskSummary, usize) {
    let mut summary = TaskSummary::default();
    let mut skipped = 0;

    for outcome in documents.iter().flat_map(tally_document) {
        match outcome {
            TallyOutcome::Counted(status) => summary.record(status),
            TallyOutcome::Skipped(_) => skipped += 1,
        }
    }

    (summary, skipped)
}

/// Scan every intern (unpaginated) and count tasks per status
pub async fn summarize(store: &dyn DocumentStore) -> Result<TaskSummary, StoreError> {
    let list = store.list_documents(&[]).await.inspect_err(|e| {
        tracing::error!("Failed to load interns for task summary: {}", e);
    })?;

    let (summary, skipped) = tally_documents(&list.documents);
    if skipped > 0 {
        tracing::debug!(
            "Task summary skipped {} unreadable tasks across {} interns",
            skipped,
            list.documents.len()
        );
    }

    Ok(summary)
}
