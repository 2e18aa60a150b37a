use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{Document, Fields};
use crate::tasks::codec::decode_list;
use crate::tasks::summary::TASKS_FIELD;
use crate::tasks::TaskEntry;

pub const INTERN_NAME: &str = "internName";
pub const BATCH: &str = "batch";
pub const ROLES: &str = "roles";
pub const CURRENT_PROJECTS: &str = "currentProjects";

/// Intern domain model - one document per intern, tasks embedded
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Intern {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: String,
    #[serde(rename = "$updatedAt")]
    pub updated_at: String,

    pub intern_name: String,
    pub batch: String,
    pub roles: Vec<String>,
    pub current_projects: Vec<String>,

    /// Decoded from the stored strings; undecodable entries come back raw
    pub tasks_assigned: Vec<TaskEntry>,
}

fn text(fields: &Fields, key: &str) -> String {
    fields
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_default()
}

fn text_list(fields: &Fields, key: &str) -> Vec<String> {
    fields
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

impl From<Document> for Intern {
    fn from(document: Document) -> Self {
        let fields = &document.fields;
        Intern {
            intern_name: text(fields, INTERN_NAME),
            batch: text(fields, BATCH),
            roles: text_list(fields, ROLES),
            current_projects: text_list(fields, CURRENT_PROJECTS),
            tasks_assigned: decode_list(fields.get(TASKS_FIELD)),
            id: document.id,
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInternPayload {
    /// Caller-chosen document id
    pub document_id: Option<String>,
    pub intern_name: Option<String>,
    pub batch: Option<String>,
    pub roles: Option<Vec<String>>,
    pub current_projects: Option<Vec<String>>,
    pub tasks_assigned: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInternPayload {
    pub intern_name: Option<String>,
    pub batch: Option<String>,
    pub roles: Option<Vec<String>>,
    pub current_projects: Option<Vec<String>>,
    /// Replaces the whole task list when present
    pub tasks_assigned: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InternPage {
    pub interns: Vec<Intern>,
    /// Full match count, independent of limit/offset
    pub total: u64,
}
