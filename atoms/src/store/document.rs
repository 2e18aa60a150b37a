use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use thiserror::Error;

/// Document attributes as the store sees them - loosely typed on purpose,
/// older documents do not share the current shape
pub type Fields = Map<String, Value>;

pub const ID: &str = "$id";
pub const CREATED_AT: &str = "$createdAt";
pub const UPDATED_AT: &str = "$updatedAt";

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: String,
    #[serde(rename = "$updatedAt")]
    pub updated_at: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    /// Look up an attribute by name, metadata included
    pub fn attribute(&self, name: &str) -> Option<Cow<'_, Value>> {
        match name {
            ID => Some(Cow::Owned(Value::String(self.id.clone()))),
            CREATED_AT => Some(Cow::Owned(Value::String(self.created_at.clone()))),
            UPDATED_AT => Some(Cow::Owned(Value::String(self.updated_at.clone()))),
            _ => self.fields.get(name).map(Cow::Borrowed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentList {
    pub documents: Vec<Document>,
    /// Size of the full match set, before offset/limit
    pub total: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Document with the requested ID could not be found.")]
    NotFound { id: String },

    #[error("Document with the requested ID already exists.")]
    Conflict { id: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Store request timed out after {0}ms")]
    Timeout(u64),

    #[error("{0}")]
    Backend(String),
}
