use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

use super::document::{Document, DocumentList, StoreError};

/// One query expression understood by every store.
/// `Display` renders the expression string form, e.g. `equal("batch", "2025-Summer")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Equal { attribute: String, value: String },
    Search { attribute: String, value: String },
    Limit(i64),
    Offset(i64),
    OrderAsc(String),
    OrderDesc(String),
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Equal {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn search(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Search {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    fn attribute(&self) -> Option<&str> {
        match self {
            Query::Equal { attribute, .. } | Query::Search { attribute, .. } => Some(attribute),
            Query::OrderAsc(attribute) | Query::OrderDesc(attribute) => Some(attribute),
            Query::Limit(_) | Query::Offset(_) => None,
        }
    }
}

fn quoted(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Equal { attribute, value } => {
                write!(f, "equal({}, {})", quoted(attribute), quoted(value))
            }
            Query::Search { attribute, value } => {
                write!(f, "search({}, {})", quoted(attribute), quoted(value))
            }
            Query::Limit(n) => write!(f, "limit({})", n),
            Query::Offset(n) => write!(f, "offset({})", n),
            Query::OrderAsc(attribute) => write!(f, "orderAsc({})", quoted(attribute)),
            Query::OrderDesc(attribute) => write!(f, "orderDesc({})", quoted(attribute)),
        }
    }
}

fn valid_attribute(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Reject queries no store can evaluate
pub fn validate(queries: &[Query]) -> Result<(), StoreError> {
    for query in queries {
        if let Some(attribute) = query.attribute() {
            if !valid_attribute(attribute) {
                return Err(StoreError::InvalidQuery(format!(
                    "Attribute not found in schema: {}",
                    attribute
                )));
            }
        }
        match query {
            Query::Limit(n) | Query::Offset(n) if *n < 0 => {
                return Err(StoreError::InvalidQuery(format!(
                    "{} must be a non-negative integer",
                    query
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

fn equals(value: &Value, wanted: &str) -> bool {
    match value {
        Value::String(s) => s == wanted,
        Value::Array(items) => items.iter().any(|item| item.as_str() == Some(wanted)),
        _ => false,
    }
}

fn contains_ignore_case(value: &Value, needle: &str) -> bool {
    value
        .as_str()
        .map(|s| s.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

fn matches(document: &Document, query: &Query) -> bool {
    match query {
        Query::Equal { attribute, value } => document
            .attribute(attribute)
            .map(|v| equals(&v, value))
            .unwrap_or(false),
        Query::Search { attribute, value } => document
            .attribute(attribute)
            .map(|v| contains_ignore_case(&v, value))
            .unwrap_or(false),
        _ => true,
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn compare_by(a: &Document, b: &Document, attribute: &str, descending: bool) -> Ordering {
    // Missing values go last in both directions
    match (a.attribute(attribute), b.attribute(attribute)) {
        (Some(x), Some(y)) => {
            let ordering = compare_present(&x, &y);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Apply a query list to an in-process document set.
/// Filters first, then orders, then offset/limit; `total` is counted before paging.
pub fn evaluate(documents: Vec<Document>, queries: &[Query]) -> Result<DocumentList, StoreError> {
    validate(queries)?;

    let mut matched: Vec<Document> = documents
        .into_iter()
        .filter(|document| queries.iter().all(|query| matches(document, query)))
        .collect();

    let orders: Vec<(&str, bool)> = queries
        .iter()
        .filter_map(|query| match query {
            Query::OrderAsc(attribute) => Some((attribute.as_str(), false)),
            Query::OrderDesc(attribute) => Some((attribute.as_str(), true)),
            _ => None,
        })
        .collect();

    if !orders.is_empty() {
        matched.sort_by(|a, b| {
            orders
                .iter()
                .map(|(attribute, descending)| compare_by(a, b, attribute, *descending))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    let mut offset = 0usize;
    let mut limit: Option<usize> = None;
    for query in queries {
        match query {
            Query::Offset(n) => offset = usize::try_from(*n).unwrap_or(usize::MAX),
            Query::Limit(n) => limit = Some(usize::try_from(*n).unwrap_or(usize::MAX)),
            _ => {}
        }
    }

    let total = matched.len() as u64;
    let documents = matched
        .into_iter()
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    Ok(DocumentList { documents, total })
}
