use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Number, Value};
use std::collections::HashMap;

use super::document::{Document, Fields, CREATED_AT, ID, UPDATED_AT};

pub const PK: &str = "PK";
pub const SK: &str = "SK";

/// JSON -> DynamoDB. Lists keep their order, so string arrays go to `L` rather than `SS`.
pub fn to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), to_attribute(v)))
                .collect(),
        ),
    }
}

fn number(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

/// DynamoDB -> JSON. Binary attributes have no JSON form and read as null.
pub fn from_attribute(attribute: &AttributeValue) -> Value {
    match attribute {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => number(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(items) => Value::Array(items.iter().map(from_attribute).collect()),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), from_attribute(v)))
                .collect(),
        ),
        AttributeValue::Ss(items) => {
            Value::Array(items.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(items) => Value::Array(items.iter().map(|n| number(n)).collect()),
        _ => Value::Null,
    }
}

pub fn fields_to_item(fields: &Fields) -> HashMap<String, AttributeValue> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), to_attribute(v)))
        .collect()
}

/// Rebuild a document from an item; items without `$id` are not documents
pub fn item_to_document(item: &HashMap<String, AttributeValue>) -> Option<Document> {
    let text = |key: &str| {
        item.get(key)
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
    };

    let id = text(ID)?;
    let fields = item
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), PK | SK | ID | CREATED_AT | UPDATED_AT))
        .map(|(k, v)| (k.clone(), from_attribute(v)))
        .collect();

    Some(Document {
        id,
        created_at: text(CREATED_AT).unwrap_or_default(),
        updated_at: text(UPDATED_AT).unwrap_or_default(),
        fields,
    })
}
