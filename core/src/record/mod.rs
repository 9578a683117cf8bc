//! Record store module
//!
//! The boundary with the backing record store: the query model, the
//! `RecordStore` trait and its local (file/in-memory) and remote (HTTP)
//! implementations.

use chrono::{DateTime, Utc};
use serde_json::Value;

mod file_store;
mod http_store;
mod query;
mod store;

pub use file_store::FileRecordStore;
pub use http_store::{HttpRecordStore, HttpStoreConfig};
pub use query::*;
pub use store::*;

/// Identifier assigned to a record by the store
pub type RecordId = i64;

/// A record as the store sees it: field name to JSON value
pub type Record = serde_json::Map<String, Value>;

/// Field holding the store-assigned identifier
pub const ID_FIELD: &str = "Id";
/// Creation timestamp assigned by the store
pub const CREATED_ON_FIELD: &str = "CreatedOn";
/// Modification timestamp assigned by the store
pub const MODIFIED_ON_FIELD: &str = "ModifiedOn";

/// Read a record identifier from a number, numeric string or lookup object
pub fn record_id(value: &Value) -> Option<RecordId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(map) => map.get(ID_FIELD).and_then(record_id),
        _ => None,
    }
}

/// Keep only the allow-listed fields of a record
///
/// Array values of `Tags` are joined with commas, the way the store keeps them.
pub fn pick_fields(fields: Record, allowed: &[&str]) -> Record {
    fields
        .into_iter()
        .filter(|(name, _)| allowed.contains(&name.as_str()))
        .map(|(name, value)| match (name.as_str(), value) {
            ("Tags", Value::Array(items)) => {
                let joined = items
                    .iter()
                    .filter_map(query::as_text)
                    .collect::<Vec<_>>()
                    .join(",");
                (name, Value::String(joined))
            }
            (_, value) => (name, value),
        })
        .collect()
}

/// String or numeric field rendered as text
pub fn text_field(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.as_str()?)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Tags arrive comma-joined or as an array
pub fn parse_tags(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
