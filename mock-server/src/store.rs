//! In-memory collections backing the mock API.
//!
//! Rows are kept as raw JSON objects so one implementation serves every
//! resource. Ids are sequential integers, except for users which get UUIDs.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

pub type Db = Arc<RwLock<HashMap<&'static str, Collection>>>;

/// Resources served under `/api/{name}`.
pub const RESOURCES: [&str; 10] = [
    "areas",
    "departments",
    "menus",
    "modules",
    "users",
    "roles",
    "courses",
    "lessons",
    "assignments",
    "attendances",
];

#[derive(Debug, Default)]
pub struct Collection {
    next_id: i64,
    rows: Vec<Value>,
}

/// String form of a scalar, as it would appear in a path or query.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn matches_keyword(row: &Value, keyword: &str) -> bool {
    let needle = keyword.to_lowercase();
    row.as_object().is_some_and(|fields| {
        fields
            .values()
            .filter_map(Value::as_str)
            .any(|text| text.to_lowercase().contains(&needle))
    })
}

/// Exact match on one field. Array fields match when any element does, and a
/// singular key also checks its plural (`role` against `roles`).
fn matches_field(row: &Value, key: &str, expected: &str) -> bool {
    let field = row.get(key).or_else(|| row.get(format!("{key}s")));
    match field {
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| scalar_text(item).as_deref() == Some(expected)),
        Some(value) => scalar_text(value).as_deref() == Some(expected),
        None => false,
    }
}

fn parse_positive(name: &str, value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("{name} must be a positive integer")),
    }
}

impl Collection {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn all(&self) -> &[Value] {
        &self.rows
    }

    pub fn find(&self, id: &str) -> Option<&Value> {
        self.rows
            .iter()
            .find(|row| row.get("id").and_then(scalar_text).as_deref() == Some(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Value> {
        self.rows
            .iter_mut()
            .find(|row| row.get("id").and_then(scalar_text).as_deref() == Some(id))
    }

    /// Assign an id and store the row; returns the stored copy.
    pub fn insert(&mut self, mut fields: Map<String, Value>, uuid_ids: bool) -> Value {
        let id = if uuid_ids {
            json!(Uuid::new_v4())
        } else {
            self.next_id += 1;
            json!(self.next_id)
        };
        fields.insert("id".to_string(), id);
        let row = Value::Object(fields);
        self.rows.push(row.clone());
        row
    }

    /// Overwrite the given fields of a row, leaving its id alone.
    pub fn merge(&mut self, id: &str, fields: Map<String, Value>) -> Option<Value> {
        let row = self.find_mut(id)?.as_object_mut()?;
        for (key, value) in fields {
            if key != "id" {
                row.insert(key, value);
            }
        }
        Some(Value::Object(row.clone()))
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.rows.len();
        self.rows
            .retain(|row| row.get("id").and_then(scalar_text).as_deref() != Some(id));
        self.rows.len() != before
    }

    /// One page of the rows matching `query`, in insertion order.
    ///
    /// `pageNumber` and `pageSize` default to 1 and 10, `keyword` is a
    /// case-insensitive substring match over text fields and every other
    /// parameter is an exact match.
    pub fn page(&self, query: &[(String, String)]) -> Result<Value, String> {
        let mut page_number = 1;
        let mut page_size = 10;
        let mut filters = Vec::new();
        for (key, value) in query {
            match key.as_str() {
                "pageNumber" => page_number = parse_positive(key, value)?,
                "pageSize" => page_size = parse_positive(key, value)?,
                _ => filters.push((key.as_str(), value.as_str())),
            }
        }

        let matching: Vec<&Value> = self
            .rows
            .iter()
            .filter(|row| {
                filters.iter().all(|(key, value)| match *key {
                    "keyword" => matches_keyword(row, value),
                    _ => matches_field(row, key, value),
                })
            })
            .collect();
        let total_count = matching.len();
        let data: Vec<Value> = matching
            .into_iter()
            .skip((page_number - 1).saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect();

        Ok(json!({
            "data": data,
            "totalCount": total_count,
            "pageNumber": page_number,
            "pageSize": page_size,
        }))
    }
}
