//! Query-string serialisation shared by every resource.
//!
//! A filter is serialised to a JSON object first so that `None`, `null` and
//! `""` can be dropped uniformly; the surviving scalars are then encoded with
//! `serde_html_form`. The backend reads an empty string as a literal filter
//! value, so an empty field must never reach the URL. Keys come out sorted,
//! which also makes the pairs usable as cache-key discriminators.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// Flatten `params` into `(key, value)` pairs, skipping absent and empty values.
///
/// Sequences become repeated keys. Nested objects are rejected because the
/// backend has no encoding for them.
pub fn query_pairs<T: Serialize + ?Sized>(params: &T) -> Result<Vec<(String, String)>, ApiError> {
    let value = serde_json::to_value(params).map_err(|e| ApiError::Serialization(e.to_string()))?;
    let map = match value {
        Value::Object(map) => map,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(ApiError::Serialization(format!(
                "query parameters must be a struct or map, got {other}"
            )))
        }
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = scalar(&key, item)? {
                        pairs.push((key.clone(), text));
                    }
                }
            }
            other => {
                if let Some(text) = scalar(&key, other)? {
                    pairs.push((key, text));
                }
            }
        }
    }
    Ok(pairs)
}

fn scalar(key: &str, value: Value) -> Result<Option<String>, ApiError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(_) | Value::Object(_) => Err(ApiError::Serialization(format!(
            "query parameter `{key}` is not a scalar"
        ))),
    }
}

/// Percent-encoded query string without the leading `?`; empty when nothing survives.
pub fn query_string<T: Serialize + ?Sized>(params: &T) -> Result<String, ApiError> {
    let pairs = query_pairs(params)?;
    encode_pairs(&pairs)
}

pub fn encode_pairs(pairs: &[(String, String)]) -> Result<String, ApiError> {
    serde_html_form::to_string(pairs).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// Append the serialised `params` to `path`, adding `?` only when needed.
pub fn with_query<T: Serialize + ?Sized>(path: &str, params: &T) -> Result<String, ApiError> {
    let query = query_string(params)?;
    if query.is_empty() {
        return Ok(path.to_string());
    }
    let separator = if path.contains('?') { '&' } else { '?' };
    Ok(format!("{path}{separator}{query}"))
}
