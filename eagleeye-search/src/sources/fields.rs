//! Missing-field-safe accessors over loosely typed JSON payloads.
//!
//! Backends return nested maps whose fields may be absent, null, or of an
//! unexpected type. Every accessor here returns `None` instead of failing.

use serde_json::Value;

/// String value of `key`, if present and a non-empty string.
pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// First non-empty string among `keys`, in order.
pub(crate) fn first_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| str_field(value, key))
}

/// Scalar value of `key` rendered as a string (strings, numbers, booleans).
pub(crate) fn scalar_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Flat display name of a person field.
///
/// Accepts a plain string, or an object carrying `name`, `login`,
/// `username` or `display_name`. Nested structure is discarded.
pub(crate) fn person_name(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        obj @ Value::Object(_) => {
            first_str(obj, &["name", "login", "username", "display_name"]).map(str::to_owned)
        }
        _ => None,
    }
}

/// Pulls the record list out of a tool or API payload.
///
/// Arrays are returned as-is; objects are searched for a well-known list
/// field (`results`, `items`, `nodes`, `issues`, `messages`, `channels`)
/// and otherwise treated as a single record.
pub(crate) fn records(payload: &Value) -> Vec<&Value> {
    match payload {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => {
            const LIST_KEYS: &[&str] = &["results", "items", "nodes", "issues", "messages", "channels"];
            LIST_KEYS
                .iter()
                .find_map(|key| payload.get(*key).and_then(Value::as_array))
                .map(|items| items.iter().collect())
                .unwrap_or_else(|| vec![payload])
        }
        _ => Vec::new(),
    }
}
