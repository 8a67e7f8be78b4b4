//! Structural merge of handler output trees.
//!
//! `base` is authoritative: `incoming` only fills gaps and refines fields
//! with non-empty values. Name-server lists are never merged, so the first
//! authority's record order survives.

use serde_json::{Map, Value};

/// Keys holding name-server lists. Never merged once present in `base`.
const NAME_SERVER_KEYS: [&str; 2] = ["nserver", "nameServer"];

/// Merges `incoming` into `base` and returns the result.
///
/// ```
/// use serde_json::json;
/// use whois_client::merge;
///
/// let base = json!({ "domain": { "name": "example.com", "status": "" } });
/// let incoming = json!({ "domain": { "name": " ", "status": "active" } });
///
/// let merged = merge(
///     base.as_object().unwrap().clone(),
///     incoming.as_object().unwrap().clone(),
/// );
/// assert_eq!(merged["domain"]["name"], "example.com");
/// assert_eq!(merged["domain"]["status"], "active");
/// ```
#[must_use]
pub fn merge(mut base: Map<String, Value>, incoming: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in incoming {
        match base.get_mut(&key) {
            None => {
                base.insert(key, value);
            }
            Some(existing) => {
                if is_nested(&value) && NAME_SERVER_KEYS.contains(&key.as_str()) {
                    continue;
                }
                merge_value(existing, value);
            }
        }
    }
    base
}

fn merge_value(base: &mut Value, incoming: Value) {
    match (base, incoming) {
        (Value::Object(b), Value::Object(i)) => {
            *b = merge(std::mem::take(b), i);
        }
        (Value::Array(b), Value::Array(i)) => merge_positional(b, i),
        // Shape mismatch: only an empty base gives way.
        (b, i) if is_nested(&i) => {
            if is_empty_scalar(b) {
                *b = i;
            }
        }
        (b, i) => {
            if let Some(refined) = refine_scalar(i) {
                if !same_text(b, &refined) {
                    *b = refined;
                }
            }
        }
    }
}

/// A base string equal to the refined value up to whitespace stays as is.
fn same_text(base: &Value, refined: &Value) -> bool {
    matches!((base, refined), (Value::String(b), Value::String(r)) if b.trim() == r)
}

fn merge_positional(base: &mut Vec<Value>, incoming: Vec<Value>) {
    for (n, value) in incoming.into_iter().enumerate() {
        if n < base.len() {
            merge_value(&mut base[n], value);
        } else {
            base.push(value);
        }
    }
}

/// Trims string scalars; `None` when the value must not overwrite.
fn refine_scalar(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(Value::String(trimmed.to_string()))
            }
        }
        other => Some(other),
    }
}

const fn is_nested(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn is_empty_scalar(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
