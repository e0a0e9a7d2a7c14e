//! Normalization of declarative trees
//!
//! Two trees describing the same rule group can differ in ways the API does
//! not preserve. `normalize` removes those differences:
//!
//! - entries holding an empty block list are dropped (unset and empty are
//!   the same)
//! - `text_transformation` entries are sorted by priority, then type
//! - `single_header` and `single_query_argument` names are lowercased

use std::collections::HashMap;

use carina_core::resource::Value;

/// Return the canonical form of a declarative tree
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::Map(map) => Value::Map(
            map.iter()
                .filter(|(_, v)| !matches!(v, Value::List(items) if items.is_empty()))
                .map(|(k, v)| (k.clone(), normalize_attribute(k, v)))
                .collect::<HashMap<_, _>>(),
        ),
        Value::List(items) => Value::List(items.iter().map(normalize).collect()),
        other => other.clone(),
    }
}

/// Whether two trees describe the same configuration
pub fn equivalent(a: &Value, b: &Value) -> bool {
    normalize(a) == normalize(b)
}

fn normalize_attribute(key: &str, value: &Value) -> Value {
    match (key, normalize(value)) {
        ("text_transformation", Value::List(mut items)) => {
            items.sort_by_key(transformation_order);
            Value::List(items)
        }
        ("single_header" | "single_query_argument", Value::List(items)) => {
            Value::List(items.into_iter().map(lowercase_name).collect())
        }
        (_, normalized) => normalized,
    }
}

fn transformation_order(item: &Value) -> (i64, String) {
    let map = item.as_map();
    let priority = map
        .and_then(|m| m.get("priority"))
        .and_then(Value::as_int)
        .unwrap_or_default();
    let kind = map
        .and_then(|m| m.get("type"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    (priority, kind.to_string())
}

fn lowercase_name(item: Value) -> Value {
    match item {
        Value::Map(mut map) => {
            if let Some(Value::String(name)) = map.get_mut("name") {
                *name = name.to_lowercase();
            }
            Value::Map(map)
        }
        other => other,
    }
}
