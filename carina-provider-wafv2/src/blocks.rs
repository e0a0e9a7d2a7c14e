//! Reading and building declarative blocks
//!
//! A nested block is a list of maps. Singleton blocks hold at most one map
//! and markers (`body`, `allow`, ...) hold one empty map.

use std::collections::HashMap;
use std::str::FromStr;

use carina_core::resource::Value;

use crate::expand::ExpandError;

pub(crate) type Attributes = HashMap<String, Value>;

pub(crate) fn invalid(attribute: &str, message: impl Into<String>) -> ExpandError {
    ExpandError::InvalidAttribute {
        attribute: attribute.to_string(),
        message: message.into(),
    }
}

/// Whether `key` holds a non-empty value
pub(crate) fn is_set(attrs: &Attributes, key: &str) -> bool {
    attrs.get(key).is_some_and(|v| !v.is_empty())
}

/// Blocks of a list attribute; an absent attribute has none
pub(crate) fn blocks<'a>(
    attrs: &'a Attributes,
    key: &str,
) -> Result<Vec<&'a Attributes>, ExpandError> {
    match attrs.get(key) {
        None => Ok(Vec::new()),
        Some(Value::List(items)) => items
            .iter()
            .map(|item| {
                item.as_map()
                    .ok_or_else(|| invalid(key, "expected a list of blocks"))
            })
            .collect(),
        Some(_) => Err(invalid(key, "expected a list of blocks")),
    }
}

/// First block of a singleton attribute
pub(crate) fn singleton<'a>(
    attrs: &'a Attributes,
    key: &str,
) -> Result<Option<&'a Attributes>, ExpandError> {
    Ok(blocks(attrs, key)?.into_iter().next())
}

pub(crate) fn required_string(attrs: &Attributes, key: &str) -> Result<String, ExpandError> {
    match attrs.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(invalid(key, "expected a string")),
        None => Err(invalid(key, "required attribute is missing")),
    }
}

pub(crate) fn optional_string(
    attrs: &Attributes,
    key: &str,
) -> Result<Option<String>, ExpandError> {
    match attrs.get(key) {
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(invalid(key, "expected a string")),
        None => Ok(None),
    }
}

pub(crate) fn required_int(attrs: &Attributes, key: &str) -> Result<i64, ExpandError> {
    match attrs.get(key) {
        Some(Value::Int(i)) => Ok(*i),
        Some(_) => Err(invalid(key, "expected an integer")),
        None => Err(invalid(key, "required attribute is missing")),
    }
}

pub(crate) fn required_bool(attrs: &Attributes, key: &str) -> Result<bool, ExpandError> {
    let value = attrs
        .get(key)
        .ok_or_else(|| invalid(key, "required attribute is missing"))?;
    value
        .as_bool()
        .ok_or_else(|| invalid(key, "expected a boolean"))
}

/// String attribute parsed into one of the API enums
pub(crate) fn required_enum<T>(attrs: &Attributes, key: &str) -> Result<T, ExpandError>
where
    T: FromStr<Err = String>,
{
    required_string(attrs, key)?
        .parse()
        .map_err(|message: String| invalid(key, message))
}

pub(crate) fn string_list(attrs: &Attributes, key: &str) -> Result<Vec<String>, ExpandError> {
    match attrs.get(key) {
        None => Ok(Vec::new()),
        Some(Value::List(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(key, "expected a list of strings"))
            })
            .collect(),
        Some(_) => Err(invalid(key, "expected a list of strings")),
    }
}

/// Singleton block holding `attrs`
pub(crate) fn block(attrs: Attributes) -> Value {
    Value::List(vec![Value::Map(attrs)])
}

/// Block whose presence is the value
pub(crate) fn marker() -> Value {
    block(HashMap::new())
}

/// Unset block
pub(crate) fn absent() -> Value {
    Value::List(Vec::new())
}

pub(crate) fn string(s: impl Into<String>) -> Value {
    Value::String(s.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(json: serde_json::Value) -> Attributes {
        match Value::from_json(&json) {
            Some(Value::Map(map)) => map,
            other => panic!("Expected map, got {:?}", other),
        }
    }

    #[test]
    fn singleton_reads_first_block() {
        let a = attrs(json!({"config": [{"name": "x"}], "none": []}));
        let config = singleton(&a, "config").unwrap().unwrap();
        assert_eq!(required_string(config, "name").unwrap(), "x");
        assert!(singleton(&a, "none").unwrap().is_none());
        assert!(singleton(&a, "missing").unwrap().is_none());
    }

    #[test]
    fn wrong_kinds_are_invalid_attributes() {
        let a = attrs(json!({"config": 5, "items": [1], "name": true}));
        assert!(matches!(
            singleton(&a, "config"),
            Err(ExpandError::InvalidAttribute { attribute, .. }) if attribute == "config"
        ));
        assert!(blocks(&a, "items").is_err());
        assert!(required_string(&a, "name").is_err());
        assert!(required_int(&a, "absent").is_err());
        assert!(required_bool(&a, "name").unwrap());
        assert!(matches!(
            required_bool(&a, "config"),
            Err(ExpandError::InvalidAttribute { message, .. }) if message == "expected a boolean"
        ));
    }

    #[test]
    fn markers_count_as_set() {
        let a = attrs(json!({"body": [{}], "method": []}));
        assert!(is_set(&a, "body"));
        assert!(!is_set(&a, "method"));
        assert!(!is_set(&a, "uri_path"));
        assert_eq!(a["body"], marker());
        assert_eq!(a["method"], absent());
    }

    #[test]
    fn required_enum_reports_accepted_values() {
        use crate::wire::ComparisonOperator;

        let a = attrs(json!({"op": "GT", "bad": "BIGGER"}));
        assert_eq!(
            required_enum::<ComparisonOperator>(&a, "op").unwrap(),
            ComparisonOperator::Gt
        );
        let Err(ExpandError::InvalidAttribute { message, .. }) =
            required_enum::<ComparisonOperator>(&a, "bad")
        else {
            panic!("Expected InvalidAttribute");
        };
        assert!(message.contains("EQ, GE, GT, LE, LT, NE"));
    }

    #[test]
    fn empty_description_is_unset() {
        let a = attrs(json!({"description": "", "other": "text"}));
        assert_eq!(optional_string(&a, "description").unwrap(), None);
        assert_eq!(
            optional_string(&a, "other").unwrap(),
            Some("text".to_string())
        );
    }
}
