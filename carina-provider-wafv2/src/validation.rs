//! Validation of declarative WAFv2 configuration
//!
//! Schema errors nest one level per attribute, list item and map value.
//! This module flattens them into a path such as
//! `rule[0].statement[0].and_statement[0]` and the message of the
//! innermost error.

use std::collections::HashMap;

use carina_core::resource::Value;
use carina_core::schema::{BlockSchema, TypeError};

use crate::config::Wafv2Config;
use crate::schemas::wafv2::{root_statement_schema, rule_group_schema, rule_schema};

/// Validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result type for validation
pub type ValidationResult = Result<(), Vec<ValidationError>>;

impl From<&TypeError> for ValidationError {
    fn from(error: &TypeError) -> Self {
        let mut path = String::new();
        let mut current = error;
        loop {
            match current {
                TypeError::AttributeError { name, inner } => {
                    if !path.is_empty() {
                        path.push('.');
                    }
                    path.push_str(name);
                    current = &**inner;
                }
                TypeError::ListItemError { index, inner } => {
                    path.push_str(&format!("[{}]", index));
                    current = &**inner;
                }
                TypeError::MapValueError { key, inner } => {
                    path.push_str(&format!("[{:?}]", key));
                    current = &**inner;
                }
                leaf => {
                    return ValidationError {
                        path,
                        message: leaf.to_string(),
                    };
                }
            }
        }
    }
}

fn collect(result: Result<(), Vec<TypeError>>) -> ValidationResult {
    result.map_err(|errors| errors.iter().map(ValidationError::from).collect())
}

/// Validate the attributes of a `wafv2.rule_group`
pub fn validate_rule_group(
    attributes: &HashMap<String, Value>,
    config: &Wafv2Config,
) -> ValidationResult {
    collect(rule_group_schema(config.max_nesting_level).validate(attributes))
}

/// Validate one rule block
pub fn validate_rule(
    attributes: &HashMap<String, Value>,
    config: &Wafv2Config,
) -> ValidationResult {
    collect(rule_schema(config.max_nesting_level).validate(attributes))
}

/// Validate one statement node, nested at most `max_nesting_level` deep
pub fn validate_statement(
    statement: &HashMap<String, Value>,
    config: &Wafv2Config,
) -> ValidationResult {
    let wrapper = BlockSchema::new().attribute(root_statement_schema(config.max_nesting_level));
    let attributes = HashMap::from([(
        "statement".to_string(),
        Value::List(vec![Value::Map(statement.clone())]),
    )]);
    collect(wrapper.validate(&attributes))
}

/// Validate a resource based on its type
pub fn validate_resource(
    resource_type: &str,
    attributes: &HashMap<String, Value>,
    config: &Wafv2Config,
) -> ValidationResult {
    match resource_type {
        "wafv2.rule_group" => validate_rule_group(attributes, config),
        "wafv2.rule" => validate_rule(attributes, config),
        _ => Ok(()), // Unknown types pass validation (for extensibility)
    }
}
