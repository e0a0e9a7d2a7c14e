//! WAFv2-specific type definitions

use std::sync::LazyLock;

use carina_core::resource::Value;
use carina_core::schema::{AttributeType, validate_int_range, validate_string_length};
use regex::Regex;

use crate::wire::{
    ComparisonOperator, FallbackBehavior, ForwardedIpPosition, PositionalConstraint, Scope,
    TextTransformationType,
};

/// Header and query argument names; the API returns them lowercased
static LOWERCASE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]+$").expect("valid regex"));

static HEADER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9-]+$").expect("valid regex"));

static METRIC_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid regex"));

fn validate_pattern(value: &Value, pattern: &Regex, description: &str) -> Result<(), String> {
    match value {
        Value::String(s) if pattern.is_match(s) => Ok(()),
        Value::String(s) => Err(format!("'{}' must contain only {}", s, description)),
        _ => Err("Expected string".to_string()),
    }
}

fn wire_values(values: &[&str]) -> AttributeType {
    AttributeType::Enum(values.iter().map(|v| v.to_string()).collect())
}

pub fn positional_constraint() -> AttributeType {
    wire_values(PositionalConstraint::VALUES)
}

pub fn comparison_operator() -> AttributeType {
    wire_values(ComparisonOperator::VALUES)
}

pub fn text_transformation_type() -> AttributeType {
    wire_values(TextTransformationType::VALUES)
}

pub fn fallback_behavior() -> AttributeType {
    wire_values(FallbackBehavior::VALUES)
}

pub fn forwarded_ip_position() -> AttributeType {
    wire_values(ForwardedIpPosition::VALUES)
}

pub fn scope() -> AttributeType {
    wire_values(Scope::VALUES)
}

fn validate_search_string(value: &Value) -> Result<(), String> {
    validate_string_length(value, 1, 200)
}

/// Byte match search string (1-200 characters)
pub fn search_string() -> AttributeType {
    AttributeType::Custom {
        name: "SearchString".to_string(),
        base: Box::new(AttributeType::String),
        validate: validate_search_string,
    }
}

fn validate_size(value: &Value) -> Result<(), String> {
    validate_int_range(value, 0, i64::from(i32::MAX))
}

/// Size constraint in bytes (0 to 2^31-1)
pub fn size() -> AttributeType {
    AttributeType::Custom {
        name: "Size".to_string(),
        base: Box::new(AttributeType::Int),
        validate: validate_size,
    }
}

fn validate_single_header_name(value: &Value) -> Result<(), String> {
    validate_string_length(value, 1, 40)?;
    validate_pattern(
        value,
        &LOWERCASE_NAME,
        "lowercase alphanumeric characters, underscores and hyphens",
    )
}

pub fn single_header_name() -> AttributeType {
    AttributeType::Custom {
        name: "SingleHeaderName".to_string(),
        base: Box::new(AttributeType::String),
        validate: validate_single_header_name,
    }
}

fn validate_query_argument_name(value: &Value) -> Result<(), String> {
    validate_string_length(value, 1, 30)?;
    validate_pattern(
        value,
        &LOWERCASE_NAME,
        "lowercase alphanumeric characters, underscores and hyphens",
    )
}

pub fn query_argument_name() -> AttributeType {
    AttributeType::Custom {
        name: "QueryArgumentName".to_string(),
        base: Box::new(AttributeType::String),
        validate: validate_query_argument_name,
    }
}

fn validate_forwarded_header_name(value: &Value) -> Result<(), String> {
    validate_string_length(value, 1, 255)?;
    validate_pattern(value, &HEADER_NAME, "alphanumeric characters and hyphens")
}

/// Header carrying the client IP for IP set references
pub fn forwarded_header_name() -> AttributeType {
    AttributeType::Custom {
        name: "ForwardedHeaderName".to_string(),
        base: Box::new(AttributeType::String),
        validate: validate_forwarded_header_name,
    }
}

fn validate_metric_name(value: &Value) -> Result<(), String> {
    validate_string_length(value, 1, 128)?;
    validate_pattern(
        value,
        &METRIC_NAME,
        "alphanumeric characters, underscores and hyphens",
    )
}

/// CloudWatch metric name
pub fn metric_name() -> AttributeType {
    AttributeType::Custom {
        name: "MetricName".to_string(),
        base: Box::new(AttributeType::String),
        validate: validate_metric_name,
    }
}

fn validate_resource_name(value: &Value) -> Result<(), String> {
    validate_string_length(value, 1, 128)
}

/// Name of a rule or rule group
pub fn resource_name() -> AttributeType {
    AttributeType::Custom {
        name: "Name".to_string(),
        base: Box::new(AttributeType::String),
        validate: validate_resource_name,
    }
}

fn validate_description(value: &Value) -> Result<(), String> {
    validate_string_length(value, 1, 256)
}

pub fn description() -> AttributeType {
    AttributeType::Custom {
        name: "Description".to_string(),
        base: Box::new(AttributeType::String),
        validate: validate_description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(value: &str) -> Value {
        Value::String(value.to_string())
    }

    #[test]
    fn enums_accept_api_values_only() {
        assert!(positional_constraint().validate(&s("STARTS_WITH")).is_ok());
        assert!(positional_constraint().validate(&s("starts_with")).is_err());
        assert!(comparison_operator().validate(&s("GT")).is_ok());
        assert!(text_transformation_type().validate(&s("URL_DECODE")).is_ok());
        assert!(fallback_behavior().validate(&s("NO_MATCH")).is_ok());
        assert!(forwarded_ip_position().validate(&s("ANY")).is_ok());
        assert!(forwarded_ip_position().validate(&s("MIDDLE")).is_err());
        assert!(scope().validate(&s("REGIONAL")).is_ok());
    }

    #[test]
    fn search_string_length() {
        assert!(search_string().validate(&s("a")).is_ok());
        assert!(search_string().validate(&s(&"a".repeat(200))).is_ok());
        assert!(search_string().validate(&s("")).is_err());
        assert!(search_string().validate(&s(&"a".repeat(201))).is_err());
    }

    #[test]
    fn size_bounds() {
        assert!(size().validate(&Value::Int(0)).is_ok());
        assert!(size().validate(&Value::Int(2_147_483_647)).is_ok());
        assert!(size().validate(&Value::Int(2_147_483_648)).is_err());
        assert!(size().validate(&Value::Int(-1)).is_err());
    }

    #[test]
    fn single_header_name_must_be_lowercase() {
        assert!(single_header_name().validate(&s("x-api-key")).is_ok());
        assert!(single_header_name().validate(&s("user_agent")).is_ok());

        let err = single_header_name()
            .validate(&s("User-Agent"))
            .unwrap_err()
            .to_string();
        assert!(err.contains("lowercase"));

        assert!(single_header_name().validate(&s(&"a".repeat(41))).is_err());
    }

    #[test]
    fn query_argument_name_length() {
        assert!(query_argument_name().validate(&s(&"q".repeat(30))).is_ok());
        assert!(query_argument_name().validate(&s(&"q".repeat(31))).is_err());
    }

    #[test]
    fn forwarded_header_name_allows_uppercase() {
        assert!(
            forwarded_header_name()
                .validate(&s("X-Forwarded-For"))
                .is_ok()
        );
        assert!(forwarded_header_name().validate(&s("X_Forwarded")).is_err());
    }

    #[test]
    fn metric_name_pattern() {
        assert!(metric_name().validate(&s("friendly-metric_1")).is_ok());
        assert!(metric_name().validate(&s("has space")).is_err());
        assert!(metric_name().validate(&s(&"m".repeat(129))).is_err());
        assert!(metric_name().validate(&Value::Bool(true)).is_err());
    }
}
