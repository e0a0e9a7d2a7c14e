//! WAFv2 rule group schema definitions
//!
//! Every nested structure is a list of blocks capped at one item, and every
//! statement body is a one-of block: exactly one statement kind must be
//! populated per node. Combinational statements (`and`, `or`, `not`) nest
//! a fresh statement body one level down; at the last level only the seven
//! leaf kinds remain, so deeper trees are rejected as unknown attributes.

use carina_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};

use super::types as wafv2_types;

/// Statement kinds in the order the expander examines them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    And,
    ByteMatch,
    GeoMatch,
    IpSetReference,
    Not,
    Or,
    RegexPatternSetReference,
    SizeConstraint,
    SqliMatch,
    XssMatch,
}

impl StatementKind {
    pub const ALL: [StatementKind; 10] = [
        StatementKind::And,
        StatementKind::ByteMatch,
        StatementKind::GeoMatch,
        StatementKind::IpSetReference,
        StatementKind::Not,
        StatementKind::Or,
        StatementKind::RegexPatternSetReference,
        StatementKind::SizeConstraint,
        StatementKind::SqliMatch,
        StatementKind::XssMatch,
    ];

    /// Attribute name of this kind inside a statement block
    pub fn key(&self) -> &'static str {
        match self {
            StatementKind::And => "and_statement",
            StatementKind::ByteMatch => "byte_match_statement",
            StatementKind::GeoMatch => "geo_match_statement",
            StatementKind::IpSetReference => "ip_set_reference_statement",
            StatementKind::Not => "not_statement",
            StatementKind::Or => "or_statement",
            StatementKind::RegexPatternSetReference => "regex_pattern_set_reference_statement",
            StatementKind::SizeConstraint => "size_constraint_statement",
            StatementKind::SqliMatch => "sqli_match_statement",
            StatementKind::XssMatch => "xss_match_statement",
        }
    }

    /// Whether the kind nests other statements
    pub fn is_combinational(&self) -> bool {
        matches!(
            self,
            StatementKind::And | StatementKind::Not | StatementKind::Or
        )
    }
}

/// Request components a statement can inspect, in precedence order
pub const FIELD_TO_MATCH_KEYS: [&str; 7] = [
    "all_query_arguments",
    "body",
    "method",
    "query_string",
    "single_header",
    "single_query_argument",
    "uri_path",
];

pub const RULE_ACTION_KEYS: [&str; 3] = ["allow", "block", "count"];

fn block_list(block: BlockSchema) -> AttributeType {
    AttributeType::List(Box::new(AttributeType::Block(Box::new(block))))
}

/// Optional block that may appear at most once
fn singleton(name: &str, block: BlockSchema) -> AttributeSchema {
    AttributeSchema::new(name, block_list(block)).with_max_items(1)
}

/// Block without attributes whose presence is the value
fn marker(name: &str) -> AttributeSchema {
    singleton(name, BlockSchema::new())
}

/// Top-level statement of a rule
///
/// Combinational statements nest [`statement_schema`] at `level - 1`.
pub fn root_statement_schema(level: usize) -> AttributeSchema {
    AttributeSchema::new(
        "statement",
        block_list(statement_body(Some(level.saturating_sub(1)))),
    )
    .required()
    .with_max_items(1)
    .with_description("The AWS WAF processing statement for the rule.")
}

/// Combinational statement holding a list of nested statements
///
/// Above level 1 the nested statements may combine further; at level 1 and
/// below only the seven leaf kinds are declared.
pub fn statement_schema(name: &str, level: usize) -> AttributeSchema {
    singleton(
        name,
        BlockSchema::new().attribute(
            AttributeSchema::new("statement", block_list(nested_body(level))).required(),
        ),
    )
}

fn not_statement_schema(level: usize) -> AttributeSchema {
    singleton(
        StatementKind::Not.key(),
        BlockSchema::new().attribute(
            AttributeSchema::new("statement", block_list(nested_body(level)))
                .required()
                .with_max_items(1),
        ),
    )
}

fn nested_body(level: usize) -> BlockSchema {
    if level > 1 {
        statement_body(Some(level - 1))
    } else {
        statement_body(None)
    }
}

/// Statement body; `nested_level` enables combinational kinds
fn statement_body(nested_level: Option<usize>) -> BlockSchema {
    StatementKind::ALL
        .into_iter()
        .filter(|kind| nested_level.is_some() || !kind.is_combinational())
        .fold(BlockSchema::new().exactly_one(), |body, kind| {
            body.attribute(statement_kind_schema(kind, nested_level.unwrap_or_default()))
        })
}

fn statement_kind_schema(kind: StatementKind, level: usize) -> AttributeSchema {
    match kind {
        StatementKind::And | StatementKind::Or => statement_schema(kind.key(), level),
        StatementKind::Not => not_statement_schema(level),
        StatementKind::ByteMatch => byte_match_statement_schema(),
        StatementKind::GeoMatch => geo_match_statement_schema(),
        StatementKind::IpSetReference => ip_set_reference_statement_schema(),
        StatementKind::RegexPatternSetReference => regex_pattern_set_reference_statement_schema(),
        StatementKind::SizeConstraint => size_constraint_statement_schema(),
        StatementKind::SqliMatch => sqli_match_statement_schema(),
        StatementKind::XssMatch => xss_match_statement_schema(),
    }
}

fn byte_match_statement_schema() -> AttributeSchema {
    singleton(
        StatementKind::ByteMatch.key(),
        BlockSchema::new()
            .attribute(field_to_match_schema())
            .attribute(
                AttributeSchema::new("positional_constraint", wafv2_types::positional_constraint())
                    .required(),
            )
            .attribute(
                AttributeSchema::new("search_string", wafv2_types::search_string()).required(),
            )
            .attribute(text_transformation_schema()),
    )
}

fn geo_match_statement_schema() -> AttributeSchema {
    singleton(
        StatementKind::GeoMatch.key(),
        BlockSchema::new()
            .attribute(
                AttributeSchema::new(
                    "country_codes",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .required()
                .with_min_items(1),
            )
            .attribute(forwarded_ip_config_schema()),
    )
}

fn ip_set_reference_statement_schema() -> AttributeSchema {
    singleton(
        StatementKind::IpSetReference.key(),
        BlockSchema::new()
            .attribute(AttributeSchema::new("arn", AttributeType::String).required())
            .attribute(ip_set_forwarded_ip_config_schema()),
    )
}

fn regex_pattern_set_reference_statement_schema() -> AttributeSchema {
    singleton(
        StatementKind::RegexPatternSetReference.key(),
        BlockSchema::new()
            .attribute(AttributeSchema::new("arn", AttributeType::String).required())
            .attribute(field_to_match_schema())
            .attribute(text_transformation_schema()),
    )
}

fn size_constraint_statement_schema() -> AttributeSchema {
    singleton(
        StatementKind::SizeConstraint.key(),
        BlockSchema::new()
            .attribute(
                AttributeSchema::new("comparison_operator", wafv2_types::comparison_operator())
                    .required(),
            )
            .attribute(field_to_match_schema())
            .attribute(AttributeSchema::new("size", wafv2_types::size()).required())
            .attribute(text_transformation_schema()),
    )
}

fn sqli_match_statement_schema() -> AttributeSchema {
    singleton(
        StatementKind::SqliMatch.key(),
        BlockSchema::new()
            .attribute(field_to_match_schema())
            .attribute(text_transformation_schema()),
    )
}

fn xss_match_statement_schema() -> AttributeSchema {
    singleton(
        StatementKind::XssMatch.key(),
        BlockSchema::new()
            .attribute(field_to_match_schema())
            .attribute(text_transformation_schema()),
    )
}

/// Part of the request to inspect; one of seven components
pub fn field_to_match_schema() -> AttributeSchema {
    singleton(
        "field_to_match",
        BlockSchema::new()
            .attribute(marker("all_query_arguments"))
            .attribute(marker("body"))
            .attribute(marker("method"))
            .attribute(marker("query_string"))
            .attribute(singleton(
                "single_header",
                BlockSchema::new().attribute(
                    AttributeSchema::new("name", wafv2_types::single_header_name()).required(),
                ),
            ))
            .attribute(singleton(
                "single_query_argument",
                BlockSchema::new().attribute(
                    AttributeSchema::new("name", wafv2_types::query_argument_name()).required(),
                ),
            ))
            .attribute(marker("uri_path"))
            .exclusive(),
    )
}

fn forwarded_ip_config_schema() -> AttributeSchema {
    singleton(
        "forwarded_ip_config",
        BlockSchema::new()
            .attribute(
                AttributeSchema::new("fallback_behavior", wafv2_types::fallback_behavior())
                    .required(),
            )
            .attribute(AttributeSchema::new("header_name", AttributeType::String).required()),
    )
}

fn ip_set_forwarded_ip_config_schema() -> AttributeSchema {
    singleton(
        "ip_set_forwarded_ip_config",
        BlockSchema::new()
            .attribute(
                AttributeSchema::new("fallback_behavior", wafv2_types::fallback_behavior())
                    .required(),
            )
            .attribute(
                AttributeSchema::new("header_name", wafv2_types::forwarded_header_name())
                    .required(),
            )
            .attribute(
                AttributeSchema::new("position", wafv2_types::forwarded_ip_position()).required(),
            ),
    )
}

/// Transformations applied before inspection; ordered by `priority`, not position
pub fn text_transformation_schema() -> AttributeSchema {
    AttributeSchema::new(
        "text_transformation",
        AttributeType::Set(Box::new(AttributeType::Block(Box::new(
            BlockSchema::new()
                .attribute(AttributeSchema::new("priority", AttributeType::Int).required())
                .attribute(
                    AttributeSchema::new("type", wafv2_types::text_transformation_type())
                        .required(),
                ),
        )))),
    )
    .required()
}

pub fn visibility_config_schema() -> AttributeSchema {
    singleton(
        "visibility_config",
        BlockSchema::new()
            .attribute(
                AttributeSchema::new("cloudwatch_metrics_enabled", AttributeType::Bool).required(),
            )
            .attribute(AttributeSchema::new("metric_name", wafv2_types::metric_name()).required())
            .attribute(
                AttributeSchema::new("sampled_requests_enabled", AttributeType::Bool).required(),
            ),
    )
    .required()
    .with_description("Defines and enables Amazon CloudWatch metrics and web request sample collection.")
}

/// Action taken on a matching request: allow, block or count
pub fn rule_action_schema() -> AttributeSchema {
    let mut block = BlockSchema::new();
    for key in RULE_ACTION_KEYS {
        block = block.attribute(marker(key));
    }
    singleton("action", block.exactly_one()).required()
}

/// Block of a single rule with statements nested `level` deep
pub fn rule_schema(level: usize) -> BlockSchema {
    BlockSchema::new()
        .attribute(rule_action_schema())
        .attribute(AttributeSchema::new("name", wafv2_types::resource_name()).required())
        .attribute(AttributeSchema::new("priority", AttributeType::Int).required())
        .attribute(root_statement_schema(level))
        .attribute(visibility_config_schema())
}

/// Returns the schema for wafv2.rule_group (AWS::WAFv2::RuleGroup)
pub fn rule_group_schema(level: usize) -> ResourceSchema {
    ResourceSchema::new("wafv2.rule_group")
        .with_description("Collection of rules for inspecting web requests, referenced by web ACLs as a single rule.")
        .attribute(
            AttributeSchema::new("name", wafv2_types::resource_name())
                .required()
                .with_description("The name of the rule group. Cannot be changed after creation."),
        )
        .attribute(
            AttributeSchema::new("description", wafv2_types::description())
                .with_description("A description of the rule group."),
        )
        .attribute(
            AttributeSchema::new("scope", wafv2_types::scope())
                .required()
                .with_description("Whether this is for a CloudFront distribution or a regional application."),
        )
        .attribute(
            AttributeSchema::new("capacity", types::positive_int())
                .required()
                .with_description("The web ACL capacity units (WCUs) required for this rule group."),
        )
        .attribute(
            AttributeSchema::new(
                "rule",
                AttributeType::Set(Box::new(AttributeType::Block(Box::new(rule_schema(level))))),
            )
            .with_description("The rules of the rule group, evaluated by priority."),
        )
        .attribute(visibility_config_schema())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use carina_core::resource::Value;
    use carina_core::schema::TypeError;
    use serde_json::json;

    use super::*;

    fn attrs(json: serde_json::Value) -> HashMap<String, Value> {
        match Value::from_json(&json) {
            Some(Value::Map(map)) => map,
            other => panic!("Expected map, got {:?}", other),
        }
    }

    fn geo() -> serde_json::Value {
        json!({"geo_match_statement": [{"country_codes": ["US"]}]})
    }

    /// Statement nested `depth` levels deep through and_statement
    fn nested(depth: usize) -> serde_json::Value {
        let mut statement = geo();
        for _ in 1..depth {
            statement = json!({"and_statement": [{"statement": [statement]}]});
        }
        statement
    }

    fn validate_statement(
        level: usize,
        statement: serde_json::Value,
    ) -> Result<(), Vec<TypeError>> {
        let block = BlockSchema::new().attribute(root_statement_schema(level));
        block.validate(&attrs(json!({"statement": [statement]})))
    }

    /// Find an error anywhere in the nested error tree
    fn contains(error: &TypeError, pred: &impl Fn(&TypeError) -> bool) -> bool {
        if pred(error) {
            return true;
        }
        match error {
            TypeError::AttributeError { inner, .. }
            | TypeError::ListItemError { inner, .. }
            | TypeError::MapValueError { inner, .. } => contains(inner, pred),
            _ => false,
        }
    }

    #[test]
    fn statement_kinds_are_in_key_order() {
        let keys: Vec<&str> = StatementKind::ALL.iter().map(StatementKind::key).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        let combinational: Vec<StatementKind> = StatementKind::ALL
            .into_iter()
            .filter(StatementKind::is_combinational)
            .collect();
        assert_eq!(
            combinational,
            vec![StatementKind::And, StatementKind::Not, StatementKind::Or]
        );
    }

    #[test]
    fn root_statement_declares_every_kind() {
        let schema = root_statement_schema(3);
        assert!(schema.required);
        assert_eq!(schema.max_items, Some(1));

        let body = schema.attr_type.block().unwrap();
        assert!(body.exclusive);
        assert!(body.populated_required);
        let expected: Vec<&str> = StatementKind::ALL.iter().map(StatementKind::key).collect();
        assert_eq!(body.attribute_names(), expected);
    }

    #[test]
    fn last_level_has_only_leaf_kinds() {
        let schema = statement_schema("and_statement", 1);
        let nested = schema.attr_type.block().unwrap().attributes["statement"]
            .attr_type
            .block()
            .unwrap();

        assert_eq!(nested.attributes.len(), 7);
        for kind in StatementKind::ALL {
            assert_eq!(
                nested.attributes.contains_key(kind.key()),
                !kind.is_combinational(),
                "{}",
                kind.key()
            );
        }
    }

    #[test]
    fn nesting_up_to_the_level_is_accepted() {
        assert!(validate_statement(3, nested(1)).is_ok());
        assert!(validate_statement(3, nested(2)).is_ok());
        assert!(validate_statement(3, nested(3)).is_ok());
    }

    #[test]
    fn nesting_past_the_level_is_rejected() {
        let errors = validate_statement(3, nested(4)).unwrap_err();
        assert!(errors.iter().any(|e| contains(e, &|e| matches!(
            e,
            TypeError::UnknownAttribute { name } if name == "and_statement"
        ))));

        // A deeper configuration is accepted once the level is raised
        assert!(validate_statement(4, nested(4)).is_ok());
    }

    #[test]
    fn two_statement_kinds_in_one_node_conflict() {
        let statement = json!({
            "geo_match_statement": [{"country_codes": ["US"]}],
            "sqli_match_statement": [{"text_transformation": [{"priority": 0, "type": "NONE"}]}],
        });
        let errors = validate_statement(3, statement).unwrap_err();
        assert!(errors.iter().any(|e| contains(e, &|e| matches!(
            e,
            TypeError::ConflictingAttributes { names }
                if names == &["geo_match_statement".to_string(), "sqli_match_statement".to_string()]
        ))));
    }

    #[test]
    fn empty_statement_nodes_are_rejected() {
        let no_kind = |e: &TypeError| matches!(e, TypeError::NoAttributeSet { .. });

        let errors = validate_statement(3, json!({})).unwrap_err();
        assert!(errors.iter().any(|e| contains(e, &no_kind)));

        let empty_not = json!({
            "and_statement": [{"statement": [
                geo(),
                {"not_statement": [{"statement": [{}]}]},
            ]}]
        });
        let errors = validate_statement(3, empty_not).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(contains(&errors[0], &no_kind));

        let unset_kinds = json!({"geo_match_statement": [], "or_statement": []});
        assert!(validate_statement(3, unset_kinds).is_err());
    }

    #[test]
    fn not_statement_takes_one_child() {
        let statement = json!({"not_statement": [{"statement": [geo(), geo()]}]});
        let errors = validate_statement(3, statement).unwrap_err();
        assert!(errors.iter().any(|e| contains(e, &|e| matches!(
            e,
            TypeError::TooManyItems { max: 1, got: 2 }
        ))));
    }

    #[test]
    fn field_to_match_is_exclusive() {
        let block = BlockSchema::new().attribute(field_to_match_schema());

        let one = attrs(json!({"field_to_match": [{"single_header": [{"name": "x"}]}]}));
        assert!(block.validate(&one).is_ok());

        let two = attrs(json!({
            "field_to_match": [{"single_header": [{"name": "x"}], "body": [{}]}]
        }));
        let errors = block.validate(&two).unwrap_err();
        assert!(errors.iter().any(|e| contains(e, &|e| matches!(
            e,
            TypeError::ConflictingAttributes { .. }
        ))));
    }

    #[test]
    fn leaf_constraints_are_enforced() {
        let statement = json!({
            "byte_match_statement": [{
                "positional_constraint": "SOMEWHERE",
                "search_string": "",
                "text_transformation": [{"priority": 0, "type": "NONE"}],
            }]
        });
        let errors = validate_statement(3, statement).unwrap_err();
        assert!(errors.iter().any(|e| contains(e, &|e| matches!(
            e,
            TypeError::InvalidEnumVariant { value, .. } if value == "SOMEWHERE"
        ))));
        assert!(errors.iter().any(|e| contains(e, &|e| matches!(
            e,
            TypeError::MissingRequired { name } if name == "search_string"
        ))));
    }

    #[test]
    fn text_transformation_is_required() {
        let statement = json!({"xss_match_statement": [{"field_to_match": [{"body": [{}]}]}]});
        let errors = validate_statement(3, statement).unwrap_err();
        assert!(errors.iter().any(|e| contains(e, &|e| matches!(
            e,
            TypeError::MissingRequired { name } if name == "text_transformation"
        ))));
    }

    #[test]
    fn rule_action_is_exclusive() {
        let block = BlockSchema::new().attribute(rule_action_schema());
        assert!(block.validate(&attrs(json!({"action": [{"count": [{}]}]}))).is_ok());

        let errors = block
            .validate(&attrs(json!({"action": [{"allow": [{}], "block": [{}]}]})))
            .unwrap_err();
        assert!(errors.iter().any(|e| contains(e, &|e| matches!(
            e,
            TypeError::ConflictingAttributes { names }
                if names == &["allow".to_string(), "block".to_string()]
        ))));

        let errors = block.validate(&attrs(json!({"action": [{}]}))).unwrap_err();
        assert!(errors.iter().any(|e| contains(e, &|e| matches!(
            e,
            TypeError::NoAttributeSet { names } if names.len() == 3
        ))));
    }

    #[test]
    fn rule_group_schema_validates_document() {
        let schema = rule_group_schema(3);
        let visibility = json!([{
            "cloudwatch_metrics_enabled": false,
            "metric_name": "friendly-metric-name",
            "sampled_requests_enabled": false,
        }]);
        let group = attrs(json!({
            "name": "example",
            "scope": "REGIONAL",
            "capacity": 2,
            "rule": [{
                "name": "r1",
                "priority": 1,
                "action": [{"block": [{}]}],
                "statement": [geo()],
                "visibility_config": visibility.clone(),
            }],
            "visibility_config": visibility,
        }));
        assert!(schema.validate(&group).is_ok());

        let mut bad = group.clone();
        bad.insert("capacity".to_string(), Value::Int(0));
        bad.insert("scope".to_string(), Value::String("GLOBAL".to_string()));
        let errors = schema.validate(&bad).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
