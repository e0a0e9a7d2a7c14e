//! Flatten - WAFv2 wire types to declarative blocks
//!
//! Flattening cannot fail: wire values come from the API and are taken as
//! well-formed. Unset optional structures become empty block lists.

use std::collections::HashMap;

use carina_core::resource::Value;

use crate::blocks::{Attributes, absent, block, marker, string};
use crate::schemas::wafv2::StatementKind;
use crate::transcode::{
    flatten_field_to_match, flatten_forwarded_ip_config, flatten_ip_set_forwarded_ip_config,
    flatten_text_transformations, flatten_visibility_config,
};
use crate::wire::{FieldToMatch, Rule, RuleAction, RuleGroup, Statement, TextTransformation};

/// Flatten one statement into a statement node
///
/// The node holds exactly one populated kind.
pub fn flatten_statement(statement: &Statement) -> Value {
    let (kind, body) = match statement {
        Statement::AndStatement(and) => (StatementKind::And, nested(&and.statements)),
        Statement::ByteMatchStatement(s) => (
            StatementKind::ByteMatch,
            HashMap::from([
                (
                    "field_to_match".to_string(),
                    flatten_field_to_match(s.field_to_match.as_ref()),
                ),
                (
                    "positional_constraint".to_string(),
                    string(s.positional_constraint.as_str()),
                ),
                (
                    "search_string".to_string(),
                    string(String::from_utf8_lossy(&s.search_string)),
                ),
                (
                    "text_transformation".to_string(),
                    flatten_text_transformations(&s.text_transformations),
                ),
            ]),
        ),
        Statement::GeoMatchStatement(s) => (
            StatementKind::GeoMatch,
            HashMap::from([
                (
                    "country_codes".to_string(),
                    Value::List(s.country_codes.iter().map(string).collect()),
                ),
                (
                    "forwarded_ip_config".to_string(),
                    flatten_forwarded_ip_config(s.forwarded_ip_config.as_ref()),
                ),
            ]),
        ),
        Statement::IpSetReferenceStatement(s) => (
            StatementKind::IpSetReference,
            HashMap::from([
                ("arn".to_string(), string(&s.arn)),
                (
                    "ip_set_forwarded_ip_config".to_string(),
                    flatten_ip_set_forwarded_ip_config(s.ip_set_forwarded_ip_config.as_ref()),
                ),
            ]),
        ),
        Statement::NotStatement(not) => (
            StatementKind::Not,
            HashMap::from([(
                "statement".to_string(),
                Value::List(vec![flatten_statement(&not.statement)]),
            )]),
        ),
        Statement::OrStatement(or) => (StatementKind::Or, nested(&or.statements)),
        Statement::RegexPatternSetReferenceStatement(s) => (
            StatementKind::RegexPatternSetReference,
            HashMap::from([
                ("arn".to_string(), string(&s.arn)),
                (
                    "field_to_match".to_string(),
                    flatten_field_to_match(s.field_to_match.as_ref()),
                ),
                (
                    "text_transformation".to_string(),
                    flatten_text_transformations(&s.text_transformations),
                ),
            ]),
        ),
        Statement::SizeConstraintStatement(s) => (
            StatementKind::SizeConstraint,
            HashMap::from([
                (
                    "comparison_operator".to_string(),
                    string(s.comparison_operator.as_str()),
                ),
                (
                    "field_to_match".to_string(),
                    flatten_field_to_match(s.field_to_match.as_ref()),
                ),
                ("size".to_string(), Value::Int(s.size)),
                (
                    "text_transformation".to_string(),
                    flatten_text_transformations(&s.text_transformations),
                ),
            ]),
        ),
        Statement::SqliMatchStatement(s) => (
            StatementKind::SqliMatch,
            inspection(s.field_to_match.as_ref(), &s.text_transformations),
        ),
        Statement::XssMatchStatement(s) => (
            StatementKind::XssMatch,
            inspection(s.field_to_match.as_ref(), &s.text_transformations),
        ),
    };

    log::trace!("Flattened {}", kind.key());
    Value::Map(HashMap::from([(kind.key().to_string(), block(body))]))
}

fn nested(statements: &[Statement]) -> Attributes {
    HashMap::from([(
        "statement".to_string(),
        Value::List(statements.iter().map(flatten_statement).collect()),
    )])
}

/// Body of the statements that only select and transform a request component
fn inspection(
    field_to_match: Option<&FieldToMatch>,
    transformations: &[TextTransformation],
) -> Attributes {
    HashMap::from([
        (
            "field_to_match".to_string(),
            flatten_field_to_match(field_to_match),
        ),
        (
            "text_transformation".to_string(),
            flatten_text_transformations(transformations),
        ),
    ])
}

pub fn flatten_rule_action(action: Option<&RuleAction>) -> Value {
    let key = match action {
        Some(RuleAction::Allow(_)) => "allow",
        Some(RuleAction::Block(_)) => "block",
        Some(RuleAction::Count(_)) => "count",
        None => return absent(),
    };
    block(HashMap::from([(key.to_string(), marker())]))
}

pub fn flatten_rule(rule: &Rule) -> Value {
    Value::Map(HashMap::from([
        ("action".to_string(), flatten_rule_action(rule.action.as_ref())),
        ("name".to_string(), string(&rule.name)),
        ("priority".to_string(), Value::Int(rule.priority)),
        (
            "statement".to_string(),
            match &rule.statement {
                Some(statement) => Value::List(vec![flatten_statement(statement)]),
                None => absent(),
            },
        ),
        (
            "visibility_config".to_string(),
            flatten_visibility_config(rule.visibility_config.as_ref()),
        ),
    ]))
}

pub fn flatten_rules(rules: &[Rule]) -> Value {
    Value::List(rules.iter().map(flatten_rule).collect())
}

/// Flatten a rule group into `wafv2.rule_group` attributes
pub fn flatten_rule_group(group: &RuleGroup) -> Value {
    let mut attrs = HashMap::from([
        ("name".to_string(), string(&group.name)),
        ("scope".to_string(), string(group.scope.as_str())),
        ("capacity".to_string(), Value::Int(group.capacity)),
        ("rule".to_string(), flatten_rules(&group.rules)),
        (
            "visibility_config".to_string(),
            flatten_visibility_config(group.visibility_config.as_ref()),
        ),
    ]);
    if let Some(description) = &group.description {
        attrs.insert("description".to_string(), string(description));
    }
    Value::Map(attrs)
}
