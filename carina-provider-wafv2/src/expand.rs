//! Expand - Declarative blocks to WAFv2 wire types
//!
//! Statement trees are expanded recursively. The first error aborts the
//! whole expansion; sibling statements are not visited afterwards.

use carina_core::resource::Value;

use crate::blocks::{
    Attributes, blocks, invalid, is_set, optional_string, required_enum, required_int,
    required_string, singleton, string_list,
};
use crate::schemas::wafv2::{FIELD_TO_MATCH_KEYS, RULE_ACTION_KEYS, StatementKind};
use crate::transcode::{
    expand_field_to_match, expand_forwarded_ip_config, expand_ip_set_forwarded_ip_config,
    expand_text_transformations, expand_visibility_config,
};
use crate::wire::{
    AndStatement, ByteMatchStatement, Empty, FieldToMatch, GeoMatchStatement,
    IpSetReferenceStatement, NotStatement, OrStatement, RegexPatternSetReferenceStatement, Rule,
    RuleAction, RuleGroup, SizeConstraintStatement, SqliMatchStatement, Statement,
    XssMatchStatement,
};

/// Expansion error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpandError {
    #[error(
        "error expanding field_to_match: only one of {} is valid, got {}",
        quoted(&FIELD_TO_MATCH_KEYS),
        populated.join(", ")
    )]
    FieldToMatchConflict { populated: Vec<String> },

    #[error(
        "error expanding action: only one of {} is valid, got {}",
        quoted(&RULE_ACTION_KEYS),
        populated.join(", ")
    )]
    RuleActionConflict { populated: Vec<String> },

    #[error("invalid value for '{attribute}': {message}")]
    InvalidAttribute { attribute: String, message: String },
}

fn quoted(keys: &[&str]) -> String {
    keys.iter()
        .map(|k| format!("\"{}\"", k))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Expand one statement node
///
/// Returns `None` for a node without any populated statement kind. Only the
/// first populated kind is expanded; schema validation keeps a node from
/// holding more than one.
pub fn expand_statement(node: &Attributes) -> Result<Option<Statement>, ExpandError> {
    let mut populated = StatementKind::ALL
        .into_iter()
        .filter(|kind| is_set(node, kind.key()));
    let Some(kind) = populated.next() else {
        return Ok(None);
    };
    for ignored in populated {
        log::warn!(
            "Ignoring {} in a statement that already has {}",
            ignored.key(),
            kind.key()
        );
    }

    let Some(block) = singleton(node, kind.key())? else {
        return Ok(None);
    };

    let statement = match kind {
        StatementKind::And => Statement::AndStatement(AndStatement {
            statements: expand_statements(block)?,
        }),
        StatementKind::ByteMatch => Statement::ByteMatchStatement(expand_byte_match(block)?),
        StatementKind::GeoMatch => Statement::GeoMatchStatement(expand_geo_match(block)?),
        StatementKind::IpSetReference => {
            Statement::IpSetReferenceStatement(expand_ip_set_reference(block)?)
        }
        StatementKind::Not => return expand_not_statement(block),
        StatementKind::Or => Statement::OrStatement(OrStatement {
            statements: expand_statements(block)?,
        }),
        StatementKind::RegexPatternSetReference => {
            Statement::RegexPatternSetReferenceStatement(expand_regex_pattern_set_reference(block)?)
        }
        StatementKind::SizeConstraint => {
            Statement::SizeConstraintStatement(expand_size_constraint(block)?)
        }
        StatementKind::SqliMatch => Statement::SqliMatchStatement(SqliMatchStatement {
            field_to_match: expand_optional_field_to_match(block)?,
            text_transformations: expand_text_transformations(block)?,
        }),
        StatementKind::XssMatch => Statement::XssMatchStatement(XssMatchStatement {
            field_to_match: expand_optional_field_to_match(block)?,
            text_transformations: expand_text_transformations(block)?,
        }),
    };

    Ok(Some(statement))
}

/// Nested statements of an `and`/`or` block, in input order
///
/// Empty nodes are dropped.
fn expand_statements(block: &Attributes) -> Result<Vec<Statement>, ExpandError> {
    let mut statements = Vec::new();
    for node in blocks(block, "statement")? {
        if let Some(statement) = expand_statement(node)? {
            statements.push(statement);
        }
    }
    Ok(statements)
}

fn expand_not_statement(block: &Attributes) -> Result<Option<Statement>, ExpandError> {
    let Some(node) = singleton(block, "statement")? else {
        return Ok(None);
    };
    Ok(expand_statement(node)?.map(|statement| {
        Statement::NotStatement(NotStatement {
            statement: Box::new(statement),
        })
    }))
}

fn expand_optional_field_to_match(
    block: &Attributes,
) -> Result<Option<FieldToMatch>, ExpandError> {
    singleton(block, "field_to_match")?
        .map(expand_field_to_match)
        .transpose()
}

fn expand_byte_match(block: &Attributes) -> Result<ByteMatchStatement, ExpandError> {
    Ok(ByteMatchStatement {
        field_to_match: expand_optional_field_to_match(block)?,
        positional_constraint: required_enum(block, "positional_constraint")?,
        search_string: required_string(block, "search_string")?.into_bytes(),
        text_transformations: expand_text_transformations(block)?,
    })
}

fn expand_geo_match(block: &Attributes) -> Result<GeoMatchStatement, ExpandError> {
    Ok(GeoMatchStatement {
        country_codes: string_list(block, "country_codes")?,
        forwarded_ip_config: singleton(block, "forwarded_ip_config")?
            .map(expand_forwarded_ip_config)
            .transpose()?,
    })
}

fn expand_ip_set_reference(block: &Attributes) -> Result<IpSetReferenceStatement, ExpandError> {
    Ok(IpSetReferenceStatement {
        arn: required_string(block, "arn")?,
        ip_set_forwarded_ip_config: singleton(block, "ip_set_forwarded_ip_config")?
            .map(expand_ip_set_forwarded_ip_config)
            .transpose()?,
    })
}

fn expand_regex_pattern_set_reference(
    block: &Attributes,
) -> Result<RegexPatternSetReferenceStatement, ExpandError> {
    Ok(RegexPatternSetReferenceStatement {
        arn: required_string(block, "arn")?,
        field_to_match: expand_optional_field_to_match(block)?,
        text_transformations: expand_text_transformations(block)?,
    })
}

fn expand_size_constraint(block: &Attributes) -> Result<SizeConstraintStatement, ExpandError> {
    Ok(SizeConstraintStatement {
        field_to_match: expand_optional_field_to_match(block)?,
        comparison_operator: required_enum(block, "comparison_operator")?,
        size: required_int(block, "size")?,
        text_transformations: expand_text_transformations(block)?,
    })
}

/// Expand an `action` block; an empty block has no action
pub fn expand_rule_action(block: &Attributes) -> Result<Option<RuleAction>, ExpandError> {
    let populated: Vec<&str> = RULE_ACTION_KEYS
        .into_iter()
        .filter(|key| is_set(block, key))
        .collect();
    if populated.len() > 1 {
        return Err(ExpandError::RuleActionConflict {
            populated: populated.into_iter().map(str::to_string).collect(),
        });
    }

    Ok(match populated.first().copied() {
        Some("allow") => Some(RuleAction::Allow(Empty {})),
        Some("block") => Some(RuleAction::Block(Empty {})),
        Some("count") => Some(RuleAction::Count(Empty {})),
        _ => None,
    })
}

/// Expand one rule block
pub fn expand_rule(rule: &Attributes) -> Result<Rule, ExpandError> {
    let name = required_string(rule, "name")?;
    log::debug!("Expanding rule {}", name);

    let action = match singleton(rule, "action")? {
        Some(block) => expand_rule_action(block)?,
        None => None,
    };
    let statement = match singleton(rule, "statement")? {
        Some(node) => expand_statement(node)?,
        None => None,
    };

    Ok(Rule {
        name,
        priority: required_int(rule, "priority")?,
        action,
        statement,
        visibility_config: singleton(rule, "visibility_config")?
            .map(expand_visibility_config)
            .transpose()?,
    })
}

/// Expand a list of rule blocks, in input order
pub fn expand_rules(rules: &[Value]) -> Result<Vec<Rule>, ExpandError> {
    rules
        .iter()
        .map(|rule| {
            let rule = rule
                .as_map()
                .ok_or_else(|| invalid("rule", "expected a list of blocks"))?;
            expand_rule(rule)
        })
        .collect()
}

/// Expand the attributes of a `wafv2.rule_group` into its desired state
pub fn expand_rule_group(attributes: &Attributes) -> Result<RuleGroup, ExpandError> {
    let rules = match attributes.get("rule") {
        Some(Value::List(items)) => expand_rules(items)?,
        Some(_) => return Err(invalid("rule", "expected a list of blocks")),
        None => Vec::new(),
    };

    Ok(RuleGroup {
        name: required_string(attributes, "name")?,
        scope: required_enum(attributes, "scope")?,
        capacity: required_int(attributes, "capacity")?,
        description: optional_string(attributes, "description")?,
        rules,
        visibility_config: singleton(attributes, "visibility_config")?
            .map(expand_visibility_config)
            .transpose()?,
    })
}
