//! Leaf structures shared by the expander and the flattener
//!
//! Each pair converts one terminal block in both directions. Flattening an
//! unset value yields an empty block list.

use std::collections::HashMap;

use carina_core::resource::Value;

use crate::blocks::{
    Attributes, absent, block, blocks, is_set, marker, required_bool, required_enum,
    required_int, required_string, singleton, string,
};
use crate::expand::ExpandError;
use crate::schemas::wafv2::FIELD_TO_MATCH_KEYS;
use crate::wire::{
    Empty, FieldToMatch, ForwardedIpConfig, IpSetForwardedIpConfig, MatchField, SingleHeader,
    SingleQueryArgument, TextTransformation, VisibilityConfig,
};

pub(crate) fn expand_single_header(attrs: &Attributes) -> Result<SingleHeader, ExpandError> {
    Ok(SingleHeader {
        name: required_string(attrs, "name")?,
    })
}

pub(crate) fn flatten_single_header(header: &SingleHeader) -> Value {
    block(HashMap::from([("name".to_string(), string(&header.name))]))
}

pub(crate) fn expand_single_query_argument(
    attrs: &Attributes,
) -> Result<SingleQueryArgument, ExpandError> {
    Ok(SingleQueryArgument {
        name: required_string(attrs, "name")?,
    })
}

pub(crate) fn flatten_single_query_argument(argument: &SingleQueryArgument) -> Value {
    block(HashMap::from([("name".to_string(), string(&argument.name))]))
}

pub(crate) fn expand_forwarded_ip_config(
    attrs: &Attributes,
) -> Result<ForwardedIpConfig, ExpandError> {
    Ok(ForwardedIpConfig {
        header_name: required_string(attrs, "header_name")?,
        fallback_behavior: required_enum(attrs, "fallback_behavior")?,
    })
}

pub(crate) fn flatten_forwarded_ip_config(config: Option<&ForwardedIpConfig>) -> Value {
    let Some(config) = config else {
        return absent();
    };
    block(HashMap::from([
        ("header_name".to_string(), string(&config.header_name)),
        (
            "fallback_behavior".to_string(),
            string(config.fallback_behavior.as_str()),
        ),
    ]))
}

pub(crate) fn expand_ip_set_forwarded_ip_config(
    attrs: &Attributes,
) -> Result<IpSetForwardedIpConfig, ExpandError> {
    Ok(IpSetForwardedIpConfig {
        header_name: required_string(attrs, "header_name")?,
        fallback_behavior: required_enum(attrs, "fallback_behavior")?,
        position: required_enum(attrs, "position")?,
    })
}

pub(crate) fn flatten_ip_set_forwarded_ip_config(
    config: Option<&IpSetForwardedIpConfig>,
) -> Value {
    let Some(config) = config else {
        return absent();
    };
    block(HashMap::from([
        ("header_name".to_string(), string(&config.header_name)),
        (
            "fallback_behavior".to_string(),
            string(config.fallback_behavior.as_str()),
        ),
        ("position".to_string(), string(config.position.as_str())),
    ]))
}

/// Transformations of a statement, in input order
///
/// Priority is carried per entry; consumers must not rely on position.
pub(crate) fn expand_text_transformations(
    attrs: &Attributes,
) -> Result<Vec<TextTransformation>, ExpandError> {
    blocks(attrs, "text_transformation")?
        .into_iter()
        .map(|entry| {
            Ok(TextTransformation {
                priority: required_int(entry, "priority")?,
                kind: required_enum(entry, "type")?,
            })
        })
        .collect()
}

pub(crate) fn flatten_text_transformations(transformations: &[TextTransformation]) -> Value {
    Value::List(
        transformations
            .iter()
            .map(|t| {
                Value::Map(HashMap::from([
                    ("priority".to_string(), Value::Int(t.priority)),
                    ("type".to_string(), string(t.kind.as_str())),
                ]))
            })
            .collect(),
    )
}

pub(crate) fn expand_visibility_config(
    attrs: &Attributes,
) -> Result<VisibilityConfig, ExpandError> {
    Ok(VisibilityConfig {
        sampled_requests_enabled: required_bool(attrs, "sampled_requests_enabled")?,
        cloud_watch_metrics_enabled: required_bool(attrs, "cloudwatch_metrics_enabled")?,
        metric_name: required_string(attrs, "metric_name")?,
    })
}

pub(crate) fn flatten_visibility_config(config: Option<&VisibilityConfig>) -> Value {
    let Some(config) = config else {
        return absent();
    };
    block(HashMap::from([
        (
            "cloudwatch_metrics_enabled".to_string(),
            Value::Bool(config.cloud_watch_metrics_enabled),
        ),
        ("metric_name".to_string(), string(&config.metric_name)),
        (
            "sampled_requests_enabled".to_string(),
            Value::Bool(config.sampled_requests_enabled),
        ),
    ]))
}

/// Expand a `field_to_match` block
///
/// The API accepts a single request component, so more than one populated
/// key among the seven is rejected. With none populated the selector is
/// empty.
pub(crate) fn expand_field_to_match(attrs: &Attributes) -> Result<FieldToMatch, ExpandError> {
    let populated: Vec<&str> = FIELD_TO_MATCH_KEYS
        .into_iter()
        .filter(|key| is_set(attrs, key))
        .collect();
    if populated.len() > 1 {
        return Err(ExpandError::FieldToMatchConflict {
            populated: populated.into_iter().map(str::to_string).collect(),
        });
    }

    let target = if is_set(attrs, "all_query_arguments") {
        Some(MatchField::AllQueryArguments(Empty {}))
    } else if is_set(attrs, "body") {
        Some(MatchField::Body(Empty {}))
    } else if is_set(attrs, "method") {
        Some(MatchField::Method(Empty {}))
    } else if is_set(attrs, "query_string") {
        Some(MatchField::QueryString(Empty {}))
    } else if let Some(header) = singleton(attrs, "single_header")? {
        Some(MatchField::SingleHeader(expand_single_header(header)?))
    } else if let Some(argument) = singleton(attrs, "single_query_argument")? {
        Some(MatchField::SingleQueryArgument(
            expand_single_query_argument(argument)?,
        ))
    } else if is_set(attrs, "uri_path") {
        Some(MatchField::UriPath(Empty {}))
    } else {
        None
    };

    Ok(FieldToMatch { target })
}

pub(crate) fn flatten_field_to_match(field: Option<&FieldToMatch>) -> Value {
    let Some(field) = field else {
        return absent();
    };
    let mut attrs = HashMap::new();
    match &field.target {
        Some(MatchField::AllQueryArguments(_)) => {
            attrs.insert("all_query_arguments".to_string(), marker());
        }
        Some(MatchField::Body(_)) => {
            attrs.insert("body".to_string(), marker());
        }
        Some(MatchField::Method(_)) => {
            attrs.insert("method".to_string(), marker());
        }
        Some(MatchField::QueryString(_)) => {
            attrs.insert("query_string".to_string(), marker());
        }
        Some(MatchField::SingleHeader(header)) => {
            attrs.insert("single_header".to_string(), flatten_single_header(header));
        }
        Some(MatchField::SingleQueryArgument(argument)) => {
            attrs.insert(
                "single_query_argument".to_string(),
                flatten_single_query_argument(argument),
            );
        }
        Some(MatchField::UriPath(_)) => {
            attrs.insert("uri_path".to_string(), marker());
        }
        None => {}
    }
    block(attrs)
}
