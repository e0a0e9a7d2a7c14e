//! WAFv2 wire types
//!
//! Typed mirror of the WAFv2 API shapes used by rule groups. Serialized with
//! serde into the JSON document Cloud Control expects for
//! `AWS::WAFv2::RuleGroup` (PascalCase keys, one key per tagged union).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Defines a string-valued API enum together with its accepted values
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Values accepted by the API
            pub const VALUES: &'static [&'static str] = &[$($wire),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(format!(
                        "invalid {} '{}', expected one of: {}",
                        stringify!($name),
                        s,
                        Self::VALUES.join(", ")
                    )),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

wire_enum!(
    /// How a byte match statement compares the search string
    PositionalConstraint {
        Contains => "CONTAINS",
        ContainsWord => "CONTAINS_WORD",
        EndsWith => "ENDS_WITH",
        Exactly => "EXACTLY",
        StartsWith => "STARTS_WITH",
    }
);

wire_enum!(
    /// Operator of a size constraint statement
    ComparisonOperator {
        Eq => "EQ",
        Ge => "GE",
        Gt => "GT",
        Le => "LE",
        Lt => "LT",
        Ne => "NE",
    }
);

wire_enum!(
    TextTransformationType {
        CmdLine => "CMD_LINE",
        CompressWhiteSpace => "COMPRESS_WHITE_SPACE",
        HtmlEntityDecode => "HTML_ENTITY_DECODE",
        Lowercase => "LOWERCASE",
        None => "NONE",
        UrlDecode => "URL_DECODE",
    }
);

wire_enum!(
    /// Match result when the forwarded IP header is missing or invalid
    FallbackBehavior {
        Match => "MATCH",
        NoMatch => "NO_MATCH",
    }
);

wire_enum!(
    /// Which address of a forwarded IP header list to use
    ForwardedIpPosition {
        First => "FIRST",
        Last => "LAST",
        Any => "ANY",
    }
);

wire_enum!(
    Scope {
        Cloudfront => "CLOUDFRONT",
        Regional => "REGIONAL",
    }
);

/// Member without fields, serialized as `{}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleAction {
    Allow(Empty),
    Block(Empty),
    Count(Empty),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SingleHeader {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SingleQueryArgument {
    pub name: String,
}

/// Part of a web request a statement inspects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchField {
    AllQueryArguments(Empty),
    Body(Empty),
    Method(Empty),
    QueryString(Empty),
    SingleHeader(SingleHeader),
    SingleQueryArgument(SingleQueryArgument),
    UriPath(Empty),
}

/// Request component selector; an empty selector serializes as `{}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldToMatch {
    #[serde(flatten)]
    pub target: Option<MatchField>,
}

impl FieldToMatch {
    pub fn new(target: MatchField) -> Self {
        Self {
            target: Some(target),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextTransformation {
    pub priority: i64,
    #[serde(rename = "Type")]
    pub kind: TextTransformationType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ForwardedIpConfig {
    pub header_name: String,
    pub fallback_behavior: FallbackBehavior,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IpSetForwardedIpConfig {
    pub header_name: String,
    pub fallback_behavior: FallbackBehavior,
    pub position: ForwardedIpPosition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VisibilityConfig {
    pub sampled_requests_enabled: bool,
    pub cloud_watch_metrics_enabled: bool,
    pub metric_name: String,
}

/// Condition tree node; exactly one statement kind per node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    AndStatement(AndStatement),
    ByteMatchStatement(ByteMatchStatement),
    GeoMatchStatement(GeoMatchStatement),
    #[serde(rename = "IPSetReferenceStatement")]
    IpSetReferenceStatement(IpSetReferenceStatement),
    NotStatement(NotStatement),
    OrStatement(OrStatement),
    RegexPatternSetReferenceStatement(RegexPatternSetReferenceStatement),
    SizeConstraintStatement(SizeConstraintStatement),
    SqliMatchStatement(SqliMatchStatement),
    XssMatchStatement(XssMatchStatement),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AndStatement {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrStatement {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotStatement {
    pub statement: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ByteMatchStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_to_match: Option<FieldToMatch>,
    pub positional_constraint: PositionalConstraint,
    #[serde(with = "utf8_bytes")]
    pub search_string: Vec<u8>,
    pub text_transformations: Vec<TextTransformation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GeoMatchStatement {
    pub country_codes: Vec<String>,
    #[serde(
        rename = "ForwardedIPConfig",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub forwarded_ip_config: Option<ForwardedIpConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IpSetReferenceStatement {
    #[serde(rename = "ARN")]
    pub arn: String,
    #[serde(
        rename = "IPSetForwardedIPConfig",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ip_set_forwarded_ip_config: Option<IpSetForwardedIpConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegexPatternSetReferenceStatement {
    #[serde(rename = "ARN")]
    pub arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_to_match: Option<FieldToMatch>,
    pub text_transformations: Vec<TextTransformation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SizeConstraintStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_to_match: Option<FieldToMatch>,
    pub comparison_operator: ComparisonOperator,
    pub size: i64,
    pub text_transformations: Vec<TextTransformation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SqliMatchStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_to_match: Option<FieldToMatch>,
    pub text_transformations: Vec<TextTransformation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XssMatchStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_to_match: Option<FieldToMatch>,
    pub text_transformations: Vec<TextTransformation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Rule {
    pub name: String,
    pub priority: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<RuleAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<Statement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_config: Option<VisibilityConfig>,
}

/// Desired state of an `AWS::WAFv2::RuleGroup`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleGroup {
    pub name: String,
    pub scope: Scope,
    pub capacity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_config: Option<VisibilityConfig>,
}

/// Search strings travel as text in the Cloud Control document
mod utf8_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        String::deserialize(deserializer).map(String::into_bytes)
    }
}
