//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource type,
//! enabling type validation before values are sent to an API.
//!
//! Nested configuration is described with [`BlockSchema`]: an attribute of
//! type `List(Block(..))` holds a list of blocks, and `max_items(1)` turns it
//! into an optional singleton block.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// List without duplicates whose order carries no meaning
    Set(Box<AttributeType>),
    /// Map
    Map(Box<AttributeType>),
    /// Body of a nested block
    Block(Box<BlockSchema>),
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match self.errors(value).into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Collect every type error found in a value
    pub fn errors(&self, value: &Value) -> Vec<TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => vec![],
            (AttributeType::Int, Value::Int(_)) => vec![],
            (AttributeType::Bool, Value::Bool(_)) => vec![],

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    vec![]
                } else {
                    vec![TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    }]
                }
            }

            (AttributeType::Custom { validate, base, .. }, v) => {
                let base_errors = base.errors(v);
                if !base_errors.is_empty() {
                    return base_errors;
                }
                match validate(v) {
                    Ok(()) => vec![],
                    Err(message) => vec![TypeError::ValidationFailed { message }],
                }
            }

            (AttributeType::List(inner), Value::List(items)) => list_item_errors(inner, items),

            (AttributeType::Set(inner), Value::List(items)) => {
                let mut errors = list_item_errors(inner, items);
                for (i, item) in items.iter().enumerate() {
                    if items[..i].contains(item) {
                        errors.push(TypeError::DuplicateSetItem { index: i });
                    }
                }
                errors
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                keys.into_iter()
                    .flat_map(|k| {
                        inner
                            .errors(&map[k])
                            .into_iter()
                            .map(move |e| TypeError::MapValueError {
                                key: k.clone(),
                                inner: Box::new(e),
                            })
                    })
                    .collect()
            }

            (AttributeType::Block(block), Value::Map(map)) => block.errors(map),

            _ => vec![TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }],
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Set(inner) => format!("Set<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Block(_) => "Block".to_string(),
        }
    }

    /// Block schema reachable through this type, looking through lists and sets
    pub fn block(&self) -> Option<&BlockSchema> {
        match self {
            AttributeType::Block(block) => Some(block),
            AttributeType::List(inner) | AttributeType::Set(inner) => inner.block(),
            _ => None,
        }
    }
}

fn list_item_errors(inner: &AttributeType, items: &[Value]) -> Vec<TypeError> {
    items
        .iter()
        .enumerate()
        .flat_map(|(i, item)| {
            inner
                .errors(item)
                .into_iter()
                .map(move |e| TypeError::ListItemError {
                    index: i,
                    inner: Box::new(e),
                })
        })
        .collect()
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Expected at least {min} item(s), got {got}")]
    TooFewItems { min: usize, got: usize },

    #[error("Expected at most {max} item(s), got {got}")]
    TooManyItems { max: usize, got: usize },

    #[error("Duplicate set item at index {index}")]
    DuplicateSetItem { index: usize },

    #[error("Only one of {} may be set", names.join(", "))]
    ConflictingAttributes { names: Vec<String> },

    #[error("One of {} must be set", names.join(", "))]
    NoAttributeSet { names: Vec<String> },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    pub description: Option<String>,
    /// Lower bound on list, set and map lengths
    pub min_items: Option<usize>,
    /// Upper bound on list, set and map lengths
    pub max_items: Option<usize>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            description: None,
            min_items: None,
            max_items: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_min_items(mut self, min: usize) -> Self {
        self.min_items = Some(min);
        self
    }

    pub fn with_max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    /// Collect every error in a value of this attribute
    ///
    /// Errors are wrapped in [`TypeError::AttributeError`] so they carry the
    /// attribute name.
    pub fn errors(&self, value: &Value) -> Vec<TypeError> {
        let mut errors = Vec::new();

        let len = match value {
            Value::List(items) => Some(items.len()),
            Value::Map(map) => Some(map.len()),
            _ => None,
        };
        if let Some(got) = len {
            if let Some(min) = self.min_items
                && got < min
            {
                errors.push(TypeError::TooFewItems { min, got });
            }
            if let Some(max) = self.max_items
                && got > max
            {
                errors.push(TypeError::TooManyItems { max, got });
            }
        }

        errors.extend(self.attr_type.errors(value));

        errors
            .into_iter()
            .map(|e| TypeError::AttributeError {
                name: self.name.clone(),
                inner: Box::new(e),
            })
            .collect()
    }
}

/// Schema of a nested configuration block
#[derive(Debug, Clone, Default)]
pub struct BlockSchema {
    pub attributes: HashMap<String, AttributeSchema>,
    /// At most one attribute of the block may be populated
    pub exclusive: bool,
    /// At least one attribute of the block must be populated
    pub populated_required: bool,
}

impl BlockSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    /// Mark the block as a one-of: at most one attribute may be populated
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    /// Mark the block as a one-of that must hold exactly one populated attribute
    pub fn exactly_one(mut self) -> Self {
        self.exclusive = true;
        self.populated_required = true;
        self
    }

    /// Attribute names in sorted order
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    /// Validate the attributes of one block
    ///
    /// Unlike [`ResourceSchema::validate`], unknown attributes are rejected.
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let errors = self.errors(attributes);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn errors(&self, attributes: &HashMap<String, Value>) -> Vec<TypeError> {
        let mut errors = Vec::new();

        for name in self.attribute_names() {
            let schema = &self.attributes[name];
            if schema.required && attributes.get(name).is_none_or(Value::is_empty) {
                errors.push(TypeError::MissingRequired {
                    name: name.to_string(),
                });
            }
        }

        let mut keys: Vec<&String> = attributes.keys().collect();
        keys.sort();
        for key in &keys {
            match self.attributes.get(key.as_str()) {
                Some(schema) => errors.extend(schema.errors(&attributes[key.as_str()])),
                None => errors.push(TypeError::UnknownAttribute {
                    name: key.to_string(),
                }),
            }
        }

        let populated: Vec<String> = keys
            .iter()
            .filter(|k| !attributes[k.as_str()].is_empty())
            .map(|k| k.to_string())
            .collect();
        if self.exclusive && populated.len() > 1 {
            errors.push(TypeError::ConflictingAttributes { names: populated });
        } else if self.populated_required && populated.is_empty() {
            errors.push(TypeError::NoAttributeSet {
                names: self
                    .attribute_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            });
        }

        errors
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        // Check required attributes
        let mut names: Vec<&String> = self.attributes.keys().collect();
        names.sort();
        for name in names {
            if self.attributes[name].required && !attributes.contains_key(name) {
                errors.push(TypeError::MissingRequired { name: name.clone() });
            }
        }

        // Type check each attribute
        let mut keys: Vec<&String> = attributes.keys().collect();
        keys.sort();
        for name in keys {
            if let Some(schema) = self.attributes.get(name) {
                errors.extend(schema.errors(&attributes[name]));
            }
            // Unknown attributes are allowed (for flexibility)
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| {
                if let Value::Int(n) = value {
                    if *n > 0 {
                        Ok(())
                    } else {
                        Err("Value must be positive".to_string())
                    }
                } else {
                    Err("Expected integer".to_string())
                }
            },
        }
    }
}

/// Validate that a string value has between `min` and `max` characters
pub fn validate_string_length(value: &Value, min: usize, max: usize) -> Result<(), String> {
    match value {
        Value::String(s) => {
            let len = s.chars().count();
            if len < min || len > max {
                Err(format!(
                    "length must be between {} and {}, got {}",
                    min, max, len
                ))
            } else {
                Ok(())
            }
        }
        _ => Err("Expected string".to_string()),
    }
}

/// Validate that an integer value lies in `min..=max`
pub fn validate_int_range(value: &Value, min: i64, max: i64) -> Result<(), String> {
    match value {
        Value::Int(n) if *n >= min && *n <= max => Ok(()),
        Value::Int(n) => Err(format!(
            "value must be between {} and {}, got {}",
            min, max, n
        )),
        _ => Err("Expected integer".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_list(maps: Vec<HashMap<String, Value>>) -> Value {
        Value::List(maps.into_iter().map(Value::Map).collect())
    }

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::String("hello".to_string())).is_ok());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn validate_enum_type() {
        let t = AttributeType::Enum(vec!["a".to_string(), "b".to_string()]);
        assert!(t.validate(&Value::String("a".to_string())).is_ok());
        assert!(t.validate(&Value::String("c".to_string())).is_err());
        assert!(t.validate(&Value::String("A".to_string())).is_err());
    }

    #[test]
    fn validate_positive_int() {
        let t = types::positive_int();
        assert!(t.validate(&Value::Int(1)).is_ok());
        assert!(t.validate(&Value::Int(100)).is_ok());
        assert!(t.validate(&Value::Int(0)).is_err());
        assert!(t.validate(&Value::Int(-1)).is_err());
    }

    #[test]
    fn custom_type_checks_base_first() {
        let t = types::positive_int();
        let err = t.validate(&Value::String("1".to_string())).unwrap_err();
        assert!(matches!(err, TypeError::TypeMismatch { .. }));
    }

    #[test]
    fn validate_set_rejects_duplicates() {
        let t = AttributeType::Set(Box::new(AttributeType::Int));
        assert!(
            t.validate(&Value::List(vec![Value::Int(1), Value::Int(2)]))
                .is_ok()
        );
        let err = t
            .validate(&Value::List(vec![Value::Int(1), Value::Int(1)]))
            .unwrap_err();
        assert_eq!(err, TypeError::DuplicateSetItem { index: 1 });
    }

    #[test]
    fn item_bounds_are_checked() {
        let schema =
            AttributeSchema::new("codes", AttributeType::List(Box::new(AttributeType::String)))
                .with_min_items(1)
                .with_max_items(2);

        assert!(
            schema
                .errors(&Value::List(vec![Value::String("JP".to_string())]))
                .is_empty()
        );

        let errors = schema.errors(&Value::List(vec![]));
        assert_eq!(
            errors,
            vec![TypeError::AttributeError {
                name: "codes".to_string(),
                inner: Box::new(TypeError::TooFewItems { min: 1, got: 0 }),
            }]
        );

        let three = Value::List(vec![Value::String("a".to_string()); 3]);
        assert!(matches!(
            &schema.errors(&three)[0],
            TypeError::AttributeError { inner, .. }
                if **inner == (TypeError::TooManyItems { max: 2, got: 3 })
        ));
    }

    #[test]
    fn block_rejects_unknown_attributes() {
        let block = BlockSchema::new()
            .attribute(AttributeSchema::new("name", AttributeType::String).required());

        let attrs = HashMap::from([
            ("name".to_string(), Value::String("x".to_string())),
            ("extra".to_string(), Value::Bool(true)),
        ]);
        let errors = block.validate(&attrs).unwrap_err();
        assert_eq!(
            errors,
            vec![TypeError::UnknownAttribute {
                name: "extra".to_string()
            }]
        );
    }

    #[test]
    fn block_treats_empty_list_as_missing() {
        let inner = BlockSchema::new();
        let statements = AttributeType::List(Box::new(AttributeType::Block(Box::new(inner))));
        let block =
            BlockSchema::new().attribute(AttributeSchema::new("statement", statements).required());

        let attrs = HashMap::from([("statement".to_string(), Value::List(vec![]))]);
        let errors = block.validate(&attrs).unwrap_err();
        assert_eq!(
            errors[0],
            TypeError::MissingRequired {
                name: "statement".to_string()
            }
        );
    }

    #[test]
    fn exclusive_block_allows_one_populated_attribute() {
        let empty =
            || AttributeType::List(Box::new(AttributeType::Block(Box::new(BlockSchema::new()))));
        let block = BlockSchema::new()
            .attribute(AttributeSchema::new("allow", empty()).with_max_items(1))
            .attribute(AttributeSchema::new("block", empty()).with_max_items(1))
            .exclusive();

        let one = HashMap::from([
            ("allow".to_string(), block_list(vec![HashMap::new()])),
            ("block".to_string(), Value::List(vec![])),
        ]);
        assert!(block.validate(&one).is_ok());

        let two = HashMap::from([
            ("allow".to_string(), block_list(vec![HashMap::new()])),
            ("block".to_string(), block_list(vec![HashMap::new()])),
        ]);
        let errors = block.validate(&two).unwrap_err();
        assert_eq!(
            errors,
            vec![TypeError::ConflictingAttributes {
                names: vec!["allow".to_string(), "block".to_string()]
            }]
        );
    }

    #[test]
    fn exactly_one_block_rejects_empty_body() {
        let empty =
            || AttributeType::List(Box::new(AttributeType::Block(Box::new(BlockSchema::new()))));
        let block = BlockSchema::new()
            .attribute(AttributeSchema::new("allow", empty()).with_max_items(1))
            .attribute(AttributeSchema::new("block", empty()).with_max_items(1))
            .exactly_one();

        let one = HashMap::from([("block".to_string(), block_list(vec![HashMap::new()]))]);
        assert!(block.validate(&one).is_ok());

        let unset = HashMap::from([("allow".to_string(), Value::List(vec![]))]);
        let expected = vec![TypeError::NoAttributeSet {
            names: vec!["allow".to_string(), "block".to_string()],
        }];
        assert_eq!(block.validate(&unset).unwrap_err(), expected);
        assert_eq!(block.validate(&HashMap::new()).unwrap_err(), expected);
        assert_eq!(
            expected[0].to_string(),
            "One of allow, block must be set"
        );
    }

    #[test]
    fn nested_errors_carry_their_path() {
        let inner =
            BlockSchema::new().attribute(AttributeSchema::new("size", AttributeType::Int));
        let outer = AttributeSchema::new(
            "constraint",
            AttributeType::List(Box::new(AttributeType::Block(Box::new(inner)))),
        );

        let value = block_list(vec![HashMap::from([(
            "size".to_string(),
            Value::String("big".to_string()),
        )])]);
        let errors = outer.errors(&value);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "Attribute 'constraint': List item at index 0: Attribute 'size': Type mismatch: expected Int, got String"
        );
    }

    #[test]
    fn validate_resource_schema() {
        let schema = ResourceSchema::new("resource")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("count", types::positive_int()))
            .attribute(AttributeSchema::new("enabled", AttributeType::Bool));

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("my-resource".to_string()));
        attrs.insert("count".to_string(), Value::Int(5));
        attrs.insert("enabled".to_string(), Value::Bool(true));

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn missing_required_attribute() {
        let schema = ResourceSchema::new("bucket")
            .attribute(AttributeSchema::new("name", AttributeType::String).required());

        let attrs = HashMap::new();
        let result = schema.validate(&attrs);
        assert!(result.is_err());
    }

    #[test]
    fn string_length_bounds() {
        let ok = Value::String("abc".to_string());
        assert!(validate_string_length(&ok, 1, 3).is_ok());
        assert!(validate_string_length(&ok, 4, 10).is_err());
        assert!(validate_string_length(&Value::String(String::new()), 1, 3).is_err());
        assert!(validate_string_length(&Value::Int(1), 1, 3).is_err());
    }

    #[test]
    fn int_range_bounds() {
        assert!(validate_int_range(&Value::Int(0), 0, 10).is_ok());
        assert!(validate_int_range(&Value::Int(10), 0, 10).is_ok());
        assert!(validate_int_range(&Value::Int(11), 0, 10).is_err());
        assert!(validate_int_range(&Value::Int(-1), 0, 10).is_err());
    }
}
