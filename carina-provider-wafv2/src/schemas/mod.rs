//! WAFv2 schema definitions

pub mod types;
pub mod wafv2;

use carina_core::schema::ResourceSchema;

use crate::config::Wafv2Config;

/// Returns all WAFv2 schemas
pub fn all_schemas(config: &Wafv2Config) -> Vec<ResourceSchema> {
    vec![wafv2::rule_group_schema(config.max_nesting_level)]
}
