//! Carina WAFv2 Provider
//!
//! Translates WAFv2 rule groups between the declarative block form used in
//! configuration and the tagged-union wire form of the WAFv2 API.
//!
//! - [`schemas`] declares the block shapes and their constraints
//! - [`expand`] turns declarative blocks into [`wire`] types
//! - [`flatten`] turns [`wire`] types back into declarative blocks
//! - [`normalize`] makes both sides comparable

mod blocks;
pub mod config;
pub mod expand;
pub mod flatten;
pub mod normalize;
pub mod schemas;
mod transcode;
pub mod validation;
pub mod wire;

pub use config::Wafv2Config;
pub use expand::{ExpandError, expand_rule, expand_rule_group, expand_rules, expand_statement};
pub use flatten::{
    flatten_rule, flatten_rule_action, flatten_rule_group, flatten_rules, flatten_statement,
};
pub use normalize::{equivalent, normalize};
