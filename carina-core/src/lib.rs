//! Carina Core
//!
//! Declarative value model and schema layer shared by Carina providers

pub mod resource;
pub mod schema;
