//! Schema catalog for keyset pagination.
//!
//! The catalog maps record types onto tables and logical keys onto columns,
//! and is the in-memory implementation of [`SchemaResolver`].

mod entity;
mod field;
mod resolver;
mod schema;
mod types;

pub use entity::EntityDef;
pub use field::FieldDef;
pub use resolver::SchemaResolver;
pub use schema::SchemaBundle;
pub use types::{FieldType, ScalarType};
