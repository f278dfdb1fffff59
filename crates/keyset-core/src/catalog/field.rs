//! Field definitions for entities.

use super::types::FieldType;
use rkyv::{Archive, Deserialize, Serialize};

/// A field definition within an entity.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct FieldDef {
    /// Logical field name (the key rules refer to).
    pub name: String,
    /// Physical column name. Defaults to the field name.
    pub column: String,
    /// Field data type.
    pub field_type: FieldType,
}

impl FieldDef {
    /// Create a new field whose column shares its name.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            name,
            field_type,
        }
    }

    /// Create a nullable scalar field.
    pub fn optional_scalar(name: impl Into<String>, scalar: super::ScalarType) -> Self {
        Self::new(name, FieldType::OptionalScalar(scalar))
    }

    /// Set the physical column name.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::ScalarType;

    #[test]
    fn test_field_def_builder() {
        let field = FieldDef::new("createdAt", FieldType::scalar(ScalarType::Timestamp))
            .with_column("created_at");

        assert_eq!(field.name, "createdAt");
        assert_eq!(field.column, "created_at");
        assert_eq!(field.field_type, FieldType::Scalar(ScalarType::Timestamp));
    }

    #[test]
    fn test_column_defaults_to_name() {
        let field = FieldDef::optional_scalar("score", ScalarType::Int64);

        assert_eq!(field.column, "score");
        assert_eq!(field.field_type, FieldType::OptionalScalar(ScalarType::Int64));
    }
}
