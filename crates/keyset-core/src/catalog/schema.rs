//! Schema bundle - versioned snapshot of the record types a paginator can
//! target.

use super::resolver::SchemaResolver;
use super::EntityDef;
use crate::error::Error;
use keyset_proto::ValueKind;
use rkyv::{Archive, Deserialize, Serialize};
use std::collections::HashMap;

/// A versioned snapshot of the entity definitions.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct SchemaBundle {
    /// Schema version (monotonically increasing).
    pub version: u64,
    /// Entity definitions keyed by name.
    pub entities: HashMap<String, EntityDef>,
}

impl SchemaBundle {
    /// Create an empty schema bundle.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            entities: HashMap::new(),
        }
    }

    /// Add an entity to the schema.
    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    /// Get an entity by name.
    pub fn get_entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// List all entity names.
    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.keys().map(|s| s.as_str()).collect()
    }

    fn entity(&self, record_type: &str) -> Result<&EntityDef, Error> {
        self.get_entity(record_type)
            .ok_or_else(|| Error::UnknownSchema(record_type.to_string()))
    }

    /// Serialize the schema bundle to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| keyset_proto::Error::Serialization(e.to_string()).into())
    }

    /// Deserialize a schema bundle from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| keyset_proto::Error::Deserialization(e.to_string()).into())
    }
}

impl Default for SchemaBundle {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SchemaResolver for SchemaBundle {
    fn resolve_table(&self, record_type: &str) -> Result<String, Error> {
        Ok(self.entity(record_type)?.table.clone())
    }

    fn resolve_column(&self, record_type: &str, key: &str) -> Result<String, Error> {
        let field = self
            .entity(record_type)?
            .get_field(key)
            .ok_or_else(|| Error::UnknownKey {
                record: record_type.to_string(),
                key: key.to_string(),
            })?;

        if !field.field_type.is_sortable() {
            return Err(Error::InvalidRule(format!("field {key:?} is not sortable")));
        }

        Ok(field.column.clone())
    }

    fn resolve_kind(&self, record_type: &str, key: &str) -> Option<ValueKind> {
        self.get_entity(record_type)?
            .get_field(key)?
            .field_type
            .scalar_type()
            .value_kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldDef, FieldType, ScalarType};

    fn sample_schema() -> SchemaBundle {
        let user = EntityDef::new("User", "users")
            .with_field(FieldDef::new("id", FieldType::scalar(ScalarType::Int64)))
            .with_field(
                FieldDef::new("createdAt", FieldType::scalar(ScalarType::Timestamp))
                    .with_column("created_at"),
            )
            .with_field(FieldDef::new("tags", FieldType::array_scalar(ScalarType::String)));

        let post = EntityDef::new("Post", "posts")
            .with_field(FieldDef::new("id", FieldType::scalar(ScalarType::Uuid)))
            .with_field(FieldDef::new("title", FieldType::scalar(ScalarType::String)));

        SchemaBundle::new(1).with_entity(user).with_entity(post)
    }

    #[test]
    fn test_schema_bundle_builder() {
        let schema = sample_schema();

        assert_eq!(schema.version, 1);
        assert_eq!(schema.entities.len(), 2);
        assert!(schema.get_entity("User").is_some());
        assert!(schema.get_entity("NonExistent").is_none());
    }

    #[test]
    fn test_resolve_table_and_column() {
        let schema = sample_schema();

        assert_eq!(schema.resolve_table("User").unwrap(), "users");
        assert_eq!(schema.resolve_column("User", "createdAt").unwrap(), "created_at");
        assert_eq!(schema.resolve_column("Post", "title").unwrap(), "title");
    }

    #[test]
    fn test_resolve_errors() {
        let schema = sample_schema();

        assert!(matches!(
            schema.resolve_table("Comment"),
            Err(Error::UnknownSchema(name)) if name == "Comment"
        ));
        assert!(matches!(
            schema.resolve_column("User", "missing"),
            Err(Error::UnknownKey { key, .. }) if key == "missing"
        ));
        assert!(matches!(
            schema.resolve_column("User", "tags"),
            Err(Error::InvalidRule(_))
        ));
    }

    #[test]
    fn test_resolve_kind() {
        let schema = sample_schema();

        assert_eq!(schema.resolve_kind("User", "createdAt"), Some(ValueKind::Timestamp));
        assert_eq!(schema.resolve_kind("Post", "id"), Some(ValueKind::Uuid));
        assert_eq!(schema.resolve_kind("User", "missing"), None);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let schema = sample_schema();
        let bytes = schema.to_bytes().unwrap();
        let decoded = SchemaBundle::from_bytes(&bytes).unwrap();

        assert_eq!(schema, decoded);
    }
}
