//! Schema resolution seam.

use crate::error::Error;
use keyset_proto::ValueKind;

/// Maps logical record types and keys onto physical tables and columns.
///
/// Plan compilation calls [`resolve_table`](Self::resolve_table) at most
/// once per compilation and [`resolve_column`](Self::resolve_column) once
/// per rule that lacks a pre-supplied expression.
pub trait SchemaResolver {
    /// Physical table for a record type.
    ///
    /// Fails with [`Error::UnknownSchema`].
    fn resolve_table(&self, record_type: &str) -> Result<String, Error>;

    /// Physical column for a logical key.
    ///
    /// Fails with [`Error::UnknownSchema`] or [`Error::UnknownKey`].
    fn resolve_column(&self, record_type: &str, key: &str) -> Result<String, Error>;

    /// Cursor value kind of a logical key, when the schema knows it.
    fn resolve_kind(&self, _record_type: &str, _key: &str) -> Option<ValueKind> {
        None
    }
}

impl<T: SchemaResolver + ?Sized> SchemaResolver for &T {
    fn resolve_table(&self, record_type: &str) -> Result<String, Error> {
        (**self).resolve_table(record_type)
    }

    fn resolve_column(&self, record_type: &str, key: &str) -> Result<String, Error> {
        (**self).resolve_column(record_type, key)
    }

    fn resolve_kind(&self, record_type: &str, key: &str) -> Option<ValueKind> {
        (**self).resolve_kind(record_type, key)
    }
}
