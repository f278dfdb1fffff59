//! Query execution seam.

use keyset_proto::{QuerySpec, Value};
use std::collections::{BTreeMap, HashMap};

/// A fetched row that can report its sort-key values.
pub trait KeysetRow {
    /// Value of a logical key. `None` when the row has no such key;
    /// [`Value::Null`] when the key is present but NULL.
    fn key_value(&self, key: &str) -> Option<Value>;
}

/// Executes page queries.
///
/// Implementations must return rows in the query's ORDER BY order and at
/// most [`QuerySpec::limit`] of them.
pub trait QueryEngine {
    type Row: KeysetRow;
    type Error: std::error::Error + Send + Sync + 'static;

    fn execute(&self, spec: &QuerySpec) -> Result<Vec<Self::Row>, Self::Error>;
}

impl<E: QueryEngine + ?Sized> QueryEngine for &E {
    type Row = E::Row;
    type Error = E::Error;

    fn execute(&self, spec: &QuerySpec) -> Result<Vec<Self::Row>, Self::Error> {
        (**self).execute(spec)
    }
}

impl KeysetRow for HashMap<String, Value> {
    fn key_value(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl KeysetRow for BTreeMap<String, Value> {
    fn key_value(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}
