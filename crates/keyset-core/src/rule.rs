//! Paging rules.
//!
//! A [`Rule`] describes one sort key of a page query. Rules are ordered:
//! the first rule is the most significant key and the last one is the final
//! tie-breaker, which should be unique per row.

use crate::codec::CustomCodec;
use crate::error::Error;
use keyset_proto::{Order, Value, ValueKind};
use std::sync::Arc;

/// One sort key.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Logical key, used to read boundary values from rows.
    pub key: String,
    /// Physical SQL expression. Resolved from the schema when unset.
    pub expr: Option<String>,
    /// Sort direction. Falls back to the paginator order when unset.
    pub order: Option<Order>,
    /// Substitute for NULL values of this key.
    pub null_replacement: Option<Value>,
    /// SQL type the expression is cast to.
    pub sql_type: Option<String>,
    /// Declared value kind of this key.
    pub kind: Option<ValueKind>,
    /// Custom cursor representation.
    pub codec: Option<Arc<dyn CustomCodec>>,
}

impl Rule {
    /// Create a rule for `key` with every option unset.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expr: None,
            order: None,
            null_replacement: None,
            sql_type: None,
            kind: None,
            codec: None,
        }
    }

    /// Ascending rule.
    pub fn asc(key: impl Into<String>) -> Self {
        Self::new(key).with_order(Order::Asc)
    }

    /// Descending rule.
    pub fn desc(key: impl Into<String>) -> Self {
        Self::new(key).with_order(Order::Desc)
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    /// Use a pre-resolved SQL expression instead of asking the schema.
    pub fn with_expr(mut self, expr: impl Into<String>) -> Self {
        self.expr = Some(expr.into());
        self
    }

    /// Sort NULLs as `value`.
    pub fn with_null_replacement(mut self, value: impl Into<Value>) -> Self {
        self.null_replacement = Some(value.into());
        self
    }

    pub fn with_sql_type(mut self, sql_type: impl Into<String>) -> Self {
        self.sql_type = Some(sql_type.into());
        self
    }

    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn CustomCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Structural validation, independent of the schema.
    pub fn validate(&self) -> Result<(), Error> {
        if self.key.trim().is_empty() {
            return Err(Error::InvalidRule("empty key".to_string()));
        }

        if matches!(&self.expr, Some(expr) if expr.trim().is_empty()) {
            return Err(Error::InvalidRule(format!("blank expression for {:?}", self.key)));
        }

        if matches!(&self.sql_type, Some(t) if t.trim().is_empty()) {
            return Err(Error::InvalidRule(format!("blank sql type for {:?}", self.key)));
        }

        if let (Some(kind), Some(replacement)) = (self.kind, &self.null_replacement) {
            if replacement.kind().is_some_and(|k| k != kind) {
                return Err(Error::InvalidRule(format!(
                    "null replacement for {:?} is not {}",
                    self.key, kind
                )));
            }
        }

        Ok(())
    }
}

/// Build rules for `keys`, leaving every order unset.
pub fn rules_for_keys<I, S>(keys: I) -> Vec<Rule>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    keys.into_iter().map(Rule::new).collect()
}
