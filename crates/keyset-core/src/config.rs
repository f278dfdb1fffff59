//! Paginator configuration.

use crate::codec::DEFAULT_MAX_TOKEN_LEN;
use crate::error::Error;
use crate::query::PlaceholderStyle;
use keyset_proto::Order;
use serde::{Deserialize, Serialize};

/// Default sort key.
pub const DEFAULT_KEY: &str = "id";

/// Default page size.
pub const DEFAULT_LIMIT: usize = 10;

/// Default sort direction for rules without their own.
pub const DEFAULT_ORDER: Order = Order::Desc;

/// Paginator configuration.
///
/// Every field has a default, so partial JSON documents load:
///
/// ```json
/// {"keys": ["created_at", "id"], "limit": 25, "order": "desc", "placeholder": "dollar"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginatorConfig {
    /// Sort keys, most significant first.
    pub keys: Vec<String>,

    /// Page size.
    pub limit: usize,

    /// Order for rules without their own.
    pub order: Order,

    /// Upper bound on the page size, if any.
    pub max_limit: Option<usize>,

    /// Placeholder syntax for rendered SQL.
    pub placeholder: PlaceholderStyle,

    /// Upper bound on accepted cursor token length.
    pub max_token_len: usize,
}

impl PaginatorConfig {
    pub fn new() -> Self {
        Self {
            keys: vec![DEFAULT_KEY.to_string()],
            limit: DEFAULT_LIMIT,
            order: DEFAULT_ORDER,
            max_limit: None,
            placeholder: PlaceholderStyle::default(),
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
        }
    }

    /// Load from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the sort keys.
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Set the page size.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the default order.
    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Cap the page size.
    pub fn with_max_limit(mut self, max_limit: usize) -> Self {
        self.max_limit = Some(max_limit);
        self
    }

    /// Set the placeholder syntax.
    pub fn with_placeholder(mut self, placeholder: PlaceholderStyle) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Set the token length bound.
    pub fn with_max_token_len(mut self, max_token_len: usize) -> Self {
        self.max_token_len = max_token_len;
        self
    }

    /// Check the values are usable.
    pub fn validate(&self) -> Result<(), Error> {
        if self.keys.is_empty() {
            return Err(Error::NoRule);
        }
        if self.limit == 0 || self.max_limit.is_some_and(|max| self.limit > max) {
            return Err(Error::InvalidLimit(self.limit));
        }
        if self.max_token_len == 0 {
            return Err(Error::Config("max_token_len must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PaginatorConfig::default();
        assert_eq!(config.keys, vec!["id".to_string()]);
        assert_eq!(config.limit, 10);
        assert_eq!(config.order, Order::Desc);
        assert_eq!(config.max_limit, None);
        assert_eq!(config.placeholder, PlaceholderStyle::Question);
        assert_eq!(config.max_token_len, 8 * 1024);
    }

    #[test]
    fn test_builders() {
        let config = PaginatorConfig::new()
            .with_keys(["created_at", "id"])
            .with_limit(50)
            .with_order(Order::Asc)
            .with_max_limit(100)
            .with_placeholder(PlaceholderStyle::Dollar)
            .with_max_token_len(1024);

        assert_eq!(config.keys, vec!["created_at", "id"]);
        assert_eq!(config.limit, 50);
        assert_eq!(config.max_limit, Some(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            PaginatorConfig::from_json(r#"{"keys":["created_at","id"],"order":"asc","placeholder":"dollar"}"#)
                .unwrap();

        assert_eq!(config.keys, vec!["created_at", "id"]);
        assert_eq!(config.order, Order::Asc);
        assert_eq!(config.placeholder, PlaceholderStyle::Dollar);
        assert_eq!(config.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_from_json_rejects_bad_documents() {
        assert!(matches!(
            PaginatorConfig::from_json(r#"{"order":"sideways"}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            PaginatorConfig::from_json(r#"{"page_size":3}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            PaginatorConfig::from_json(r#"{"limit":0}"#),
            Err(Error::InvalidLimit(0))
        ));
        assert!(matches!(
            PaginatorConfig::from_json(r#"{"limit":20,"max_limit":10}"#),
            Err(Error::InvalidLimit(20))
        ));
        assert!(matches!(
            PaginatorConfig::from_json(r#"{"keys":[]}"#),
            Err(Error::NoRule)
        ));
    }
}
