//! Paginator builder.
//!
//! [`Paginator`] collects rules, page size, default order and the request
//! cursor, then compiles them into a [`PagePlan`] against a schema.
//!
//! ```ignore
//! let mut paginator = Paginator::new();
//! paginator
//!     .set_rules(vec![Rule::desc("created_at"), Rule::desc("id")])
//!     .set_limit(20)
//!     .set_after_cursor(token);
//! let page = paginator.paginate(&schema, "User", &engine)?;
//! ```

use crate::catalog::SchemaResolver;
use crate::codec::DEFAULT_MAX_TOKEN_LEN;
use crate::config::{PaginatorConfig, DEFAULT_LIMIT, DEFAULT_ORDER};
use crate::error::Error;
use crate::plan::{compile_rules, Page, PagePlan};
use crate::query::{PlaceholderStyle, QueryEngine};
use crate::rule::{rules_for_keys, Rule};
use keyset_proto::{Cursor, Order};
use tracing::{debug, instrument};

/// Mutable paging request builder.
#[derive(Debug, Clone)]
pub struct Paginator {
    rules: Vec<Rule>,
    limit: usize,
    order: Option<Order>,
    max_limit: Option<usize>,
    max_token_len: usize,
    placeholder: PlaceholderStyle,
    cursor: Cursor,
}

impl Paginator {
    /// Paginator over `id`, 10 per page, descending.
    pub fn new() -> Self {
        Self::from_config(&PaginatorConfig::default())
    }

    /// Build a paginator from configuration. The cursor starts empty.
    pub fn from_config(config: &PaginatorConfig) -> Self {
        Self {
            rules: rules_for_keys(config.keys.iter().cloned()),
            limit: config.limit,
            order: Some(config.order),
            max_limit: config.max_limit,
            max_token_len: config.max_token_len,
            placeholder: config.placeholder,
            cursor: Cursor::new(),
        }
    }

    /// Replace the rule set.
    pub fn set_rules(&mut self, rules: impl IntoIterator<Item = Rule>) -> &mut Self {
        self.rules = rules.into_iter().collect();
        self
    }

    /// Replace the rule set with one order-less rule per key.
    pub fn set_keys<I, S>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules = rules_for_keys(keys);
        self
    }

    pub fn set_limit(&mut self, limit: usize) -> &mut Self {
        self.limit = limit;
        self
    }

    /// Set the order used by rules without their own.
    pub fn set_order(&mut self, order: Order) -> &mut Self {
        self.order = Some(order);
        self
    }

    /// Remove the default order. Every rule must then carry its own.
    pub fn clear_order(&mut self) -> &mut Self {
        self.order = None;
        self
    }

    pub fn set_after_cursor(&mut self, token: impl Into<String>) -> &mut Self {
        self.cursor.after = Some(token.into());
        self
    }

    pub fn set_before_cursor(&mut self, token: impl Into<String>) -> &mut Self {
        self.cursor.before = Some(token.into());
        self
    }

    /// Replace both cursor tokens.
    pub fn set_cursor(&mut self, cursor: Cursor) -> &mut Self {
        self.cursor = cursor;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn order(&self) -> Option<Order> {
        self.order
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Check everything that does not need the schema.
    pub fn validate(&self) -> Result<(), Error> {
        if self.rules.is_empty() {
            return Err(Error::NoRule);
        }

        if self.limit == 0 || self.max_limit.is_some_and(|max| self.limit > max) {
            return Err(Error::InvalidLimit(self.limit));
        }

        for rule in &self.rules {
            rule.validate()?;
            if rule.order.is_none() && self.order.is_none() {
                return Err(Error::InvalidOrder(format!("no order for key {:?}", rule.key)));
            }
        }

        Ok(())
    }

    /// Compile into an immutable plan for `record_type`.
    #[instrument(skip(self, resolver), fields(rules = self.rules.len(), limit = self.limit))]
    pub fn compile<S: SchemaResolver + ?Sized>(
        &self,
        resolver: &S,
        record_type: &str,
    ) -> Result<PagePlan, Error> {
        self.validate()?;
        let rules = compile_rules(&self.rules, self.order, resolver, record_type)?;

        debug!(
            exprs = ?rules.iter().map(|r| r.expr()).collect::<Vec<_>>(),
            "Compiled page plan"
        );

        Ok(PagePlan::new(record_type, rules, self.limit)
            .with_max_token_len(self.max_token_len)
            .with_placeholder(self.placeholder))
    }

    /// Compile and fetch the page addressed by the current cursor.
    pub fn paginate<S, E>(
        &self,
        resolver: &S,
        record_type: &str,
        engine: &E,
    ) -> Result<Page<E::Row>, Error>
    where
        S: SchemaResolver + ?Sized,
        E: QueryEngine,
    {
        self.compile(resolver, record_type)?
            .paginate(engine, &self.cursor)
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            limit: DEFAULT_LIMIT,
            order: Some(DEFAULT_ORDER),
            max_limit: None,
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
            placeholder: PlaceholderStyle::default(),
            cursor: Cursor::new(),
        }
    }
}
