//! Compiled page plans.
//!
//! A [`PagePlan`] is the immutable result of compiling a rule set against a
//! schema: physical expressions are resolved, NULL replacement and casts are
//! applied, and default orders are filled in. Plans hold no per-request
//! state; the cursor is passed to every call, so one plan can serve
//! concurrent requests.
//!
//! Per request a plan goes through
//!
//! ```text
//! decode cursor -> build query -> (engine executes) -> trim/reverse -> encode cursor
//! ```
//!
//! either in one step with [`PagePlan::paginate`] or split around an
//! externally executed query with [`PagePlan::build_query`] and
//! [`PagePlan::finish`].

use crate::catalog::SchemaResolver;
use crate::codec::{CodecField, CursorError, Decoder, Encoder, DEFAULT_MAX_TOKEN_LEN};
use crate::error::Error;
use crate::query::{
    build_args, build_order, build_predicate, fetch_limit, sql_literal, KeysetRow, LiteralError,
    PlaceholderStyle, QueryEngine, SqlQuery, SqlRenderer,
};
use crate::rule::Rule;
use keyset_proto::{Cursor, Direction, Order, QuerySpec, SortColumn, Value, ValueKind};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// A rule after compilation.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    column: SortColumn,
    order: Order,
    field: CodecField,
}

impl CompiledRule {
    pub fn key(&self) -> &str {
        &self.column.key
    }

    /// Fully wrapped SQL expression.
    pub fn expr(&self) -> &str {
        &self.column.expr
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn null_replacement(&self) -> Option<&Value> {
        self.column.coalesce.as_ref()
    }

    /// Declared or inferred value kind.
    pub fn kind(&self) -> Option<ValueKind> {
        self.field.kind
    }

    pub fn column(&self) -> &SortColumn {
        &self.column
    }

    pub fn codec_field(&self) -> &CodecField {
        &self.field
    }

    #[cfg(test)]
    pub(crate) fn bare(key: &str, order: Order) -> Self {
        Self {
            column: SortColumn {
                key: key.to_string(),
                expr: key.to_string(),
                coalesce: None,
            },
            order,
            field: CodecField::new(key),
        }
    }
}

/// Compile `rules` for `record_type`.
///
/// The table is resolved at most once, and only when some rule needs its
/// expression resolved. The input rules are never modified.
pub(crate) fn compile_rules<S: SchemaResolver + ?Sized>(
    rules: &[Rule],
    default_order: Option<Order>,
    resolver: &S,
    record_type: &str,
) -> Result<Vec<CompiledRule>, Error> {
    if rules.is_empty() {
        return Err(Error::NoRule);
    }

    let mut seen = HashSet::new();
    let mut table: Option<String> = None;
    let mut compiled = Vec::with_capacity(rules.len());

    for rule in rules {
        rule.validate()?;

        if !seen.insert(rule.key.as_str()) {
            return Err(Error::InvalidRule(format!("duplicate key {:?}", rule.key)));
        }

        let order = rule
            .order
            .or(default_order)
            .ok_or_else(|| Error::InvalidOrder(format!("no order for key {:?}", rule.key)))?;

        let mut expr = match &rule.expr {
            Some(expr) => expr.trim().to_string(),
            None => {
                if table.is_none() {
                    table = Some(resolver.resolve_table(record_type)?);
                }
                let column = resolver.resolve_column(record_type, &rule.key)?;
                match table.as_deref() {
                    Some(table) if !table.is_empty() => format!("{}.{}", table, column),
                    _ => column,
                }
            }
        };

        let source_kind = rule
            .kind
            .or_else(|| resolver.resolve_kind(record_type, &rule.key));

        if let Some(replacement) = &rule.null_replacement {
            if let (Some(kind), Some(actual)) = (source_kind, replacement.kind()) {
                if actual != kind {
                    return Err(Error::InvalidRule(format!(
                        "null replacement for {:?} is {}, column is {}",
                        rule.key, actual, kind
                    )));
                }
            }
            let literal = sql_literal(replacement).map_err(|e| {
                Error::InvalidRule(format!("null replacement for {:?}: {}", rule.key, e))
            })?;
            expr = format!("COALESCE({}, {})", expr, literal);
        }

        let mut cast = None;
        if let Some(sql_type) = &rule.sql_type {
            expr = format!("CAST({} AS {})", expr, sql_type.trim());
            cast = cast_kind(sql_type);
        }

        let mut field = CodecField::new(rule.key.clone());
        if let Some(kind) = rule.kind.or(cast).or(source_kind) {
            field = field.with_kind(kind);
        }
        if let Some(codec) = &rule.codec {
            field = field.with_codec(codec.clone());
        }

        compiled.push(CompiledRule {
            column: SortColumn {
                key: rule.key.clone(),
                expr,
                coalesce: rule.null_replacement.clone(),
            },
            order,
            field,
        });
    }

    Ok(compiled)
}

/// Value kind produced by `CAST(… AS sql_type)`, for common SQL types.
fn cast_kind(sql_type: &str) -> Option<ValueKind> {
    let upper = sql_type.trim().to_ascii_uppercase();
    let base = upper.split('(').next().unwrap_or_default().trim();

    let kind = match base {
        "BIGINT" | "INT8" => ValueKind::Int64,
        "INT" | "INTEGER" | "INT4" => ValueKind::Int32,
        "TEXT" | "VARCHAR" | "CHAR" | "CHARACTER" | "CHARACTER VARYING" => ValueKind::String,
        "BOOL" | "BOOLEAN" => ValueKind::Bool,
        "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" | "REAL" => ValueKind::Float64,
        "UUID" => ValueKind::Uuid,
        "BYTEA" | "BLOB" => ValueKind::Bytes,
        t if t.starts_with("TIMESTAMP") => ValueKind::Timestamp,
        _ => return None,
    };
    Some(kind)
}

/// A page query ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    /// Traversal direction of this request.
    pub direction: Direction,
    /// Structured query for the engine.
    pub spec: QuerySpec,
    placeholder: PlaceholderStyle,
}

impl PageQuery {
    /// Render with placeholders in the plan's style.
    pub fn sql(&self) -> SqlQuery {
        SqlRenderer::new(self.placeholder).render(&self.spec)
    }

    /// Render as a `WHERE … ORDER BY … LIMIT n` tail with inlined literals.
    ///
    /// Fails for timestamps outside the years 0000 to 9999.
    pub fn inline_sql(&self) -> Result<String, LiteralError> {
        SqlRenderer::new(self.placeholder).render_inline(&self.spec)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    /// Rows in display order.
    pub rows: Vec<R>,
    /// Tokens for the neighbouring pages.
    pub cursor: Cursor,
    /// Whether the engine returned more rows than the page size.
    pub has_more: bool,
}

/// Immutable compiled paging plan.
#[derive(Debug, Clone)]
pub struct PagePlan {
    record_type: String,
    rules: Vec<CompiledRule>,
    fields: Vec<CodecField>,
    limit: usize,
    max_token_len: usize,
    placeholder: PlaceholderStyle,
}

impl PagePlan {
    pub(crate) fn new(record_type: impl Into<String>, rules: Vec<CompiledRule>, limit: usize) -> Self {
        let fields = rules.iter().map(|r| r.field.clone()).collect();
        Self {
            record_type: record_type.into(),
            rules,
            fields,
            limit,
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
            placeholder: PlaceholderStyle::default(),
        }
    }

    pub(crate) fn with_max_token_len(mut self, max_token_len: usize) -> Self {
        self.max_token_len = max_token_len;
        self
    }

    pub(crate) fn with_placeholder(mut self, placeholder: PlaceholderStyle) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Page size.
    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn max_token_len(&self) -> usize {
        self.max_token_len
    }

    pub fn placeholder(&self) -> PlaceholderStyle {
        self.placeholder
    }

    /// Decode the active token of `cursor` into boundary values.
    ///
    /// Returns no values for an empty cursor. NULL positions are replaced
    /// by the rule's NULL replacement when one is configured.
    pub fn decode_cursor(&self, cursor: &Cursor) -> Result<(Direction, Vec<Value>), Error> {
        let direction = cursor.direction();
        let Some(token) = cursor.active_token() else {
            return Ok((direction, Vec::new()));
        };

        let mut values = Decoder::new(&self.fields)
            .with_max_token_len(self.max_token_len)
            .decode(token)
            .map_err(|err| {
                debug!(
                    record_type = %self.record_type,
                    direction = ?direction,
                    error = %err,
                    "Rejected cursor"
                );
                Error::InvalidCursor
            })?;

        for (value, rule) in values.iter_mut().zip(&self.rules) {
            if let (true, Some(replacement)) = (value.is_null(), rule.null_replacement()) {
                *value = replacement.clone();
            }
        }

        Ok((direction, values))
    }

    /// Build the query for the page addressed by `cursor`.
    pub fn build_query(&self, cursor: &Cursor) -> Result<PageQuery, Error> {
        let (direction, values) = self.decode_cursor(cursor)?;

        let spec = QuerySpec {
            order_by: build_order(&self.rules, direction),
            predicate: build_predicate(&self.rules, &values, direction),
            args: build_args(&values),
            limit: fetch_limit(self.limit),
        };

        Ok(PageQuery {
            direction,
            spec,
            placeholder: self.placeholder,
        })
    }

    /// Turn the rows fetched for `query` into a page.
    ///
    /// Rows must be in the query's ORDER BY order. Surplus rows beyond the
    /// page size are dropped and signal `has_more`; backward pages are
    /// reversed into display order.
    pub fn finish<R: KeysetRow>(&self, query: &PageQuery, mut rows: Vec<R>) -> Result<Page<R>, Error> {
        let has_more = rows.len() > self.limit;
        rows.truncate(self.limit);

        if query.direction.is_backward() {
            rows.reverse();
        }

        let cursor = self.encode_cursor(&rows, query.direction, has_more)?;

        debug!(
            record_type = %self.record_type,
            direction = ?query.direction,
            rows = rows.len(),
            has_more,
            "Page complete"
        );

        Ok(Page {
            rows,
            cursor,
            has_more,
        })
    }

    /// Fetch the page addressed by `cursor` from `engine`.
    #[instrument(skip_all, fields(record_type = %self.record_type, limit = self.limit))]
    pub fn paginate<E: QueryEngine>(&self, engine: &E, cursor: &Cursor) -> Result<Page<E::Row>, Error> {
        let query = self.build_query(cursor)?;
        let rows = engine
            .execute(&query.spec)
            .map_err(|e| Error::ExecutionFailed(Box::new(e)))?;
        self.finish(&query, rows)
    }

    /// Cursor tokens for a page in display order.
    ///
    /// `after` comes from the last row when walking backward or when more
    /// rows follow; `before` comes from the first row when walking forward
    /// or when more rows precede a backward page.
    fn encode_cursor<R: KeysetRow>(
        &self,
        rows: &[R],
        direction: Direction,
        has_more: bool,
    ) -> Result<Cursor, Error> {
        let mut cursor = Cursor::new();

        let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
            return Ok(cursor);
        };

        if direction.is_backward() || has_more {
            cursor.after = Some(self.encode_row(last)?);
        }

        if direction.is_forward() || (has_more && direction.is_backward()) {
            cursor.before = Some(self.encode_row(first)?);
        }

        Ok(cursor)
    }

    /// Token for the sort-key values of `row`.
    pub fn encode_row<R: KeysetRow>(&self, row: &R) -> Result<String, Error> {
        let values = self
            .rules
            .iter()
            .map(|rule| {
                row.key_value(rule.key())
                    .ok_or_else(|| CursorError::MissingKey(rule.key().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::CursorEncoding(e.to_string()))?;

        self.encode_values(&values)
    }

    /// Token for an explicit tuple of sort-key values, in rule order.
    pub fn encode_values(&self, values: &[Value]) -> Result<String, Error> {
        Encoder::new(&self.fields)
            .encode(values)
            .map_err(|e| Error::CursorEncoding(e.to_string()))
    }
}
