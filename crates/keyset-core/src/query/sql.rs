//! SQL rendering of page queries.
//!
//! Two forms are supported:
//!
//! - [`SqlRenderer::render`] produces a WHERE fragment with placeholders and
//!   the arguments to bind, for drivers with parameter binding.
//! - [`SqlRenderer::render_inline`] produces a self-contained statement tail
//!   `WHERE … ORDER BY … LIMIT n` with escaped literals.

use keyset_proto::{OrderTerm, QuerySpec, SeekPredicate, Value};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// A value with no SQL literal form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    /// Timestamp outside the years 0000 to 9999.
    #[error("timestamp {0}us has no SQL literal")]
    TimestampOutOfRange(i64),
}

/// Placeholder syntax for bound arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `?` (MySQL, SQLite, most drivers).
    #[default]
    Question,
    /// `$1`, `$2`, … (PostgreSQL).
    Dollar,
}

/// Rendered page query with bound arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    /// Predicate without the `WHERE` keyword. `None` on the first page.
    pub where_clause: Option<String>,
    /// ORDER BY list without the keyword.
    pub order_by: String,
    /// Row limit, already including the has-more row.
    pub limit: usize,
    /// Arguments for the placeholders, in order.
    pub args: Vec<Value>,
}

impl SqlQuery {
    /// `WHERE … ORDER BY … LIMIT n`, ready to append to a SELECT.
    pub fn tail(&self) -> String {
        let mut sql = String::new();
        if let Some(predicate) = &self.where_clause {
            let _ = write!(sql, "WHERE {} ", predicate);
        }
        let _ = write!(sql, "ORDER BY {} LIMIT {}", self.order_by, self.limit);
        sql
    }
}

/// Renders [`QuerySpec`]s to SQL text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlRenderer {
    style: PlaceholderStyle,
}

impl SqlRenderer {
    pub fn new(style: PlaceholderStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> PlaceholderStyle {
        self.style
    }

    /// Render with placeholders.
    pub fn render(&self, spec: &QuerySpec) -> SqlQuery {
        SqlQuery {
            where_clause: spec
                .predicate
                .as_ref()
                .map(|p| render_predicate(p, |n| self.placeholder(n))),
            order_by: render_order_by(&spec.order_by),
            limit: spec.limit,
            args: spec.args.clone(),
        }
    }

    /// Render with every argument inlined as a literal.
    pub fn render_inline(&self, spec: &QuerySpec) -> Result<String, LiteralError> {
        let where_clause = match &spec.predicate {
            Some(p) => {
                let literals = p
                    .args()
                    .iter()
                    .map(sql_literal)
                    .collect::<Result<Vec<_>, _>>()?;
                Some(render_predicate(p, |n| literals[n - 1].clone()))
            }
            None => None,
        };

        let inline = SqlQuery {
            where_clause,
            order_by: render_order_by(&spec.order_by),
            limit: spec.limit,
            args: Vec::new(),
        };
        Ok(inline.tail())
    }

    fn placeholder(&self, n: usize) -> String {
        match self.style {
            PlaceholderStyle::Question => "?".to_string(),
            PlaceholderStyle::Dollar => format!("${}", n),
        }
    }
}

/// `expr ORDER, expr ORDER, …`
pub fn render_order_by(terms: &[OrderTerm]) -> String {
    terms
        .iter()
        .map(|t| format!("{} {}", t.column.expr, t.order.as_sql()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render a predicate, calling `slot` with the 1-based placeholder number
/// for every bound value.
fn render_predicate(predicate: &SeekPredicate, mut slot: impl FnMut(usize) -> String) -> String {
    let mut n = 0;
    predicate
        .clauses
        .iter()
        .map(|clause| {
            let conditions: Vec<String> = clause
                .conditions
                .iter()
                .map(|c| {
                    n += 1;
                    format!("{} {} {}", c.column.expr, c.op.as_sql(), slot(n))
                })
                .collect();

            if conditions.len() == 1 {
                conditions.join("")
            } else {
                format!("({})", conditions.join(" AND "))
            }
        })
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// SQL literal for a value.
///
/// Strings are single-quoted with embedded quotes doubled. Bytes render as
/// `X'…'`, UUIDs as quoted canonical text, timestamps as quoted RFC 3339.
pub fn sql_literal(value: &Value) -> Result<String, LiteralError> {
    let literal = match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Int32(i) => i.to_string(),
        Value::Int64(i) => i.to_string(),
        Value::Float64(f) if f.is_nan() => "'NaN'".to_string(),
        Value::Float64(f) if f.is_infinite() => {
            if *f > 0.0 {
                "'Infinity'".to_string()
            } else {
                "'-Infinity'".to_string()
            }
        }
        Value::Float64(f) => f.to_string(),
        Value::String(s) => quote(s),
        Value::Bytes(b) => format!("X'{}'", hex::encode_upper(b)),
        Value::Timestamp(micros) => quote(&timestamp_text(*micros)?),
        Value::Uuid(u) => quote(&uuid_text(u)),
    };
    Ok(literal)
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn timestamp_text(micros: i64) -> Result<String, LiteralError> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000)
        .ok()
        .and_then(|at| at.format(&Rfc3339).ok())
        .ok_or(LiteralError::TimestampOutOfRange(micros))
}

fn uuid_text(u: &[u8; 16]) -> String {
    let h = hex::encode(u);
    format!(
        "{}-{}-{}-{}-{}",
        &h[0..8],
        &h[8..12],
        &h[12..16],
        &h[16..20],
        &h[20..32]
    )
}
