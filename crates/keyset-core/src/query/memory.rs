//! In-memory query engine.
//!
//! Evaluates a [`QuerySpec`] over a vector of rows with SQL semantics:
//! sort columns are read by logical key and coalesced, any comparison with
//! a NULL operand is false, and NULLs sort after every value in ascending
//! order (before every value in descending order).

use super::engine::{KeysetRow, QueryEngine};
use keyset_proto::{Comparison, Order, OrderTerm, QuerySpec, SeekCondition, SortColumn, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

/// In-memory evaluation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryEngineError {
    #[error("values of key {key:?} are not comparable")]
    Incomparable { key: String },
}

/// A row of named values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryRow {
    fields: BTreeMap<String, Value>,
}

impl MemoryRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl KeysetRow for MemoryRow {
    fn key_value(&self, key: &str) -> Option<Value> {
        self.fields.get(key).cloned()
    }
}

/// Reference executor over in-memory rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine<R = MemoryRow> {
    rows: Vec<R>,
}

impl<R: KeysetRow + Clone> MemoryEngine<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows }
    }

    pub fn push(&mut self, row: R) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<R: KeysetRow + Clone> QueryEngine for MemoryEngine<R> {
    type Row = R;
    type Error = MemoryEngineError;

    fn execute(&self, spec: &QuerySpec) -> Result<Vec<R>, MemoryEngineError> {
        let mut selected = Vec::new();
        for row in &self.rows {
            let keep = match &spec.predicate {
                None => true,
                Some(predicate) => {
                    let mut any = false;
                    for clause in &predicate.clauses {
                        if all_hold(row, &clause.conditions)? {
                            any = true;
                            break;
                        }
                    }
                    any
                }
            };
            if keep {
                selected.push(row.clone());
            }
        }

        sort_rows(&mut selected, &spec.order_by)?;
        selected.truncate(spec.limit);
        Ok(selected)
    }
}

fn all_hold<R: KeysetRow>(row: &R, conditions: &[SeekCondition]) -> Result<bool, MemoryEngineError> {
    for condition in conditions {
        if !holds(row, condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn holds<R: KeysetRow>(row: &R, condition: &SeekCondition) -> Result<bool, MemoryEngineError> {
    let left = column_value(row, &condition.column);
    if left.is_null() || condition.value.is_null() {
        return Ok(false);
    }

    let ordering = compare_values(&left, &condition.value).ok_or_else(|| {
        MemoryEngineError::Incomparable {
            key: condition.column.key.clone(),
        }
    })?;

    Ok(match condition.op {
        Comparison::Eq => ordering == Ordering::Equal,
        Comparison::Gt => ordering == Ordering::Greater,
        Comparison::Lt => ordering == Ordering::Less,
    })
}

/// Row value of a sort column with its NULL substitute applied.
fn column_value<R: KeysetRow>(row: &R, column: &SortColumn) -> Value {
    match row.key_value(&column.key) {
        Some(value) if !value.is_null() => value,
        _ => column.coalesce.clone().unwrap_or(Value::Null),
    }
}

fn sort_rows<R: KeysetRow>(rows: &mut [R], order_by: &[OrderTerm]) -> Result<(), MemoryEngineError> {
    let mut failure = None;

    rows.sort_by(|a, b| {
        for term in order_by {
            let left = column_value(a, &term.column);
            let right = column_value(b, &term.column);
            let ordering = match compare_nullable(&left, &right) {
                Some(ordering) => ordering,
                None => {
                    failure.get_or_insert_with(|| MemoryEngineError::Incomparable {
                        key: term.column.key.clone(),
                    });
                    Ordering::Equal
                }
            };
            let ordering = match term.order {
                Order::Asc => ordering,
                Order::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Total order used for sorting: NULL is greater than every value.
fn compare_nullable(a: &Value, b: &Value) -> Option<Ordering> {
    match (a.is_null(), b.is_null()) {
        (true, true) => Some(Ordering::Equal),
        (true, false) => Some(Ordering::Greater),
        (false, true) => Some(Ordering::Less),
        (false, false) => compare_values(a, b),
    }
}

/// Compare two non-null values. `None` for incompatible kinds.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
        (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
        (Value::Int32(a), Value::Int64(b)) => Some(i64::from(*a).cmp(b)),
        (Value::Int64(a), Value::Int32(b)) => Some(a.cmp(&i64::from(*b))),
        (Value::Float64(a), Value::Float64(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
        (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
