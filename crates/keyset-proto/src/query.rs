//! Query IR produced for the external query engine.
//!
//! A page query is an ordered list of sort terms, an optional seek predicate
//! (a disjunction of conjunctions), the positional arguments bound to that
//! predicate, and a row limit that already includes the has-more sentinel.

use crate::order::Order;
use crate::value::Value;

/// A resolved sort column.
///
/// Carries the logical key, the SQL expression that was rendered for it, and
/// the value substituted for NULL (if the expression is wrapped in
/// `COALESCE`). Executors that do not speak SQL evaluate on `key` and apply
/// `coalesce` themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct SortColumn {
    /// Logical key name.
    pub key: String,
    /// Physical SQL expression.
    pub expr: String,
    /// NULL substitute applied by the expression.
    pub coalesce: Option<Value>,
}

/// One entry of an ORDER BY list.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    pub column: SortColumn,
    pub order: Order,
}

/// Comparison operator in a seek condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `=`
    Eq,
    /// `>`
    Gt,
    /// `<`
    Lt,
}

impl Comparison {
    /// SQL operator text.
    pub fn as_sql(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Gt => ">",
            Comparison::Lt => "<",
        }
    }
}

/// `column op value`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeekCondition {
    pub column: SortColumn,
    pub op: Comparison,
    pub value: Value,
}

/// A conjunction of conditions: equality on every more significant key
/// followed by one range comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct SeekClause {
    pub conditions: Vec<SeekCondition>,
}

/// A disjunction of [`SeekClause`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct SeekPredicate {
    pub clauses: Vec<SeekClause>,
}

impl SeekPredicate {
    /// Bound values in placeholder order.
    pub fn args(&self) -> Vec<Value> {
        self.clauses
            .iter()
            .flat_map(|clause| clause.conditions.iter().map(|c| c.value.clone()))
            .collect()
    }

    /// Number of placeholders the predicate references.
    pub fn placeholder_count(&self) -> usize {
        self.clauses.iter().map(|c| c.conditions.len()).sum()
    }
}

/// The complete page query handed to the query engine.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// Ordering, most significant key first.
    pub order_by: Vec<OrderTerm>,
    /// Seek predicate; `None` on the first page.
    pub predicate: Option<SeekPredicate>,
    /// Positional arguments for the predicate placeholders.
    pub args: Vec<Value>,
    /// Rows to fetch (page size + 1).
    pub limit: usize,
}

impl QuerySpec {
    /// Check if the query is unbounded (first page).
    pub fn is_unbounded(&self) -> bool {
        self.predicate.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(key: &str) -> SortColumn {
        SortColumn {
            key: key.into(),
            expr: key.into(),
            coalesce: None,
        }
    }

    #[test]
    fn test_predicate_args_follow_clause_order() {
        let predicate = SeekPredicate {
            clauses: vec![
                SeekClause {
                    conditions: vec![SeekCondition {
                        column: column("a"),
                        op: Comparison::Gt,
                        value: Value::Int64(1),
                    }],
                },
                SeekClause {
                    conditions: vec![
                        SeekCondition {
                            column: column("a"),
                            op: Comparison::Eq,
                            value: Value::Int64(1),
                        },
                        SeekCondition {
                            column: column("b"),
                            op: Comparison::Gt,
                            value: Value::Int64(2),
                        },
                    ],
                },
            ],
        };

        assert_eq!(
            predicate.args(),
            vec![Value::Int64(1), Value::Int64(1), Value::Int64(2)]
        );
        assert_eq!(predicate.placeholder_count(), 3);
    }

    #[test]
    fn test_comparison_sql() {
        assert_eq!(Comparison::Eq.as_sql(), "=");
        assert_eq!(Comparison::Gt.as_sql(), ">");
        assert_eq!(Comparison::Lt.as_sql(), "<");
    }
}
