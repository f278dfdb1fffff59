//! Seek query construction.
//!
//! Pure functions turning compiled rules, decoded boundary values and a
//! traversal direction into the parts of a [`QuerySpec`](keyset_proto::QuerySpec).
//!
//! For rules `a, b, c` the seek predicate is
//!
//! ```text
//! a ⋄ x OR (a = x AND b ⋄ y) OR (a = x AND b = y AND c ⋄ z)
//! ```
//!
//! where `⋄` is `>` for an ASC key walked forward or a DESC key walked
//! backward, and `<` otherwise.

use crate::plan::CompiledRule;
use keyset_proto::{
    Comparison, Direction, Order, OrderTerm, SeekClause, SeekCondition, SeekPredicate, Value,
};

/// ORDER BY terms. Backward traversal flips every key.
pub fn build_order(rules: &[CompiledRule], direction: Direction) -> Vec<OrderTerm> {
    rules
        .iter()
        .map(|rule| OrderTerm {
            column: rule.column().clone(),
            order: if direction.is_backward() {
                rule.order().flip()
            } else {
                rule.order()
            },
        })
        .collect()
}

/// Range operator for one key.
pub fn seek_op(order: Order, direction: Direction) -> Comparison {
    match (direction.is_backward(), order) {
        (false, Order::Asc) | (true, Order::Desc) => Comparison::Gt,
        _ => Comparison::Lt,
    }
}

/// Seek predicate past the boundary `values`. `None` when there is no
/// boundary.
pub fn build_predicate(
    rules: &[CompiledRule],
    values: &[Value],
    direction: Direction,
) -> Option<SeekPredicate> {
    if values.is_empty() {
        return None;
    }

    let width = rules.len().min(values.len());
    let clauses = (0..width)
        .map(|i| {
            let mut conditions: Vec<SeekCondition> = rules[..i]
                .iter()
                .zip(values)
                .map(|(rule, value)| SeekCondition {
                    column: rule.column().clone(),
                    op: Comparison::Eq,
                    value: value.clone(),
                })
                .collect();

            conditions.push(SeekCondition {
                column: rules[i].column().clone(),
                op: seek_op(rules[i].order(), direction),
                value: values[i].clone(),
            });

            SeekClause { conditions }
        })
        .collect();

    Some(SeekPredicate { clauses })
}

/// Positional arguments: clause `i` binds `values[0..=i]`.
pub fn build_args(values: &[Value]) -> Vec<Value> {
    (0..values.len())
        .flat_map(|i| values[..=i].iter().cloned())
        .collect()
}

/// Rows to fetch for a page of `limit`: one extra row signals more data.
pub fn fetch_limit(limit: usize) -> usize {
    limit.saturating_add(1)
}
