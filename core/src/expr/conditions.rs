//! Free-standing condition helpers.

use super::{Expr, Expression};
use crate::error::Result;
use crate::query::QueryBuilder;

/// `NOT (expr)`.
pub fn not(expr: Expression<bool>) -> Expression<bool> {
    expr.negate()
}

/// `EXISTS (subquery)`.
pub fn exists(query: &QueryBuilder) -> Result<Expression<bool>> {
    let seed = query.seed()?;
    Ok(Expression::wrap(Expr::Exists {
        sql: seed.sql,
        types: seed.types,
    }))
}

/// `NOT (EXISTS (subquery))`.
pub fn not_exists(query: &QueryBuilder) -> Result<Expression<bool>> {
    exists(query).map(|e| e.negate())
}

/// Folds predicates into one flattened conjunction; `None` for an empty
/// iterator.
pub fn and_all(
    predicates: impl IntoIterator<Item = Expression<bool>>,
) -> Option<Expression<bool>> {
    predicates.into_iter().reduce(|acc, next| acc.and(next))
}

/// Folds predicates into one flattened disjunction; `None` for an empty
/// iterator.
pub fn or_any(
    predicates: impl IntoIterator<Item = Expression<bool>>,
) -> Option<Expression<bool>> {
    predicates.into_iter().reduce(|acc, next| acc.or(next))
}
