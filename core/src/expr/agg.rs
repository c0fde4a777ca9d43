//! Aggregate functions.

use super::{AggregateFunc, Expr, Expression};
use crate::types::{NumericType, Persisted};
use compact_str::CompactString;

fn aggregate<T>(func: AggregateFunc, distinct: bool, expr: Expr) -> Expression<T> {
    Expression::wrap(Expr::Aggregate {
        func,
        distinct,
        expr: Some(Box::new(expr)),
    })
}

impl<T: Persisted> Expression<T> {
    pub fn min(&self) -> Expression<T> {
        aggregate(AggregateFunc::Min, false, self.node().clone())
    }

    pub fn max(&self) -> Expression<T> {
        aggregate(AggregateFunc::Max, false, self.node().clone())
    }

    /// `COUNT(expr)`: non-null rows.
    pub fn count(&self) -> Expression<i64> {
        aggregate(AggregateFunc::Count, false, self.node().clone())
    }

    /// `COUNT(DISTINCT expr)`.
    pub fn count_distinct(&self) -> Expression<i64> {
        aggregate(AggregateFunc::Count, true, self.node().clone())
    }

    /// `GROUP_CONCAT(expr[, 'sep'])`; the separator is a literal.
    pub fn group_concat(&self, separator: Option<&str>) -> Expression<String> {
        Expression::wrap(Expr::GroupConcat {
            expr: Box::new(self.node().clone()),
            separator: separator.map(CompactString::new),
        })
    }
}

impl<T: NumericType> Expression<T> {
    /// `AVG(expr)`; always REAL in SQLite.
    pub fn avg(&self) -> Expression<f64> {
        aggregate(AggregateFunc::Avg, false, self.node().clone())
    }

    pub fn sum(&self) -> Expression<T> {
        aggregate(AggregateFunc::Sum, false, self.node().clone())
    }
}

/// `COUNT(*)`.
pub fn count_star() -> Expression<i64> {
    Expression::wrap(Expr::Aggregate {
        func: AggregateFunc::Count,
        distinct: false,
        expr: None,
    })
}
