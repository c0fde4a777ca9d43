//! Logical connectives with compound flattening.
//!
//! `a.and(b).and(c)` keeps a single flattened `AND` sequence rather than a
//! left-leaning tree, so `(a AND b) AND (c AND d)` renders as
//! `a AND b AND c AND d`. Opposite-kind compounds stay nested and are
//! parenthesised when rendered.

use super::{Connective, Expr, Expression, IntoExpression};

fn connect(op: Connective, lhs: Expr, rhs: Expr) -> Expr {
    let mut parts = Vec::with_capacity(2);
    push_flattened(op, lhs, &mut parts);
    push_flattened(op, rhs, &mut parts);
    Expr::Connective { op, parts }
}

fn push_flattened(op: Connective, expr: Expr, parts: &mut Vec<Expr>) {
    match expr {
        Expr::Connective {
            op: inner,
            parts: inner_parts,
        } if inner == op => parts.extend(inner_parts),
        other => parts.push(other),
    }
}

impl Expression<bool> {
    /// Conjunction; adjacent `AND` compounds are merged.
    pub fn and(&self, rhs: impl IntoExpression<bool>) -> Expression<bool> {
        Expression::wrap(connect(
            Connective::And,
            self.node().clone(),
            rhs.into_expression().into_node(),
        ))
    }

    /// Disjunction; adjacent `OR` compounds are merged.
    pub fn or(&self, rhs: impl IntoExpression<bool>) -> Expression<bool> {
        Expression::wrap(connect(
            Connective::Or,
            self.node().clone(),
            rhs.into_expression().into_node(),
        ))
    }

    /// `NOT (expr)`.
    pub fn negate(&self) -> Expression<bool> {
        Expression::wrap(Expr::Not(Box::new(self.node().clone())))
    }
}

/// Variadic conjunction: `and!(a, b, c)`.
#[macro_export]
macro_rules! and {
    ($first:expr $(, $rest:expr)+ $(,)?) => {{
        let acc = $first;
        $(let acc = acc.and($rest);)+
        acc
    }};
}

/// Variadic disjunction: `or!(a, b, c)`.
#[macro_export]
macro_rules! or {
    ($first:expr $(, $rest:expr)+ $(,)?) => {{
        let acc = $first;
        $(let acc = acc.or($rest);)+
        acc
    }};
}
