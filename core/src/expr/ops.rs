//! Comparison, range, list, and arithmetic operators on expressions.

use super::{ArithOp, CmpOp, Expr, Expression, IntoExpression};
use crate::types::{NumericType, Persisted};
use core::ops::{Add, Div, Mul, Rem, Sub};

fn cmp(op: CmpOp, lhs: Expr, rhs: Expr) -> Expression<bool> {
    Expression::wrap(Expr::Cmp {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

impl<T: Persisted> Expression<T> {
    pub fn eq(&self, rhs: impl IntoExpression<T>) -> Expression<bool> {
        cmp(CmpOp::Eq, self.node().clone(), rhs.into_expression().into_node())
    }

    pub fn neq(&self, rhs: impl IntoExpression<T>) -> Expression<bool> {
        cmp(CmpOp::Neq, self.node().clone(), rhs.into_expression().into_node())
    }

    pub fn less(&self, rhs: impl IntoExpression<T>) -> Expression<bool> {
        cmp(CmpOp::Less, self.node().clone(), rhs.into_expression().into_node())
    }

    pub fn less_eq(&self, rhs: impl IntoExpression<T>) -> Expression<bool> {
        cmp(CmpOp::LessEq, self.node().clone(), rhs.into_expression().into_node())
    }

    pub fn greater(&self, rhs: impl IntoExpression<T>) -> Expression<bool> {
        cmp(CmpOp::Greater, self.node().clone(), rhs.into_expression().into_node())
    }

    pub fn greater_eq(&self, rhs: impl IntoExpression<T>) -> Expression<bool> {
        cmp(CmpOp::GreaterEq, self.node().clone(), rhs.into_expression().into_node())
    }

    pub fn is_null(&self) -> Expression<bool> {
        Expression::wrap(Expr::NullCheck {
            not: false,
            expr: Box::new(self.node().clone()),
        })
    }

    pub fn is_not_null(&self) -> Expression<bool> {
        Expression::wrap(Expr::NullCheck {
            not: true,
            expr: Box::new(self.node().clone()),
        })
    }

    pub fn between(
        &self,
        low: impl IntoExpression<T>,
        high: impl IntoExpression<T>,
    ) -> Expression<bool> {
        Expression::wrap(Expr::Between {
            expr: Box::new(self.node().clone()),
            low: Box::new(low.into_expression().into_node()),
            high: Box::new(high.into_expression().into_node()),
        })
    }

    /// `expr IN (a, b, ...)`. An empty list collapses to `FALSE`, a
    /// singleton to `expr = a`.
    pub fn in_list<I>(&self, items: I) -> Expression<bool>
    where
        I: IntoIterator,
        I::Item: IntoExpression<T>,
    {
        in_list_impl(self.node().clone(), items, false)
    }

    /// `expr NOT IN (a, b, ...)`. An empty list collapses to `TRUE`, a
    /// singleton to `expr != a`.
    pub fn not_in_list<I>(&self, items: I) -> Expression<bool>
    where
        I: IntoIterator,
        I::Item: IntoExpression<T>,
    {
        in_list_impl(self.node().clone(), items, true)
    }

    /// `CAST(expr AS <affinity of U>)`.
    pub fn cast<U: Persisted>(&self) -> Expression<U> {
        Expression::wrap(Expr::Cast {
            expr: Box::new(self.node().clone()),
            to: U::TYPE.storage_class(),
        })
    }
}

fn in_list_impl<T, I>(expr: Expr, items: I, not: bool) -> Expression<bool>
where
    I: IntoIterator,
    I::Item: IntoExpression<T>,
{
    let items: Vec<Expr> = items
        .into_iter()
        .map(|item| item.into_expression().into_node())
        .collect();
    match items.len() {
        0 => Expression::wrap(Expr::Raw(if not { "TRUE" } else { "FALSE" }.into())),
        1 => {
            let rhs = items.into_iter().next().unwrap_or(Expr::Raw("NULL".into()));
            Expression::wrap(Expr::Cmp {
                op: if not { CmpOp::Neq } else { CmpOp::Eq },
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            })
        }
        _ => Expression::wrap(Expr::InList {
            not,
            expr: Box::new(expr),
            items,
        }),
    }
}

fn arith<T>(op: ArithOp, lhs: Expr, rhs: Expr) -> Expression<T> {
    Expression::wrap(Expr::Arith {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

macro_rules! arith_op {
    ($trait:ident, $method:ident, $variant:ident) => {
        impl<T: NumericType, R: IntoExpression<T>> $trait<R> for Expression<T> {
            type Output = Expression<T>;

            fn $method(self, rhs: R) -> Expression<T> {
                arith(
                    ArithOp::$variant,
                    self.into_node(),
                    rhs.into_expression().into_node(),
                )
            }
        }
    };
}

arith_op!(Add, add, Plus);
arith_op!(Sub, sub, Minus);
arith_op!(Mul, mul, Times);
arith_op!(Div, div, Divide);
arith_op!(Rem, rem, Mod);

#[cfg(test)]
mod tests {
    use super::super::{literal, render};
    use super::*;

    #[test]
    fn comparison_renders_with_spaces() {
        let e = literal(1i64).greater(0i64);
        assert_eq!(render(e.node()).sql, "1 > 0");
    }

    #[test]
    fn arithmetic_is_parenthesised() {
        let e = literal(1i64) + 2i64;
        assert_eq!(render(e.node()).sql, "(1 + 2)");
        let e = literal(10i64) % 3i64;
        assert_eq!(render(e.node()).sql, "(10 % 3)");
    }

    #[test]
    fn between_renders() {
        let e = literal(5i64).between(1i64, 10i64);
        assert_eq!(render(e.node()).sql, "5 BETWEEN 1 AND 10");
    }

    #[test]
    fn empty_in_list_collapses_to_false() {
        let e = literal(1i64).in_list(Vec::<i64>::new());
        assert_eq!(render(e.node()).sql, "FALSE");
        let e = literal(1i64).not_in_list(Vec::<i64>::new());
        assert_eq!(render(e.node()).sql, "TRUE");
    }

    #[test]
    fn singleton_in_list_collapses_to_comparison() {
        let e = literal(1i64).in_list([5i64]);
        assert_eq!(render(e.node()).sql, "1 = 5");
        let e = literal(1i64).not_in_list([5i64]);
        assert_eq!(render(e.node()).sql, "1 != 5");
    }

    #[test]
    fn full_in_list_renders() {
        let e = literal(1i64).in_list([1i64, 2, 3]);
        assert_eq!(render(e.node()).sql, "1 IN (1, 2, 3)");
    }

    #[test]
    fn null_checks() {
        let e = literal(1i64).is_null();
        assert_eq!(render(e.node()).sql, "1 IS NULL");
        let e = literal(1i64).is_not_null();
        assert_eq!(render(e.node()).sql, "1 IS NOT NULL");
    }

    #[test]
    fn cast_uses_target_affinity() {
        let e = literal(1i64).cast::<String>();
        assert_eq!(render(e.node()).sql, "CAST(1 AS TEXT)");
    }
}
