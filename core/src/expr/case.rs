//! `CASE WHEN` expression builders.
//!
//! Two forms: [`case`] starts a searched case (`CASE WHEN <pred> THEN ...`)
//! and [`case_of`] a base-value case (`CASE <base> WHEN <match> THEN ...`).

use super::{Expr, Expression, IntoExpression};
use core::marker::PhantomData;

/// Searched `CASE`: conditions are predicates.
pub struct Case<T> {
    whens: Vec<(Expr, Expr)>,
    otherwise: Option<Expr>,
    _marker: PhantomData<fn() -> T>,
}

/// Starts a searched `CASE WHEN` expression.
pub fn case<T>() -> Case<T> {
    Case {
        whens: Vec::new(),
        otherwise: None,
        _marker: PhantomData,
    }
}

impl<T> Case<T> {
    pub fn when(
        mut self,
        condition: Expression<bool>,
        result: impl IntoExpression<T>,
    ) -> Self {
        self.whens.push((
            condition.into_node(),
            result.into_expression().into_node(),
        ));
        self
    }

    pub fn otherwise(mut self, result: impl IntoExpression<T>) -> Self {
        self.otherwise = Some(result.into_expression().into_node());
        self
    }

    pub fn end(self) -> Expression<T> {
        Expression::wrap(Expr::Case {
            base: None,
            whens: self.whens,
            otherwise: self.otherwise.map(Box::new),
        })
    }
}

/// Base-value `CASE`: conditions are values compared against the base.
pub struct CaseOf<B, T> {
    base: Expr,
    whens: Vec<(Expr, Expr)>,
    otherwise: Option<Expr>,
    _marker: PhantomData<fn(B) -> T>,
}

/// Starts a `CASE <base> WHEN <match> THEN ...` expression.
pub fn case_of<B, T>(base: Expression<B>) -> CaseOf<B, T> {
    CaseOf {
        base: base.into_node(),
        whens: Vec::new(),
        otherwise: None,
        _marker: PhantomData,
    }
}

impl<B, T> CaseOf<B, T> {
    pub fn when(
        mut self,
        matches: impl IntoExpression<B>,
        result: impl IntoExpression<T>,
    ) -> Self {
        self.whens.push((
            matches.into_expression().into_node(),
            result.into_expression().into_node(),
        ));
        self
    }

    pub fn otherwise(mut self, result: impl IntoExpression<T>) -> Self {
        self.otherwise = Some(result.into_expression().into_node());
        self
    }

    pub fn end(self) -> Expression<T> {
        Expression::wrap(Expr::Case {
            base: Some(Box::new(self.base)),
            whens: self.whens,
            otherwise: self.otherwise.map(Box::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::{literal, render};
    use super::*;

    #[test]
    fn searched_case() {
        let e = case::<String>()
            .when(literal(1i64).greater(0i64), "pos")
            .when(literal(1i64).less(0i64), "neg")
            .otherwise("zero")
            .end();
        assert_eq!(
            render(e.node()).sql,
            "CASE WHEN 1 > 0 THEN 'pos' WHEN 1 < 0 THEN 'neg' ELSE 'zero' END"
        );
    }

    #[test]
    fn base_value_case() {
        let e = case_of::<i64, String>(literal(2i64))
            .when(1i64, "one")
            .when(2i64, "two")
            .end();
        assert_eq!(
            render(e.node()).sql,
            "CASE 2 WHEN 1 THEN 'one' WHEN 2 THEN 'two' END"
        );
    }
}
