//! String functions, `LIKE`, and concatenation.

use super::{Expr, Expression, IntoExpression};
use crate::types::TextType;
use compact_str::CompactString;

impl<T: TextType> Expression<T> {
    pub fn like(&self, pattern: impl IntoExpression<String>) -> Expression<bool> {
        Expression::wrap(Expr::Like {
            not: false,
            lhs: Box::new(self.node().clone()),
            rhs: Box::new(pattern.into_expression().into_node()),
        })
    }

    pub fn not_like(&self, pattern: impl IntoExpression<String>) -> Expression<bool> {
        Expression::wrap(Expr::Like {
            not: true,
            lhs: Box::new(self.node().clone()),
            rhs: Box::new(pattern.into_expression().into_node()),
        })
    }

    pub fn lower(&self) -> Expression<T> {
        self.call1("LOWER")
    }

    pub fn upper(&self) -> Expression<T> {
        self.call1("UPPER")
    }

    pub fn trim(&self) -> Expression<T> {
        self.call1("TRIM")
    }

    /// `SUBSTR(expr, start[, length])`; `start` is 1-based as in SQLite.
    pub fn substr(&self, start: i64, length: Option<i64>) -> Expression<T> {
        let mut args = vec![self.node().clone(), super::literal(start).into_node()];
        if let Some(length) = length {
            args.push(super::literal(length).into_node());
        }
        Expression::wrap(Expr::Call {
            name: CompactString::new("SUBSTR"),
            args,
        })
    }

    /// `a || b`, merging adjacent separator-less concatenations.
    pub fn concat(&self, other: impl IntoExpression<T>) -> Expression<String> {
        let mut parts = Vec::with_capacity(2);
        push_concat_part(self.node().clone(), &mut parts);
        push_concat_part(other.into_expression().into_node(), &mut parts);
        Expression::wrap(Expr::Concat {
            separator: None,
            parts,
        })
    }

    fn call1(&self, name: &'static str) -> Expression<T> {
        Expression::wrap(Expr::Call {
            name: CompactString::new(name),
            args: vec![self.node().clone()],
        })
    }
}

fn push_concat_part(expr: Expr, parts: &mut Vec<Expr>) {
    match expr {
        Expr::Concat {
            separator: None,
            parts: inner,
        } => parts.extend(inner),
        other => parts.push(other),
    }
}

/// `a || 'sep' || b || 'sep' || c`; with `None` the parts join directly.
pub fn concat_with<T: TextType>(
    separator: Option<&str>,
    parts: impl IntoIterator<Item = Expression<T>>,
) -> Expression<String> {
    Expression::wrap(Expr::Concat {
        separator: separator.map(CompactString::new),
        parts: parts.into_iter().map(Expression::into_node).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::{literal, render};
    use super::*;

    fn text(s: &str) -> Expression<String> {
        literal(s.to_owned())
    }

    #[test]
    fn like_forms() {
        assert_eq!(render(text("x").like("a%").node()).sql, "'x' LIKE 'a%'");
        assert_eq!(
            render(text("x").not_like("a%").node()).sql,
            "'x' NOT LIKE 'a%'"
        );
    }

    #[test]
    fn named_wrappers() {
        assert_eq!(render(text("x").lower().node()).sql, "LOWER('x')");
        assert_eq!(render(text("x").upper().node()).sql, "UPPER('x')");
        assert_eq!(render(text("x").trim().node()).sql, "TRIM('x')");
    }

    #[test]
    fn substr_with_and_without_length() {
        assert_eq!(
            render(text("abcdef").substr(2, Some(3)).node()).sql,
            "SUBSTR('abcdef', 2, 3)"
        );
        assert_eq!(
            render(text("abcdef").substr(2, None).node()).sql,
            "SUBSTR('abcdef', 2)"
        );
    }

    #[test]
    fn concat_chains_flatten() {
        let e = text("a").concat(text("b")).concat(text("c"));
        assert_eq!(render(e.node()).sql, "'a' || 'b' || 'c'");
    }

    #[test]
    fn concat_with_separator() {
        let e = concat_with(Some(", "), [text("a"), text("b")]);
        assert_eq!(render(e.node()).sql, "'a' || ', ' || 'b'");
    }
}
