//! The expression algebra.
//!
//! [`Expr`] is a sealed, value-typed AST; every node serialises itself
//! through a single dispatch in [`Expr::append_to`]. [`Expression`] is the
//! phantom-typed wrapper the DSL works with: comparisons produce
//! `Expression<bool>`, arithmetic keeps the operand type, and columns
//! convert into expressions of their declared type. Nodes hold their
//! constituents by value and equate structurally.

mod agg;
mod case;
mod conditions;
mod logical;
mod ops;
mod string;

pub use agg::count_star;
pub use case::{Case, CaseOf, case, case_of};
pub use conditions::{and_all, exists, not, not_exists, or_any};
pub use string::concat_with;

use crate::builder::SqlBuilder;
use crate::error::Result;
use crate::identity::Identity;
use crate::types::{Persisted, PersistentType, SqliteValue, StorageClass};
use compact_str::CompactString;
use core::marker::PhantomData;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Neq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl CmpOp {
    const fn sql(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Neq => "!=",
            CmpOp::Less => "<",
            CmpOp::LessEq => "<=",
            CmpOp::Greater => ">",
            CmpOp::GreaterEq => ">=",
        }
    }
}

/// Arithmetic operators; rendered parenthesised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Plus,
    Minus,
    Times,
    Divide,
    Mod,
}

impl ArithOp {
    const fn sql(self) -> &'static str {
        match self {
            ArithOp::Plus => "+",
            ArithOp::Minus => "-",
            ArithOp::Times => "*",
            ArithOp::Divide => "/",
            ArithOp::Mod => "%",
        }
    }
}

/// Logical connectives; sequences are flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    const fn sql(self) -> &'static str {
        match self {
            Connective::And => " AND ",
            Connective::Or => " OR ",
        }
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    Min,
    Max,
    Avg,
    Sum,
    Count,
}

impl AggregateFunc {
    const fn name(self) -> &'static str {
        match self {
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
            AggregateFunc::Avg => "AVG",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Count => "COUNT",
        }
    }
}

/// Actions available to `RAISE` inside trigger bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaiseAction {
    Ignore,
    Rollback,
    Abort,
    Fail,
}

impl RaiseAction {
    const fn keyword(self) -> &'static str {
        match self {
            RaiseAction::Ignore => "IGNORE",
            RaiseAction::Rollback => "ROLLBACK",
            RaiseAction::Abort => "ABORT",
            RaiseAction::Fail => "FAIL",
        }
    }
}

/// The untyped expression node. Constructed through the typed DSL;
/// variants are public for rendering and structural assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// An inlined literal of a known persistent type.
    Literal {
        ty: PersistentType,
        value: SqliteValue,
    },
    /// A `?` placeholder registering its type with the builder.
    Bindable { ty: PersistentType },
    /// A fully qualified column reference: `"qualifier"."name"`.
    Column {
        qualifier: Identity,
        name: Identity,
        ty: PersistentType,
    },
    /// Raw SQL fragment (keywords such as `FALSE`, database-generated
    /// defaults).
    Raw(CompactString),
    /// `NAME(arg, arg, ...)`
    Call {
        name: CompactString,
        args: Vec<Expr>,
    },
    /// `a || 'sep' || b` (no separator: `a || b`). Never parenthesised.
    Concat {
        separator: Option<CompactString>,
        parts: Vec<Expr>,
    },
    /// `GROUP_CONCAT(expr[, 'sep'])`
    GroupConcat {
        expr: Box<Expr>,
        separator: Option<CompactString>,
    },
    /// `FUNC([DISTINCT ]expr)`; `expr == None` renders `COUNT(*)`.
    Aggregate {
        func: AggregateFunc,
        distinct: bool,
        expr: Option<Box<Expr>>,
    },
    /// `CAST(expr AS TYPE)`
    Cast { expr: Box<Expr>, to: StorageClass },
    Cmp {
        op: CmpOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Parenthesised arithmetic.
    Arith {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Like {
        not: bool,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    NullCheck { not: bool, expr: Box<Expr> },
    /// `NOT (expr)`
    Not(Box<Expr>),
    /// Flattened `AND`/`OR` sequence; opposite-kind nested compounds are
    /// parenthesised on render.
    Connective { op: Connective, parts: Vec<Expr> },
    /// `expr [NOT] IN (a, b, ...)`. Empty and singleton lists are
    /// collapsed at construction.
    InList {
        not: bool,
        expr: Box<Expr>,
        items: Vec<Expr>,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
    },
    Raise {
        action: RaiseAction,
        message: Option<CompactString>,
    },
    Case {
        base: Option<Box<Expr>>,
        whens: Vec<(Expr, Expr)>,
        otherwise: Option<Box<Expr>>,
    },
    /// `EXISTS (subquery)`; the sub-query's placeholder types splice into
    /// the outer statement.
    Exists {
        sql: String,
        types: Vec<PersistentType>,
    },
    /// A query wrapped as a scalar expression: `(sql)`.
    SubQuery {
        sql: String,
        types: Vec<PersistentType>,
    },
    /// `expr alias` in a result-column position.
    Alias { expr: Box<Expr>, alias: Identity },
    /// A reference to a previously aliased expression: just the alias.
    AliasRef {
        alias: Identity,
        ty: PersistentType,
    },
}

impl Expr {
    /// Serialises this node into the builder. The single dispatch point
    /// for SQL generation of expressions.
    pub fn append_to(&self, b: &mut SqlBuilder) -> Result<()> {
        match self {
            Expr::Literal { ty, value } => b.register_argument(*ty, value)?,
            Expr::Bindable { ty } => {
                b.register_bindable(*ty);
            }
            Expr::Column {
                qualifier, name, ..
            } => {
                b.append_identity(qualifier).append_char('.');
                b.append_identity(name);
            }
            Expr::Raw(text) => {
                b.append(text);
            }
            Expr::Call { name, args } => {
                b.append(name);
                b.append_each(args, ", ", "(", ")", |b, arg| arg.append_to(b))?;
            }
            Expr::Concat { separator, parts } => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        match separator {
                            Some(sep) => {
                                b.append(" || ");
                                append_text_literal(b, sep);
                                b.append(" || ");
                            }
                            None => {
                                b.append(" || ");
                            }
                        }
                    }
                    part.append_to(b)?;
                }
            }
            Expr::GroupConcat { expr, separator } => {
                b.append("GROUP_CONCAT(");
                expr.append_to(b)?;
                if let Some(sep) = separator {
                    b.append(", ");
                    append_text_literal(b, sep);
                }
                b.append_char(')');
            }
            Expr::Aggregate {
                func,
                distinct,
                expr,
            } => {
                b.append(func.name()).append_char('(');
                match expr {
                    Some(inner) => {
                        if *distinct {
                            b.append("DISTINCT ");
                        }
                        inner.append_to(b)?;
                    }
                    None => {
                        b.append_char('*');
                    }
                }
                b.append_char(')');
            }
            Expr::Cast { expr, to } => {
                b.append("CAST(");
                expr.append_to(b)?;
                b.append(" AS ").append(to.keyword()).append_char(')');
            }
            Expr::Cmp { op, lhs, rhs } => {
                lhs.append_to(b)?;
                b.append_char(' ').append(op.sql()).append_char(' ');
                rhs.append_to(b)?;
            }
            Expr::Arith { op, lhs, rhs } => {
                b.append_char('(');
                lhs.append_to(b)?;
                b.append_char(' ').append(op.sql()).append_char(' ');
                rhs.append_to(b)?;
                b.append_char(')');
            }
            Expr::Like { not, lhs, rhs } => {
                lhs.append_to(b)?;
                b.append(if *not { " NOT LIKE " } else { " LIKE " });
                rhs.append_to(b)?;
            }
            Expr::NullCheck { not, expr } => {
                expr.append_to(b)?;
                b.append(if *not { " IS NOT NULL" } else { " IS NULL" });
            }
            Expr::Not(expr) => {
                b.append("NOT (");
                expr.append_to(b)?;
                b.append_char(')');
            }
            Expr::Connective { op, parts } => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        b.append(op.sql());
                    }
                    let parenthesise = matches!(
                        part,
                        Expr::Connective { op: inner, .. } if inner != op
                    );
                    if parenthesise {
                        b.append_char('(');
                        part.append_to(b)?;
                        b.append_char(')');
                    } else {
                        part.append_to(b)?;
                    }
                }
            }
            Expr::InList { not, expr, items } => {
                expr.append_to(b)?;
                b.append(if *not { " NOT IN " } else { " IN " });
                b.append_each(items, ", ", "(", ")", |b, item| item.append_to(b))?;
            }
            Expr::Between { expr, low, high } => {
                expr.append_to(b)?;
                b.append(" BETWEEN ");
                low.append_to(b)?;
                b.append(" AND ");
                high.append_to(b)?;
            }
            Expr::Raise { action, message } => {
                b.append("RAISE(").append(action.keyword());
                if let Some(message) = message {
                    b.append(", ");
                    append_text_literal(b, message);
                }
                b.append_char(')');
            }
            Expr::Case {
                base,
                whens,
                otherwise,
            } => {
                b.append("CASE");
                if let Some(base) = base {
                    b.append_char(' ');
                    base.append_to(b)?;
                }
                for (condition, result) in whens {
                    b.append(" WHEN ");
                    condition.append_to(b)?;
                    b.append(" THEN ");
                    result.append_to(b)?;
                }
                if let Some(otherwise) = otherwise {
                    b.append(" ELSE ");
                    otherwise.append_to(b)?;
                }
                b.append(" END");
            }
            Expr::Exists { sql, types } => {
                b.append("EXISTS ").append_subquery(sql, types);
            }
            Expr::SubQuery { sql, types } => {
                b.append_subquery(sql, types);
            }
            Expr::Alias { expr, alias } => {
                expr.append_to(b)?;
                b.append_char(' ').append_identity(alias);
            }
            Expr::AliasRef { alias, .. } => {
                b.append_identity(alias);
            }
        }
        Ok(())
    }
}

fn append_text_literal(b: &mut SqlBuilder, text: &str) {
    b.append_char('\'');
    for ch in text.chars() {
        if ch == '\'' {
            b.append_char('\'');
        }
        b.append_char(ch);
    }
    b.append_char('\'');
}

/// A typed expression: an [`Expr`] tagged with the Rust type it evaluates
/// to. The phantom parameter never affects layout or equality.
pub struct Expression<T> {
    node: Expr,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Expression<T> {
    pub(crate) fn wrap(node: Expr) -> Self {
        Expression {
            node,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn node(&self) -> &Expr {
        &self.node
    }

    #[inline]
    pub fn into_node(self) -> Expr {
        self.node
    }

    /// `expr alias`, usable as a result column; order-by clauses can then
    /// reference the alias alone via [`Expression::alias_ref`].
    pub fn aliased(&self, alias: &str) -> Expression<T> {
        Expression::wrap(Expr::Alias {
            expr: Box::new(self.node.clone()),
            alias: Identity::new(alias),
        })
    }
}

impl<T: Persisted> Expression<T> {
    /// A reference to an alias introduced elsewhere in the statement.
    pub fn alias_ref(alias: &str) -> Expression<T> {
        Expression::wrap(Expr::AliasRef {
            alias: Identity::new(alias),
            ty: T::TYPE,
        })
    }
}

impl<T> Clone for Expression<T> {
    fn clone(&self) -> Self {
        Expression::wrap(self.node.clone())
    }
}

impl<T> core::fmt::Debug for Expression<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.node, f)
    }
}

impl<T> PartialEq for Expression<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

/// An inlined literal expression.
pub fn literal<T: Persisted>(value: T) -> Expression<T> {
    Expression::wrap(Expr::Literal {
        ty: T::TYPE,
        value: value.into_value(),
    })
}

/// A `?` placeholder whose value is supplied at execution time.
pub fn bind_arg<T: Persisted>() -> Expression<T> {
    Expression::wrap(Expr::Bindable { ty: T::TYPE })
}

/// `NAME(args...)` for functions the DSL has no wrapper for.
pub fn custom_function<T: Persisted>(
    name: &str,
    args: impl IntoIterator<Item = Expr>,
) -> Expression<T> {
    Expression::wrap(Expr::Call {
        name: CompactString::new(name),
        args: args.into_iter().collect(),
    })
}

/// `RAISE(action, 'message')`; only meaningful inside trigger bodies.
pub fn raise(action: RaiseAction, message: &str) -> Expression<i64> {
    Expression::wrap(Expr::Raise {
        action,
        message: Some(CompactString::new(message)),
    })
}

/// `RAISE(IGNORE)`.
pub fn raise_ignore() -> Expression<i64> {
    Expression::wrap(Expr::Raise {
        action: RaiseAction::Ignore,
        message: None,
    })
}

/// Conversion of values, columns, and expressions into a typed
/// [`Expression`]; the `T`-directed counterpart of `Into`.
pub trait IntoExpression<T> {
    fn into_expression(self) -> Expression<T>;
}

impl<T> IntoExpression<T> for Expression<T> {
    #[inline]
    fn into_expression(self) -> Expression<T> {
        self
    }
}

impl<T> IntoExpression<T> for &Expression<T> {
    #[inline]
    fn into_expression(self) -> Expression<T> {
        self.clone()
    }
}

impl<T: Persisted> IntoExpression<T> for T {
    #[inline]
    fn into_expression(self) -> Expression<T> {
        literal(self)
    }
}

impl<T: Persisted> IntoExpression<Option<T>> for T {
    #[inline]
    fn into_expression(self) -> Expression<Option<T>> {
        Expression::wrap(Expr::Literal {
            ty: T::TYPE,
            value: self.into_value(),
        })
    }
}

impl IntoExpression<String> for &str {
    #[inline]
    fn into_expression(self) -> Expression<String> {
        literal(self.to_owned())
    }
}

impl IntoExpression<Option<String>> for &str {
    #[inline]
    fn into_expression(self) -> Expression<Option<String>> {
        Expression::wrap(Expr::Literal {
            ty: String::TYPE,
            value: SqliteValue::Text(self.to_owned()),
        })
    }
}

/// Anything usable where an untyped expression is expected: result
/// columns, GROUP BY terms, ORDER BY terms.
pub trait IntoOperand {
    fn into_operand(self) -> Expr;
}

impl IntoOperand for Expr {
    #[inline]
    fn into_operand(self) -> Expr {
        self
    }
}

impl<T> IntoOperand for Expression<T> {
    #[inline]
    fn into_operand(self) -> Expr {
        self.into_node()
    }
}

impl<T> IntoOperand for &Expression<T> {
    #[inline]
    fn into_operand(self) -> Expr {
        self.node().clone()
    }
}

/// A heterogeneous list of operands: a single operand, a tuple of
/// operands, or a prepared `Vec<Expr>`.
pub trait IntoOperandList {
    fn into_operand_list(self) -> Vec<Expr>;
}

impl<O: IntoOperand> IntoOperandList for O {
    fn into_operand_list(self) -> Vec<Expr> {
        vec![self.into_operand()]
    }
}

impl IntoOperandList for Vec<Expr> {
    fn into_operand_list(self) -> Vec<Expr> {
        self
    }
}

macro_rules! operand_tuple {
    ($($name:ident),+) => {
        impl<$($name: IntoOperand),+> IntoOperandList for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_operand_list(self) -> Vec<Expr> {
                let ($($name,)+) = self;
                vec![$($name.into_operand()),+]
            }
        }
    };
}

operand_tuple!(A, B);
operand_tuple!(A, B, C);
operand_tuple!(A, B, C, D);
operand_tuple!(A, B, C, D, E);
operand_tuple!(A, B, C, D, E, F);
operand_tuple!(A, B, C, D, E, F, G);
operand_tuple!(A, B, C, D, E, F, G, H);

#[cfg(test)]
pub(crate) fn render(expr: &Expr) -> crate::builder::StatementSeed {
    crate::builder::build_seed(|b| expr.append_to(b)).unwrap()
}
