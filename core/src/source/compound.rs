//! Compound selects: `UNION`, `UNION ALL`, `INTERSECT`, `EXCEPT`.
//!
//! Constituents must be simple selects (no ORDER BY, no LIMIT) with equal
//! result-column counts; violations fail at composition. Precedence is
//! left to right: `(A op1 B) op2 C`. The compound's result columns are the
//! first constituent's, rebound alias-less so an outer ORDER BY can name
//! them directly.

use super::ColumnSet;
use super::column::{AnyColumn, ColumnDef};
use crate::builder::{SqlBuilder, StatementSeed, build_seed};
use crate::error::{CoreError, Result};
use crate::expr::{Expr, Expression, IntoOperand, IntoOperandList};
use crate::identity::Identity;
use crate::query::{
    LimitTerm, OrderTerm, QueryBuilder, QuerySeed, SeedColumn, SelectFrom, SortOrder, append_tail,
    wrap_count,
};
use crate::types::Persisted;
use compact_str::CompactString;
use std::sync::Arc;

/// The four compound operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundOp {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl CompoundOp {
    pub const fn keyword(self) -> &'static str {
        match self {
            CompoundOp::Union => "UNION",
            CompoundOp::UnionAll => "UNION ALL",
            CompoundOp::Intersect => "INTERSECT",
            CompoundOp::Except => "EXCEPT",
        }
    }
}

/// Two or more simple selects combined by compound operators, with an
/// optional trailing ORDER BY / LIMIT applying to the whole compound.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundSelect {
    first: QueryBuilder,
    rest: Vec<(CompoundOp, QueryBuilder)>,
    order_by: Vec<OrderTerm>,
    limit: Option<LimitTerm>,
    offset: Option<LimitTerm>,
}

impl CompoundSelect {
    pub(crate) fn compose(
        first: QueryBuilder,
        op: CompoundOp,
        second: QueryBuilder,
    ) -> Result<Self> {
        check_constituent(&first)?;
        let compound = CompoundSelect {
            first,
            rest: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        };
        compound.add(op, second)
    }

    fn add(mut self, op: CompoundOp, next: QueryBuilder) -> Result<Self> {
        check_constituent(&next)?;
        if next.result_column_count() != self.first.result_column_count() {
            return Err(CoreError::schema(format!(
                "compound constituents disagree on column count: {} vs {}",
                self.first.result_column_count(),
                next.result_column_count()
            )));
        }
        self.rest.push((op, next));
        Ok(self)
    }

    pub fn union(self, other: QueryBuilder) -> Result<Self> {
        self.add(CompoundOp::Union, other)
    }

    pub fn union_all(self, other: QueryBuilder) -> Result<Self> {
        self.add(CompoundOp::UnionAll, other)
    }

    pub fn intersect(self, other: QueryBuilder) -> Result<Self> {
        self.add(CompoundOp::Intersect, other)
    }

    pub fn except(self, other: QueryBuilder) -> Result<Self> {
        self.add(CompoundOp::Except, other)
    }

    // ==================== trailing clauses ====================

    pub fn order_by(mut self, term: impl IntoOperand, order: SortOrder) -> Self {
        self.order_by.push(OrderTerm {
            expr: term.into_operand(),
            order,
            collation: None,
        });
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = if limit < 0 {
            None
        } else {
            Some(LimitTerm::Value(limit))
        };
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(LimitTerm::Value(offset));
        self
    }

    // ==================== columns ====================

    /// The first constituent's result column at `index`, rebound to an
    /// alias-less reference for outer clauses.
    pub fn column_at<T: Persisted>(&self, index: usize) -> Result<Expression<T>> {
        let columns = self.first.seed_columns();
        let column = columns.get(index).ok_or_else(|| {
            CoreError::schema(format!(
                "compound has {} column(s), index {index} out of range",
                columns.len()
            ))
        })?;
        Ok(Expression::wrap(Expr::AliasRef {
            alias: column.name.clone(),
            ty: column.ty,
        }))
    }

    pub(crate) fn seed_columns(&self) -> Vec<SeedColumn> {
        self.first.seed_columns()
    }

    pub(crate) fn delegating_columns(&self) -> Vec<AnyColumn> {
        self.first
            .seed_columns()
            .into_iter()
            .map(|column| {
                AnyColumn::from_def(
                    Arc::new(ColumnDef::synthetic(column.name, column.ty)),
                    Identity::new(CompactString::default()),
                )
            })
            .collect()
    }

    // ==================== output ====================

    /// `first op1 second op2 third ...` with the trailing clauses.
    pub fn seed(&self) -> Result<QuerySeed> {
        let seed = build_seed(|b| self.append_to(b))?;
        Ok(QuerySeed {
            columns: self.seed_columns(),
            sql: seed.sql,
            types: seed.types,
            source: ColumnSet::Compound(Box::new(self.clone())),
        })
    }

    pub(crate) fn append_to(&self, b: &mut SqlBuilder) -> Result<()> {
        self.first.append_to(b)?;
        for (op, constituent) in &self.rest {
            b.append_char(' ').append(op.keyword()).append_char(' ');
            constituent.append_to(b)?;
        }
        append_tail(b, &self.order_by, self.limit, self.offset)
    }

    /// `SELECT COUNT(*)` over the whole compound.
    pub fn count_seed(&self) -> Result<StatementSeed> {
        let seed = self.seed()?;
        Ok(wrap_count(seed.sql, seed.types))
    }

    /// An outer select reading from this compound as a sub-query.
    pub fn select(&self, columns: impl IntoOperandList) -> SelectFrom {
        SelectFrom::new(columns.into_operand_list(), self.clone().into())
    }

    pub fn select_all(&self) -> SelectFrom {
        let columns = self
            .seed_columns()
            .into_iter()
            .map(|column| Expr::AliasRef {
                alias: column.name,
                ty: column.ty,
            })
            .collect();
        SelectFrom::new(columns, self.clone().into())
    }
}

fn check_constituent(builder: &QueryBuilder) -> Result<()> {
    if !builder.is_simple() {
        return Err(CoreError::schema(
            "compound constituents must not carry ORDER BY or LIMIT",
        ));
    }
    Ok(())
}

impl From<CompoundSelect> for ColumnSet {
    fn from(compound: CompoundSelect) -> Self {
        ColumnSet::Compound(Box::new(compound))
    }
}
