//! `SELECT` assembly.
//!
//! [`SelectFrom`] pairs result columns with a source set; adding a WHERE
//! clause (or [`SelectFrom::all`]) turns it into a [`QueryBuilder`], which
//! accumulates GROUP BY, HAVING, ORDER BY, LIMIT/OFFSET, and DISTINCT and
//! finally renders a [`QuerySeed`]: pure `(columns, sql, types, source)`
//! data ready for compilation.

use crate::builder::{SqlBuilder, StatementSeed, build_seed};
use crate::error::{CoreError, Result};
use crate::expr::{Expr, Expression, IntoOperand, IntoOperandList};
use crate::identity::Identity;
use crate::source::ColumnSet;
use crate::source::compound::{CompoundOp, CompoundSelect};
use crate::types::{Persisted, PersistentType, Shape, StorageClass};
use compact_str::CompactString;

/// Sort direction for ORDER BY terms and primary keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// One ORDER BY term: expression, direction, optional collation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OrderTerm {
    pub(crate) expr: Expr,
    pub(crate) order: SortOrder,
    pub(crate) collation: Option<CompactString>,
}

/// A LIMIT or OFFSET operand: an inline value or a bind placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LimitTerm {
    Value(i64),
    Bind,
}

/// A result column's derived name and persistent type.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedColumn {
    pub name: Identity,
    pub ty: PersistentType,
}

/// The pure output of a query build: result-column metadata, SQL text,
/// placeholder types, and the source set the query reads from.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySeed {
    pub columns: Vec<SeedColumn>,
    pub sql: String,
    pub types: Vec<PersistentType>,
    pub source: ColumnSet,
}

/// Result columns plus a source set; the first stage of a select.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectFrom {
    pub(crate) columns: Vec<Expr>,
    pub(crate) source: ColumnSet,
}

impl SelectFrom {
    pub(crate) fn new(columns: Vec<Expr>, source: ColumnSet) -> Self {
        SelectFrom { columns, source }
    }

    /// Restricts with a predicate.
    pub fn where_(self, predicate: Expression<bool>) -> QueryBuilder {
        QueryBuilder::from_select(self, Some(predicate.into_node()))
    }

    /// No restriction.
    pub fn all(self) -> QueryBuilder {
        QueryBuilder::from_select(self, None)
    }
}

/// Accumulates the clauses of a `SELECT` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    pub(crate) columns: Vec<Expr>,
    pub(crate) source: ColumnSet,
    pub(crate) predicate: Option<Expr>,
    pub(crate) group_by: Vec<Expr>,
    pub(crate) having: Option<Expr>,
    pub(crate) order_by: Vec<OrderTerm>,
    pub(crate) limit: Option<LimitTerm>,
    pub(crate) offset: Option<LimitTerm>,
    pub(crate) distinct: bool,
    pub(crate) count_star: bool,
}

impl QueryBuilder {
    fn from_select(select: SelectFrom, predicate: Option<Expr>) -> Self {
        QueryBuilder {
            columns: select.columns,
            source: select.source,
            predicate,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
            count_star: false,
        }
    }

    pub fn group_by(mut self, terms: impl IntoOperandList) -> Self {
        self.group_by.extend(terms.into_operand_list());
        self
    }

    pub fn having(mut self, predicate: Expression<bool>) -> Self {
        self.having = Some(predicate.into_node());
        self
    }

    pub fn order_by(mut self, term: impl IntoOperand, order: SortOrder) -> Self {
        self.order_by.push(OrderTerm {
            expr: term.into_operand(),
            order,
            collation: None,
        });
        self
    }

    /// ORDER BY with `COLLATE <name>`.
    pub fn order_by_collated(
        mut self,
        term: impl IntoOperand,
        order: SortOrder,
        collation: &str,
    ) -> Self {
        self.order_by.push(OrderTerm {
            expr: term.into_operand(),
            order,
            collation: Some(CompactString::new(collation)),
        });
        self
    }

    /// `LIMIT n`. Zero is rendered verbatim (returns no rows); a negative
    /// value omits the clause.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = if limit < 0 {
            None
        } else {
            Some(LimitTerm::Value(limit))
        };
        self
    }

    /// `LIMIT ?`, supplied at execution time.
    pub fn limit_bind(mut self) -> Self {
        self.limit = Some(LimitTerm::Bind);
        self
    }

    /// `OFFSET n`; must be non-negative (checked when the seed is built).
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(LimitTerm::Value(offset));
        self
    }

    /// `OFFSET ?`, supplied at execution time.
    pub fn offset_bind(mut self) -> Self {
        self.offset = Some(LimitTerm::Bind);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub(crate) fn as_count(mut self) -> Self {
        self.count_star = true;
        self
    }

    /// True when the builder carries neither ORDER BY nor LIMIT/OFFSET,
    /// making it a valid compound-select constituent.
    pub fn is_simple(&self) -> bool {
        self.order_by.is_empty() && self.limit.is_none() && self.offset.is_none()
    }

    pub(crate) fn result_column_count(&self) -> usize {
        if self.count_star || self.columns.is_empty() {
            1
        } else {
            self.columns.len()
        }
    }

    /// Derived result-column metadata without rendering the SQL.
    pub(crate) fn seed_columns(&self) -> Vec<SeedColumn> {
        if self.count_star || self.columns.is_empty() {
            return vec![SeedColumn {
                name: Identity::new("COUNT(*)"),
                ty: i64::TYPE,
            }];
        }
        self.columns
            .iter()
            .enumerate()
            .map(|(i, expr)| SeedColumn {
                name: column_name(expr, i),
                ty: inferred_type(expr),
            })
            .collect()
    }

    /// Renders the `SELECT` and captures the seed.
    pub fn seed(&self) -> Result<QuerySeed> {
        let seed = build_seed(|b| self.append_to(b))?;
        Ok(QuerySeed {
            columns: self.seed_columns(),
            sql: seed.sql,
            types: seed.types,
            source: self.source.clone(),
        })
    }

    pub(crate) fn append_to(&self, b: &mut SqlBuilder) -> Result<()> {
        b.append("SELECT ");
        if self.distinct {
            b.append("DISTINCT ");
        }
        if self.count_star || self.columns.is_empty() {
            b.append("COUNT(*)");
        } else {
            let mut first = true;
            for column in &self.columns {
                if !first {
                    b.append(", ");
                }
                first = false;
                column.append_to(b)?;
            }
        }
        b.append(" FROM ");
        self.source.append_from(b)?;
        if let Some(predicate) = &self.predicate {
            b.append(" WHERE ");
            predicate.append_to(b)?;
        }
        if !self.group_by.is_empty() {
            b.append(" GROUP BY ");
            let mut first = true;
            for term in &self.group_by {
                if !first {
                    b.append(", ");
                }
                first = false;
                term.append_to(b)?;
            }
        }
        if let Some(having) = &self.having {
            b.append(" HAVING ");
            having.append_to(b)?;
        }
        append_tail(b, &self.order_by, self.limit, self.offset)
    }

    /// `SELECT COUNT(*)` over this query. A seed already counting is
    /// reused; anything else is wrapped as a sub-query.
    pub fn count_seed(&self) -> Result<StatementSeed> {
        let seed = self.seed()?;
        Ok(wrap_count(seed.sql, seed.types))
    }

    /// This query as a scalar sub-expression, usable in outer WHERE and
    /// ORDER BY clauses.
    pub fn as_expression<T: Persisted>(&self) -> Result<Expression<T>> {
        let seed = self.seed()?;
        Ok(Expression::wrap(Expr::SubQuery {
            sql: seed.sql,
            types: seed.types,
        }))
    }

    // ==================== compound composition ====================

    pub fn union(self, other: QueryBuilder) -> Result<CompoundSelect> {
        CompoundSelect::compose(self, CompoundOp::Union, other)
    }

    pub fn union_all(self, other: QueryBuilder) -> Result<CompoundSelect> {
        CompoundSelect::compose(self, CompoundOp::UnionAll, other)
    }

    pub fn intersect(self, other: QueryBuilder) -> Result<CompoundSelect> {
        CompoundSelect::compose(self, CompoundOp::Intersect, other)
    }

    pub fn except(self, other: QueryBuilder) -> Result<CompoundSelect> {
        CompoundSelect::compose(self, CompoundOp::Except, other)
    }
}

/// Renders ORDER BY, LIMIT, and OFFSET; shared with compound selects.
pub(crate) fn append_tail(
    b: &mut SqlBuilder,
    order_by: &[OrderTerm],
    limit: Option<LimitTerm>,
    offset: Option<LimitTerm>,
) -> Result<()> {
    if !order_by.is_empty() {
        b.append(" ORDER BY ");
        let mut first = true;
        for term in order_by {
            if !first {
                b.append(", ");
            }
            first = false;
            term.expr.append_to(b)?;
            if let Some(collation) = &term.collation {
                b.append(" COLLATE ").append(collation);
            }
            b.append_char(' ').append(term.order.keyword());
        }
    }
    match limit {
        Some(LimitTerm::Value(value)) => {
            b.append(" LIMIT ").append_i64(value);
        }
        Some(LimitTerm::Bind) => {
            b.append(" LIMIT ");
            b.register_bindable(i64::TYPE);
        }
        None => {
            // SQLite requires a LIMIT before OFFSET; -1 means unbounded.
            if offset.is_some() {
                b.append(" LIMIT -1");
            }
        }
    }
    match offset {
        Some(LimitTerm::Value(value)) => {
            if value < 0 {
                return Err(CoreError::unsupported("OFFSET must be non-negative"));
            }
            b.append(" OFFSET ").append_i64(value);
        }
        Some(LimitTerm::Bind) => {
            b.append(" OFFSET ");
            b.register_bindable(i64::TYPE);
        }
        None => {}
    }
    Ok(())
}

/// The `count()` reuse policy: a seed already starting with
/// `SELECT COUNT(*)` is used as-is, anything else is wrapped.
pub(crate) fn wrap_count(sql: String, types: Vec<PersistentType>) -> StatementSeed {
    let starts_counting = sql
        .trim_start()
        .get(..15)
        .is_some_and(|head| head.eq_ignore_ascii_case("SELECT COUNT(*)"));
    if starts_counting {
        StatementSeed { sql, types }
    } else {
        StatementSeed {
            sql: format!("SELECT COUNT(*) FROM ( {sql} )"),
            types,
        }
    }
}

fn column_name(expr: &Expr, index: usize) -> Identity {
    match expr {
        Expr::Column { name, .. } => name.clone(),
        Expr::Alias { alias, .. } | Expr::AliasRef { alias, .. } => alias.clone(),
        _ => Identity::new(format!("column{index}")),
    }
}

/// Best-effort persistent type of a result column, for cursor reads and
/// sub-query column rebinding.
pub(crate) fn inferred_type(expr: &Expr) -> PersistentType {
    match expr {
        Expr::Literal { ty, .. }
        | Expr::Bindable { ty }
        | Expr::Column { ty, .. }
        | Expr::AliasRef { ty, .. } => *ty,
        Expr::Alias { expr, .. } | Expr::Not(expr) => inferred_type(expr),
        Expr::Aggregate {
            func, expr: inner, ..
        } => match (func, inner) {
            (crate::expr::AggregateFunc::Count, _) => i64::TYPE,
            (crate::expr::AggregateFunc::Avg, _) => f64::TYPE,
            (_, Some(inner)) => inferred_type(inner),
            (_, None) => i64::TYPE,
        },
        Expr::Cast { to, .. } => PersistentType::of(match to {
            StorageClass::Integer => Shape::I64,
            StorageClass::Real => Shape::F64,
            StorageClass::Text => Shape::Text,
            StorageClass::Blob => Shape::Blob,
        }),
        Expr::Cmp { .. }
        | Expr::Like { .. }
        | Expr::NullCheck { .. }
        | Expr::Connective { .. }
        | Expr::InList { .. }
        | Expr::Between { .. }
        | Expr::Exists { .. } => bool::TYPE,
        Expr::Arith { lhs, .. } => inferred_type(lhs),
        Expr::Concat { .. } | Expr::GroupConcat { .. } => String::TYPE,
        Expr::Case { whens, otherwise, .. } => whens
            .first()
            .map(|(_, result)| inferred_type(result))
            .or_else(|| otherwise.as_deref().map(inferred_type))
            .unwrap_or(i64::TYPE),
        Expr::Call { .. } | Expr::Raw(_) | Expr::Raise { .. } | Expr::SubQuery { .. } => {
            i64::TYPE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::table::{Table, TableBuilder};
    use crate::source::column::Column;

    fn media() -> (Table, Column<i64>, Column<Option<String>>) {
        let mut tb = TableBuilder::new("MediaFile").unwrap();
        let id = tb.column::<i64>("_id", |c| c.primary_key());
        let uri = tb.column::<Option<String>>("MediaUri", |c| c);
        (tb.build().unwrap(), id, uri)
    }

    #[test]
    fn simple_select_sql() {
        let (table, id, uri) = media();
        let seed = table
            .select((&id, &uri))
            .where_(id.greater(0i64))
            .seed()
            .unwrap();
        assert_eq!(
            seed.sql,
            "SELECT \"MediaFile\".\"_id\", \"MediaFile\".\"MediaUri\" FROM \"MediaFile\" \
             WHERE \"MediaFile\".\"_id\" > 0"
        );
        assert!(seed.types.is_empty());
    }

    #[test]
    fn placeholder_types_match_question_marks() {
        let (table, id, uri) = media();
        let seed = table
            .select((&id, &uri))
            .where_(id.eq(crate::expr::bind_arg::<i64>()).and(uri.like("%a%")))
            .limit_bind()
            .seed()
            .unwrap();
        assert_eq!(seed.sql.matches('?').count(), seed.types.len());
        assert_eq!(seed.types.len(), 2);
    }

    #[test]
    fn distinct_and_group_by_and_having() {
        let (table, id, uri) = media();
        let seed = table
            .select(&uri)
            .all()
            .distinct()
            .group_by(&uri)
            .having(id.expr().count().greater(1i64))
            .seed()
            .unwrap();
        assert_eq!(
            seed.sql,
            "SELECT DISTINCT \"MediaFile\".\"MediaUri\" FROM \"MediaFile\" \
             GROUP BY \"MediaFile\".\"MediaUri\" HAVING COUNT(\"MediaFile\".\"_id\") > 1"
        );
    }

    #[test]
    fn order_by_with_collation() {
        let (table, _, uri) = media();
        let seed = table
            .select(&uri)
            .all()
            .order_by_collated(&uri, SortOrder::Desc, "NOCASE")
            .seed()
            .unwrap();
        assert!(
            seed.sql
                .ends_with("ORDER BY \"MediaFile\".\"MediaUri\" COLLATE NOCASE DESC")
        );
    }

    #[test]
    fn limit_zero_renders_and_negative_omits() {
        let (table, id, _) = media();
        let sql = table.select(&id).all().limit(0).seed().unwrap().sql;
        assert!(sql.ends_with("LIMIT 0"));
        let sql = table.select(&id).all().limit(-1).seed().unwrap().sql;
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn offset_without_limit_is_unbounded() {
        let (table, id, _) = media();
        let sql = table.select(&id).all().offset(5).seed().unwrap().sql;
        assert!(sql.ends_with("LIMIT -1 OFFSET 5"));
    }

    #[test]
    fn negative_offset_is_rejected() {
        let (table, id, _) = media();
        assert!(table.select(&id).all().offset(-2).seed().is_err());
    }

    #[test]
    fn empty_columns_count_star() {
        let (table, _, _) = media();
        let seed = table.select_count(None).seed().unwrap();
        assert_eq!(seed.sql, "SELECT COUNT(*) FROM \"MediaFile\"");
    }

    #[test]
    fn count_seed_reuses_counting_select() {
        let (table, _, _) = media();
        let counting = table.select_count(None).count_seed().unwrap();
        assert_eq!(counting.sql, "SELECT COUNT(*) FROM \"MediaFile\"");
    }

    #[test]
    fn count_seed_wraps_ordinary_select() {
        let (table, id, _) = media();
        let counting = table.select(&id).all().count_seed().unwrap();
        assert_eq!(
            counting.sql,
            "SELECT COUNT(*) FROM ( SELECT \"MediaFile\".\"_id\" FROM \"MediaFile\" )"
        );
    }

    #[test]
    fn as_expression_wraps_in_parens() {
        let (table, id, _) = media();
        let sub = table.select(&id).all().as_expression::<i64>().unwrap();
        let outer = sub.greater(0i64);
        let seed = crate::builder::build_seed(|b| outer.node().append_to(b)).unwrap();
        assert_eq!(
            seed.sql,
            "(SELECT \"MediaFile\".\"_id\" FROM \"MediaFile\") > 0"
        );
    }

    #[test]
    fn seeds_are_deeply_equatable() {
        let (table, id, _) = media();
        let a = table.select(&id).all().seed().unwrap();
        let b = table.select(&id).all().seed().unwrap();
        assert_eq!(a, b);
    }
}
