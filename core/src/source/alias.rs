//! Aliased tables and aliased sub-queries.

use super::ColumnSet;
use super::column::{AnyColumn, Column, ColumnDef};
use super::table::Table;
use crate::builder::SqlBuilder;
use crate::error::{CoreError, Result};
use crate::expr::IntoOperandList;
use crate::identity::Identity;
use crate::query::{QueryBuilder, QuerySeed, SelectFrom};
use crate::types::Persisted;
use std::sync::Arc;

/// `"<table>" AS "<alias>"`. Columns cloned through
/// [`TableAlias::column`] render under the alias, so self-joins can
/// reference both sides.
#[derive(Debug, Clone, PartialEq)]
pub struct TableAlias {
    table: Table,
    alias: Identity,
}

impl TableAlias {
    pub(crate) fn new(table: Table, alias: &str) -> Self {
        TableAlias {
            table,
            alias: Identity::forced(alias),
        }
    }

    #[inline]
    pub fn alias(&self) -> &Identity {
        &self.alias
    }

    #[inline]
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Rebinds a column of the aliased table onto the alias.
    pub fn column<T: Persisted>(&self, column: &Column<T>) -> Result<Column<T>> {
        if column.qualifier() != self.table.identity() {
            return Err(CoreError::schema(format!(
                "column {} does not belong to {}",
                column.name(),
                self.table.name()
            )));
        }
        Ok(column.erase().requalified(self.alias.clone()).typed()?)
    }

    pub fn columns(&self) -> Vec<AnyColumn> {
        self.table
            .columns()
            .into_iter()
            .map(|c| c.requalified(self.alias.clone()))
            .collect()
    }

    pub fn select(&self, columns: impl IntoOperandList) -> SelectFrom {
        SelectFrom::new(columns.into_operand_list(), self.clone().into())
    }

    pub fn select_all(&self) -> SelectFrom {
        let columns = self.columns().iter().map(|c| c.node()).collect();
        SelectFrom::new(columns, self.clone().into())
    }

    pub(crate) fn append_from(&self, b: &mut SqlBuilder) -> Result<()> {
        b.append_identity(self.table.identity())
            .append(" AS ")
            .append_identity(&self.alias);
        Ok(())
    }
}

impl From<TableAlias> for ColumnSet {
    fn from(alias: TableAlias) -> Self {
        ColumnSet::TableAlias(Box::new(alias))
    }
}

/// An arbitrary sub-query in a FROM position: `(<sql>) <alias>`. Indexed
/// access to the sub-query's result columns yields `<alias>.<name>`
/// references for the outer query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAlias {
    seed: QuerySeed,
    alias: Identity,
}

impl QueryAlias {
    pub fn new(query: &QueryBuilder, alias: &str) -> Result<Self> {
        Ok(QueryAlias {
            seed: query.seed()?,
            alias: Identity::forced(alias),
        })
    }

    #[inline]
    pub fn alias(&self) -> &Identity {
        &self.alias
    }

    /// The sub-query's result column at `index`, rebound to the alias.
    /// Fails when `T` disagrees with the column's persistent type.
    pub fn column_at<T: Persisted>(&self, index: usize) -> Result<Column<T>> {
        let column = self.seed.columns.get(index).ok_or_else(|| {
            CoreError::schema(format!(
                "sub-query {} has {} column(s), index {index} out of range",
                self.alias,
                self.seed.columns.len()
            ))
        })?;
        if column.ty != T::TYPE {
            return Err(CoreError::type_mismatch(format!(
                "sub-query column {} is {:?}",
                column.name, column.ty
            )));
        }
        let def = Arc::new(ColumnDef::synthetic(column.name.clone(), column.ty));
        Ok(Column::new(def, self.alias.clone()))
    }

    pub fn columns(&self) -> Vec<AnyColumn> {
        self.seed
            .columns
            .iter()
            .map(|column| {
                AnyColumn::from_def(
                    Arc::new(ColumnDef::synthetic(column.name.clone(), column.ty)),
                    self.alias.clone(),
                )
            })
            .collect()
    }

    pub fn select(&self, columns: impl IntoOperandList) -> SelectFrom {
        SelectFrom::new(columns.into_operand_list(), self.clone().into())
    }

    pub fn select_all(&self) -> SelectFrom {
        let columns = self.columns().iter().map(|c| c.node()).collect();
        SelectFrom::new(columns, self.clone().into())
    }

    pub(crate) fn append_from(&self, b: &mut SqlBuilder) -> Result<()> {
        b.append_subquery(&self.seed.sql, &self.seed.types)
            .append_char(' ')
            .append_identity(&self.alias);
        Ok(())
    }
}

impl From<QueryAlias> for ColumnSet {
    fn from(alias: QueryAlias) -> Self {
        ColumnSet::QueryAlias(Box::new(alias))
    }
}
