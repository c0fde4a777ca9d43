//! Column sets: everything that can appear in a FROM clause.

pub mod alias;
pub mod column;
pub mod compound;
pub mod join;
pub mod table;
pub mod view;

pub use alias::{QueryAlias, TableAlias};
pub use column::{AnyColumn, Column, ColumnDef, DefaultValue, FkAction, Reference};
pub use compound::{CompoundOp, CompoundSelect};
pub use join::{Join, JoinPart, JoinType};
pub use table::{ColumnConfig, Index, Table, TableBuilder};
pub use view::View;

use crate::builder::SqlBuilder;
use crate::error::Result;
use crate::identity::Identity;

/// The closed set of FROM-clause sources. Each variant yields an ordered
/// column list and renders its own FROM fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSet {
    Table(Table),
    Join(Box<Join>),
    TableAlias(Box<TableAlias>),
    QueryAlias(Box<QueryAlias>),
    Compound(Box<CompoundSelect>),
    View(Box<View>),
}

impl ColumnSet {
    /// The ordered columns of this set. Compound selects yield the first
    /// constituent's columns rebound alias-less.
    pub fn columns(&self) -> Vec<AnyColumn> {
        match self {
            ColumnSet::Table(table) => table.columns(),
            ColumnSet::Join(join) => join.columns(),
            ColumnSet::TableAlias(alias) => alias.columns(),
            ColumnSet::QueryAlias(alias) => alias.columns(),
            ColumnSet::Compound(compound) => compound.delegating_columns(),
            ColumnSet::View(view) => view.columns(),
        }
    }

    /// Renders this set's FROM fragment.
    pub fn append_from(&self, b: &mut SqlBuilder) -> Result<()> {
        match self {
            ColumnSet::Table(table) => {
                b.append_identity(table.identity());
                Ok(())
            }
            ColumnSet::Join(join) => join.append_from(b),
            ColumnSet::TableAlias(alias) => alias.append_from(b),
            ColumnSet::QueryAlias(alias) => alias.append_from(b),
            ColumnSet::Compound(compound) => {
                let seed = compound.seed()?;
                b.append_subquery(&seed.sql, &seed.types);
                Ok(())
            }
            ColumnSet::View(view) => view.append_from(b),
        }
    }
}

/// The schema-object kinds recorded in `sqlite_master`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaObjectKind {
    Table,
    Index,
    View,
    Trigger,
}

impl SchemaObjectKind {
    /// The `type` value in `sqlite_master`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SchemaObjectKind::Table => "table",
            SchemaObjectKind::Index => "index",
            SchemaObjectKind::View => "view",
            SchemaObjectKind::Trigger => "trigger",
        }
    }
}

/// A schema object that can be created and dropped: tables, indices,
/// views, triggers.
pub trait Creatable {
    fn identity(&self) -> &Identity;
    fn kind(&self) -> SchemaObjectKind;
    /// The `CREATE ... IF NOT EXISTS` statement.
    fn create_sql(&self, temporary: bool) -> Result<String>;
    /// The `DROP ... IF EXISTS` statement.
    fn drop_sql(&self) -> String;
}
