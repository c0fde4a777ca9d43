//! Mutation statements: INSERT, UPDATE, DELETE.

mod delete;
mod insert;
mod update;

pub use delete::DeleteStatement;
pub use insert::InsertStatement;
pub use update::{UpdateBuilder, UpdateStatement};

use crate::builder::SqlBuilder;
use crate::error::{CoreError, Result};
use crate::expr::{Expr, Expression};
use crate::source::column::{AnyColumn, Column};
use crate::types::{Persisted, SqliteValue};

/// SQLite conflict resolution for INSERT and UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    #[default]
    Unspecified,
    Rollback,
    Abort,
    Fail,
    Ignore,
    Replace,
}

impl ConflictPolicy {
    /// The ` OR <policy>` infix; empty for [`ConflictPolicy::Unspecified`].
    pub(crate) const fn or_clause(self) -> &'static str {
        match self {
            ConflictPolicy::Unspecified => "",
            ConflictPolicy::Rollback => " OR ROLLBACK",
            ConflictPolicy::Abort => " OR ABORT",
            ConflictPolicy::Fail => " OR FAIL",
            ConflictPolicy::Ignore => " OR IGNORE",
            ConflictPolicy::Replace => " OR REPLACE",
        }
    }
}

/// One column-to-value association within an insert or update.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// An inlined literal.
    Value { column: AnyColumn, value: SqliteValue },
    /// An arbitrary expression.
    Expr { column: AnyColumn, expr: Expr },
    /// A `?` placeholder bound at execution time.
    BindArg { column: AnyColumn },
    /// The column's declared default, `NULL` when it has none.
    Default { column: AnyColumn },
}

impl ColumnValue {
    pub(crate) fn column(&self) -> &AnyColumn {
        match self {
            ColumnValue::Value { column, .. }
            | ColumnValue::Expr { column, .. }
            | ColumnValue::BindArg { column }
            | ColumnValue::Default { column } => column,
        }
    }

    pub(crate) fn append_value(&self, b: &mut SqlBuilder) -> Result<()> {
        match self {
            ColumnValue::Value { column, value } => {
                b.register_argument(column.persistent_type(), value)
            }
            ColumnValue::Expr { expr, .. } => expr.append_to(b),
            ColumnValue::BindArg { column } => {
                b.register_bindable(column.persistent_type());
                Ok(())
            }
            ColumnValue::Default { column } => column.definition().default_node().append_to(b),
        }
    }
}

/// Insertion-ordered column-value associations; the order defines the
/// positional order of generated placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnValues {
    entries: Vec<ColumnValue>,
}

impl ColumnValues {
    pub(crate) fn new() -> Self {
        ColumnValues::default()
    }

    /// Associates the column with a literal value.
    pub fn value<T: Persisted>(&mut self, column: &Column<T>, value: T) -> Result<&mut Self> {
        self.push(ColumnValue::Value {
            column: column.erase(),
            value: value.into_value(),
        })
    }

    /// Associates the column with an expression.
    pub fn expr<T: Persisted>(
        &mut self,
        column: &Column<T>,
        expr: Expression<T>,
    ) -> Result<&mut Self> {
        self.push(ColumnValue::Expr {
            column: column.erase(),
            expr: expr.into_node(),
        })
    }

    /// Emits a `?` for the column, bound at execution time.
    pub fn bind_arg<T: Persisted>(&mut self, column: &Column<T>) -> Result<&mut Self> {
        self.push(ColumnValue::BindArg {
            column: column.erase(),
        })
    }

    /// Uses the column's declared default, `NULL` when it has none.
    pub fn default_value<T: Persisted>(&mut self, column: &Column<T>) -> Result<&mut Self> {
        self.push(ColumnValue::Default {
            column: column.erase(),
        })
    }

    fn push(&mut self, entry: ColumnValue) -> Result<&mut Self> {
        let column = entry.column();
        if self.entries.iter().any(|e| e.column() == column) {
            return Err(CoreError::schema(format!(
                "column {} assigned more than once",
                column.name()
            )));
        }
        self.entries.push(entry);
        Ok(self)
    }

    pub(crate) fn entries(&self) -> &[ColumnValue] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

pub(crate) fn check_ownership(
    table: &crate::source::Table,
    values: &ColumnValues,
) -> Result<()> {
    if values.is_empty() {
        return Err(CoreError::schema(format!(
            "no column values supplied for {}",
            table.name()
        )));
    }
    for entry in values.entries() {
        if entry.column().qualifier() != table.identity() {
            return Err(CoreError::schema(format!(
                "column {} does not belong to {}",
                entry.column().name(),
                table.name()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::table::TableBuilder;

    #[test]
    fn duplicate_column_is_rejected() {
        let mut tb = TableBuilder::new("Artist").unwrap();
        let name = tb.column::<String>("ArtistName", |c| c);
        let _table = tb.build().unwrap();

        let mut values = ColumnValues::new();
        values.value(&name, "a".to_owned()).unwrap();
        assert!(values.value(&name, "b".to_owned()).is_err());
    }
}
