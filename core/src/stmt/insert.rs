//! `INSERT` statements.

use super::{ColumnValues, ConflictPolicy, check_ownership};
use crate::builder::{StatementSeed, build_seed};
use crate::error::Result;
use crate::source::Table;

/// `INSERT [OR <conflict>] INTO "<table>" (...) VALUES (...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    table: Table,
    conflict: ConflictPolicy,
    values: ColumnValues,
}

impl Table {
    /// An insert with no conflict clause.
    pub fn insert_values(
        &self,
        f: impl FnOnce(&mut ColumnValues) -> Result<()>,
    ) -> Result<InsertStatement> {
        self.insert_with(ConflictPolicy::Unspecified, f)
    }

    /// An insert with the given conflict policy.
    pub fn insert_with(
        &self,
        conflict: ConflictPolicy,
        f: impl FnOnce(&mut ColumnValues) -> Result<()>,
    ) -> Result<InsertStatement> {
        let mut values = ColumnValues::new();
        f(&mut values)?;
        check_ownership(self, &values)?;
        Ok(InsertStatement {
            table: self.clone(),
            conflict,
            values,
        })
    }
}

impl InsertStatement {
    #[inline]
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn seed(&self) -> Result<StatementSeed> {
        build_seed(|b| {
            b.append("INSERT")
                .append(self.conflict.or_clause())
                .append(" INTO ")
                .append_identity(self.table.identity());
            b.append_each(self.values.entries(), ", ", " (", ")", |b, entry| {
                b.append_identity(entry.column().name());
                Ok(())
            })?;
            b.append(" VALUES ");
            b.append_each(self.values.entries(), ", ", "(", ")", |b, entry| {
                entry.append_value(b)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::table::TableBuilder;
    use crate::types::Persisted;

    #[test]
    fn insert_renders_columns_and_values() {
        let mut tb = TableBuilder::new("Artist").unwrap();
        let _id = tb.column::<i64>("ArtistId", |c| c.auto_increment());
        let name = tb.column::<String>("ArtistName", |c| c);
        let table = tb.build().unwrap();

        let insert = table
            .insert_values(|v| {
                v.value(&name, "Led Zeppelin".to_owned())?;
                Ok(())
            })
            .unwrap();
        assert_eq!(
            insert.seed().unwrap().sql,
            "INSERT INTO \"Artist\" (\"ArtistName\") VALUES ('Led Zeppelin')"
        );
    }

    #[test]
    fn conflict_policy_renders_or_clause() {
        let mut tb = TableBuilder::new("Artist").unwrap();
        let name = tb.column::<String>("ArtistName", |c| c.unique());
        let table = tb.build().unwrap();

        let insert = table
            .insert_with(ConflictPolicy::Ignore, |v| {
                v.value(&name, "x".to_owned())?;
                Ok(())
            })
            .unwrap();
        assert!(
            insert
                .seed()
                .unwrap()
                .sql
                .starts_with("INSERT OR IGNORE INTO \"Artist\"")
        );
    }

    #[test]
    fn bind_placeholder_registers_column_type() {
        let mut tb = TableBuilder::new("Artist").unwrap();
        let name = tb.column::<String>("ArtistName", |c| c);
        let table = tb.build().unwrap();

        let insert = table
            .insert_values(|v| {
                v.bind_arg(&name)?;
                Ok(())
            })
            .unwrap();
        let seed = insert.seed().unwrap();
        assert_eq!(
            seed.sql,
            "INSERT INTO \"Artist\" (\"ArtistName\") VALUES (?)"
        );
        assert_eq!(seed.types, vec![String::TYPE]);
    }

    #[test]
    fn default_marker_resolves_to_declared_default_or_null() {
        let mut tb = TableBuilder::new("Prefs").unwrap();
        let theme = tb.column::<String>("theme", |c| c.default_value("dark".to_owned()));
        let note = tb.column::<Option<String>>("note", |c| c);
        let table = tb.build().unwrap();

        let insert = table
            .insert_values(|v| {
                v.default_value(&theme)?;
                v.default_value(&note)?;
                Ok(())
            })
            .unwrap();
        assert_eq!(
            insert.seed().unwrap().sql,
            "INSERT INTO \"Prefs\" (\"theme\", \"note\") VALUES ('dark', NULL)"
        );
    }

    #[test]
    fn expression_value_renders_inline() {
        let mut tb = TableBuilder::new("Counter").unwrap();
        let n = tb.column::<i64>("n", |c| c);
        let table = tb.build().unwrap();

        let insert = table
            .insert_values(|v| {
                v.expr(&n, n.expr() + 1i64)?;
                Ok(())
            })
            .unwrap();
        assert_eq!(
            insert.seed().unwrap().sql,
            "INSERT INTO \"Counter\" (\"n\") VALUES ((\"Counter\".\"n\" + 1))"
        );
    }
}
