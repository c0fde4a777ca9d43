//! `UPDATE` statements.

use super::{ColumnValues, ConflictPolicy, check_ownership};
use crate::builder::{StatementSeed, build_seed};
use crate::error::Result;
use crate::expr::{Expr, Expression};
use crate::source::Table;

/// An update waiting for its WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBuilder {
    table: Table,
    conflict: ConflictPolicy,
    values: ColumnValues,
}

/// `UPDATE [OR <conflict>] "<table>" SET ... [WHERE ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    table: Table,
    conflict: ConflictPolicy,
    values: ColumnValues,
    predicate: Option<Expr>,
}

impl Table {
    /// An update with no conflict clause.
    pub fn update_values(
        &self,
        f: impl FnOnce(&mut ColumnValues) -> Result<()>,
    ) -> Result<UpdateBuilder> {
        self.update_with(ConflictPolicy::Unspecified, f)
    }

    /// An update with the given conflict policy.
    pub fn update_with(
        &self,
        conflict: ConflictPolicy,
        f: impl FnOnce(&mut ColumnValues) -> Result<()>,
    ) -> Result<UpdateBuilder> {
        let mut values = ColumnValues::new();
        f(&mut values)?;
        check_ownership(self, &values)?;
        Ok(UpdateBuilder {
            table: self.clone(),
            conflict,
            values,
        })
    }
}

impl UpdateBuilder {
    /// Restricts the update with a predicate.
    pub fn where_(self, predicate: Expression<bool>) -> UpdateStatement {
        UpdateStatement {
            table: self.table,
            conflict: self.conflict,
            values: self.values,
            predicate: Some(predicate.into_node()),
        }
    }

    /// Updates every row.
    pub fn all(self) -> UpdateStatement {
        UpdateStatement {
            table: self.table,
            conflict: self.conflict,
            values: self.values,
            predicate: None,
        }
    }
}

impl UpdateStatement {
    #[inline]
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn seed(&self) -> Result<StatementSeed> {
        build_seed(|b| {
            b.append("UPDATE")
                .append(self.conflict.or_clause())
                .append_char(' ')
                .append_identity(self.table.identity())
                .append(" SET ");
            let mut first = true;
            for entry in self.values.entries() {
                if !first {
                    b.append(", ");
                }
                first = false;
                b.append_identity(entry.column().name()).append_char('=');
                entry.append_value(b)?;
            }
            if let Some(predicate) = &self.predicate {
                b.append(" WHERE ");
                predicate.append_to(b)?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::table::TableBuilder;
    use crate::types::Persisted;

    #[test]
    fn update_with_where() {
        let mut tb = TableBuilder::new("Artist").unwrap();
        let name = tb.column::<String>("ArtistName", |c| c);
        let table = tb.build().unwrap();

        let update = table
            .update_values(|v| {
                v.value(&name, "Led Zeppelin".to_owned())?;
                Ok(())
            })
            .unwrap()
            .where_(name.eq("Led Zepelin"));
        assert_eq!(
            update.seed().unwrap().sql,
            "UPDATE \"Artist\" SET \"ArtistName\"='Led Zeppelin' \
             WHERE \"Artist\".\"ArtistName\" = 'Led Zepelin'"
        );
    }

    #[test]
    fn update_all_and_conflict() {
        let mut tb = TableBuilder::new("Artist").unwrap();
        let name = tb.column::<String>("ArtistName", |c| c);
        let table = tb.build().unwrap();

        let update = table
            .update_with(ConflictPolicy::Replace, |v| {
                v.bind_arg(&name)?;
                Ok(())
            })
            .unwrap()
            .all();
        let seed = update.seed().unwrap();
        assert_eq!(
            seed.sql,
            "UPDATE OR REPLACE \"Artist\" SET \"ArtistName\"=?"
        );
        assert_eq!(seed.types, vec![String::TYPE]);
    }
}
