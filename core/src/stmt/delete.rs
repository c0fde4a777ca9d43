//! `DELETE` statements.

use crate::builder::{StatementSeed, build_seed};
use crate::error::Result;
use crate::expr::{Expr, Expression};
use crate::source::Table;

/// `DELETE FROM "<table>" [WHERE ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    table: Table,
    predicate: Option<Expr>,
}

impl Table {
    /// Deletes rows matching the predicate.
    pub fn delete_where(&self, predicate: Expression<bool>) -> DeleteStatement {
        DeleteStatement {
            table: self.clone(),
            predicate: Some(predicate.into_node()),
        }
    }

    /// Deletes every row.
    pub fn delete_all(&self) -> DeleteStatement {
        DeleteStatement {
            table: self.clone(),
            predicate: None,
        }
    }
}

impl DeleteStatement {
    #[inline]
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn seed(&self) -> Result<StatementSeed> {
        build_seed(|b| {
            b.append("DELETE FROM ").append_identity(self.table.identity());
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

    #[test]
    fn delete_with_and_without_where() {
        let mut tb = TableBuilder::new("Artist").unwrap();
        let name = tb.column::<String>("ArtistName", |c| c);
        let table = tb.build().unwrap();

        let delete = table.delete_where(name.eq("Led Zeppelin"));
        assert_eq!(
            delete.seed().unwrap().sql,
            "DELETE FROM \"Artist\" WHERE \"Artist\".\"ArtistName\" = 'Led Zeppelin'"
        );

        let delete = table.delete_all();
        assert_eq!(delete.seed().unwrap().sql, "DELETE FROM \"Artist\"");
    }
}
