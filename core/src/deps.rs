//! Table dependency ordering.
//!
//! Builds the directed graph where `A -> B` means `A` references `B`
//! through a foreign key, and produces a deterministic topological order
//! with referenced tables first. Creation visits tables in that order,
//! dropping in reverse. A self-reference is permitted; a cycle across
//! tables is not.

use crate::error::{CoreError, Result};
use crate::source::Table;

/// The foreign-key dependency graph over a set of tables.
#[derive(Debug, Clone)]
pub struct TableDependencies {
    tables: Vec<Table>,
}

impl TableDependencies {
    pub fn new(tables: impl IntoIterator<Item = Table>) -> Self {
        TableDependencies {
            tables: tables.into_iter().collect(),
        }
    }

    /// Adjacency: for each table, the indices of in-set tables it
    /// references. Self-references and references to tables outside the
    /// set are ignored.
    fn edges(&self) -> Vec<Vec<usize>> {
        self.tables
            .iter()
            .map(|table| {
                table
                    .referenced_tables()
                    .iter()
                    .filter_map(|referenced| {
                        self.tables
                            .iter()
                            .position(|t| t.identity() == referenced)
                    })
                    .filter(|&j| self.tables[j].identity() != table.identity())
                    .collect()
            })
            .collect()
    }

    /// True when a reference cycle spans more than one table. With
    /// self-references already excluded from the graph, that is exactly
    /// the case where no topological order exists.
    pub fn tables_are_cyclic(&self) -> bool {
        self.tables_in_create_order().is_err()
    }

    /// Deterministic topological order, referenced tables first. Ties
    /// resolve to declaration order.
    pub fn tables_in_create_order(&self) -> Result<Vec<Table>> {
        let edges = self.edges();
        let n = self.tables.len();
        let mut remaining: Vec<usize> = (0..n).collect();
        let mut placed = vec![false; n];
        let mut out = Vec::with_capacity(n);

        while !remaining.is_empty() {
            let next = remaining.iter().copied().find(|&i| {
                edges[i].iter().all(|&dep| placed[dep])
            });
            match next {
                Some(i) => {
                    placed[i] = true;
                    remaining.retain(|&r| r != i);
                    out.push(self.tables[i].clone());
                }
                None => {
                    return Err(CoreError::schema(
                        "cyclic foreign-key dependencies between tables",
                    ));
                }
            }
        }
        Ok(out)
    }

    /// Reverse creation order.
    pub fn tables_in_drop_order(&self) -> Result<Vec<Table>> {
        let mut order = self.tables_in_create_order()?;
        order.reverse();
        Ok(order)
    }
}
