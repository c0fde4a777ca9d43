//! Cursors over query results.
//!
//! Iteration is lazy but each step is eager; a cursor checks its
//! cancellation token between rows, so a cancelled transaction stops at
//! the next record boundary.

use crate::error::{Error, Result};
use crate::token::CancellationToken;
use crate::values::value_from_ref;
use welite_core::error::CoreError;
use welite_core::query::SeedColumn;
use welite_core::types::Persisted;

/// A forward-only cursor over the rows of an executed query.
pub struct Cursor<'stmt, 'seed> {
    rows: rusqlite::Rows<'stmt>,
    columns: &'seed [SeedColumn],
    token: Option<CancellationToken>,
    position: i64,
}

impl<'stmt, 'seed> Cursor<'stmt, 'seed> {
    pub(crate) fn new(
        rows: rusqlite::Rows<'stmt>,
        columns: &'seed [SeedColumn],
        token: Option<CancellationToken>,
    ) -> Self {
        Cursor {
            rows,
            columns,
            token,
            position: -1,
        }
    }

    /// Steps to the next row; `None` at the end of the result set.
    pub fn next(&mut self) -> Result<Option<Row<'_>>> {
        if let Some(token) = &self.token {
            token.ensure_active()?;
        }
        match self.rows.next()? {
            Some(inner) => {
                self.position += 1;
                Ok(Some(Row {
                    inner,
                    columns: self.columns,
                }))
            }
            None => Ok(None),
        }
    }

    /// Zero-based index of the current row; -1 before the first step.
    #[inline]
    pub fn position(&self) -> i64 {
        self.position
    }
}

/// One row of a result set with typed, index-based accessors.
pub struct Row<'a> {
    inner: &'a rusqlite::Row<'a>,
    columns: &'a [SeedColumn],
}

impl Row<'_> {
    /// Number of result columns.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Reads column `index` as `T`, converting through the column's
    /// storage value.
    pub fn get<T: Persisted>(&self, index: usize) -> Result<T> {
        if index >= self.columns.len() {
            return Err(Error::Core(CoreError::OutOfBoundsBind {
                index,
                count: self.columns.len(),
            }));
        }
        let value = value_from_ref(self.inner.get_ref(index)?);
        T::from_value(value).map_err(Error::from)
    }

    pub fn get_i64(&self, index: usize) -> Result<i64> {
        self.get(index)
    }

    pub fn get_f64(&self, index: usize) -> Result<f64> {
        self.get(index)
    }

    pub fn get_string(&self, index: usize) -> Result<String> {
        self.get(index)
    }

    pub fn get_blob(&self, index: usize) -> Result<Vec<u8>> {
        self.get(index)
    }

    /// The derived name of column `index`, for diagnostics.
    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|c| c.name.unquoted())
    }
}
