//! Typed positional argument binding.
//!
//! [`ArgBinder`] implements the core [`Bindable`] primitives over a
//! rusqlite statement: caller indices are 0-based and validated against
//! the statement's argument count, then converted to the 1-based form
//! SQLite expects. [`ArgBinder::set`] dispatches through the slot's
//! persistent type, so a NULL can never reach a non-nullable slot.

use compact_str::format_compact;
use welite_core::error::CoreError;
use welite_core::types::{Bindable, Persisted, PersistentType};

/// Binds arguments into the `?` slots of a compiled statement.
pub struct ArgBinder<'a, 'conn> {
    stmt: &'a mut rusqlite::Statement<'conn>,
    types: &'a [PersistentType],
}

impl<'a, 'conn> ArgBinder<'a, 'conn> {
    pub(crate) fn new(
        stmt: &'a mut rusqlite::Statement<'conn>,
        types: &'a [PersistentType],
    ) -> Self {
        ArgBinder { stmt, types }
    }

    /// Number of argument slots.
    #[inline]
    pub fn arg_count(&self) -> usize {
        self.types.len()
    }

    /// Binds `value` into slot `index` through the slot's persistent
    /// type.
    pub fn set<T: Persisted>(&mut self, index: usize, value: T) -> welite_core::Result<()> {
        let ty = self.slot_type(index)?;
        ty.bind(self, index, &value.into_value())
    }

    fn slot_type(&self, index: usize) -> welite_core::Result<PersistentType> {
        self.types
            .get(index)
            .copied()
            .ok_or(CoreError::OutOfBoundsBind {
                index,
                count: self.types.len(),
            })
    }

    fn check(&self, index: usize) -> welite_core::Result<()> {
        self.slot_type(index).map(|_| ())
    }

    fn raw_bind<T: rusqlite::ToSql>(
        &mut self,
        index: usize,
        value: T,
    ) -> welite_core::Result<()> {
        self.check(index)?;
        self.stmt
            .raw_bind_parameter(index + 1, value)
            .map_err(|e| CoreError::Bind(format_compact!("{e}")))
    }
}

impl Bindable for ArgBinder<'_, '_> {
    fn bind_null(&mut self, index: usize) -> welite_core::Result<()> {
        self.raw_bind(index, rusqlite::types::Null)
    }

    fn bind_long(&mut self, index: usize, value: i64) -> welite_core::Result<()> {
        self.raw_bind(index, value)
    }

    fn bind_double(&mut self, index: usize, value: f64) -> welite_core::Result<()> {
        self.raw_bind(index, value)
    }

    fn bind_text(&mut self, index: usize, value: &str) -> welite_core::Result<()> {
        self.raw_bind(index, value)
    }

    fn bind_blob(&mut self, index: usize, value: &[u8]) -> welite_core::Result<()> {
        self.raw_bind(index, value)
    }
}

/// The no-argument bindings closure for statements without placeholders.
pub fn no_args(_binder: &mut ArgBinder<'_, '_>) -> welite_core::Result<()> {
    Ok(())
}
