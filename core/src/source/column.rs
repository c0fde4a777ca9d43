//! Columns and their declarations.
//!
//! A [`ColumnDef`] is the declaration a table owns; a [`Column`] is the
//! typed handle user code keeps, carrying the definition plus the
//! qualifier it renders under (the owning table, or an alias after
//! rebinding). Two columns are equal iff their qualifier and name are
//! equal; the owning set is referenced through its identity, never a
//! pointer cycle.

use crate::error::{CoreError, Result};
use crate::expr::{Expr, Expression, IntoExpression};
use crate::identity::Identity;
use crate::types::{Persisted, PersistentType, SqliteValue, TextType};
use compact_str::CompactString;
use core::marker::PhantomData;
use std::sync::Arc;

/// Referential action for foreign keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FkAction {
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
    Cascade,
}

impl FkAction {
    pub const fn keyword(self) -> &'static str {
        match self {
            FkAction::NoAction => "NO ACTION",
            FkAction::Restrict => "RESTRICT",
            FkAction::SetNull => "SET NULL",
            FkAction::SetDefault => "SET DEFAULT",
            FkAction::Cascade => "CASCADE",
        }
    }
}

/// A column's foreign-key reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub table: Identity,
    pub column: Identity,
    pub column_type: PersistentType,
    pub on_delete: Option<FkAction>,
    pub on_update: Option<FkAction>,
}

/// A column's declared default.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Literal(SqliteValue),
    Expr(Expr),
    /// Raw SQL the database evaluates, e.g. `CURRENT_TIMESTAMP`.
    DbGenerated(CompactString),
}

/// The declaration of one column within a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub(crate) name: Identity,
    pub(crate) ty: PersistentType,
    pub(crate) primary_key: bool,
    pub(crate) autoincrement: bool,
    pub(crate) descending_key: bool,
    pub(crate) unique: bool,
    pub(crate) collation: Option<CompactString>,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) reference: Option<Reference>,
}

impl ColumnDef {
    /// A bare definition with no constraints, used for columns derived
    /// from sub-query or view projections.
    pub(crate) fn synthetic(name: Identity, ty: PersistentType) -> Self {
        ColumnDef {
            name,
            ty,
            primary_key: false,
            autoincrement: false,
            descending_key: false,
            unique: false,
            collation: None,
            default: None,
            reference: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &Identity {
        &self.name
    }

    #[inline]
    pub fn persistent_type(&self) -> PersistentType {
        self.ty
    }

    #[inline]
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    #[inline]
    pub fn reference(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }

    /// The `DEFAULT` literal or expression, rendered; `NULL` when the
    /// column has no declared default.
    pub(crate) fn default_node(&self) -> Expr {
        match &self.default {
            Some(DefaultValue::Literal(value)) => Expr::Literal {
                ty: self.ty,
                value: value.clone(),
            },
            Some(DefaultValue::Expr(expr)) => expr.clone(),
            Some(DefaultValue::DbGenerated(raw)) => Expr::Raw(raw.clone()),
            None => Expr::Raw("NULL".into()),
        }
    }
}

/// A typed column handle: the definition plus the qualifier it renders
/// under. A column is itself an expression of its declared type.
pub struct Column<T> {
    def: Arc<ColumnDef>,
    qualifier: Identity,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Column<T> {
    pub(crate) fn new(def: Arc<ColumnDef>, qualifier: Identity) -> Self {
        Column {
            def,
            qualifier,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn name(&self) -> &Identity {
        &self.def.name
    }

    #[inline]
    pub fn qualifier(&self) -> &Identity {
        &self.qualifier
    }

    #[inline]
    pub fn persistent_type(&self) -> PersistentType {
        self.def.ty
    }

    #[inline]
    pub fn definition(&self) -> &ColumnDef {
        &self.def
    }

    /// The untyped handle.
    pub fn erase(&self) -> AnyColumn {
        AnyColumn {
            def: self.def.clone(),
            qualifier: self.qualifier.clone(),
        }
    }

    fn node(&self) -> Expr {
        Expr::Column {
            qualifier: self.qualifier.clone(),
            name: self.def.name.clone(),
            ty: self.def.ty,
        }
    }
}

impl<T: Persisted> Column<T> {
    /// This column as a typed expression.
    pub fn expr(&self) -> Expression<T> {
        Expression::wrap(self.node())
    }

    pub fn eq(&self, rhs: impl IntoExpression<T>) -> Expression<bool> {
        self.expr().eq(rhs)
    }

    pub fn neq(&self, rhs: impl IntoExpression<T>) -> Expression<bool> {
        self.expr().neq(rhs)
    }

    pub fn less(&self, rhs: impl IntoExpression<T>) -> Expression<bool> {
        self.expr().less(rhs)
    }

    pub fn less_eq(&self, rhs: impl IntoExpression<T>) -> Expression<bool> {
        self.expr().less_eq(rhs)
    }

    pub fn greater(&self, rhs: impl IntoExpression<T>) -> Expression<bool> {
        self.expr().greater(rhs)
    }

    pub fn greater_eq(&self, rhs: impl IntoExpression<T>) -> Expression<bool> {
        self.expr().greater_eq(rhs)
    }

    pub fn between(
        &self,
        low: impl IntoExpression<T>,
        high: impl IntoExpression<T>,
    ) -> Expression<bool> {
        self.expr().between(low, high)
    }

    pub fn in_list<I>(&self, items: I) -> Expression<bool>
    where
        I: IntoIterator,
        I::Item: IntoExpression<T>,
    {
        self.expr().in_list(items)
    }

    pub fn not_in_list<I>(&self, items: I) -> Expression<bool>
    where
        I: IntoIterator,
        I::Item: IntoExpression<T>,
    {
        self.expr().not_in_list(items)
    }

    pub fn is_null(&self) -> Expression<bool> {
        self.expr().is_null()
    }

    pub fn is_not_null(&self) -> Expression<bool> {
        self.expr().is_not_null()
    }
}

impl<T: TextType> Column<T> {
    pub fn like(&self, pattern: impl IntoExpression<String>) -> Expression<bool> {
        self.expr().like(pattern)
    }

    pub fn not_like(&self, pattern: impl IntoExpression<String>) -> Expression<bool> {
        self.expr().not_like(pattern)
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Column::new(self.def.clone(), self.qualifier.clone())
    }
}

impl<T> core::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Column")
            .field("qualifier", &self.qualifier)
            .field("name", &self.def.name)
            .finish()
    }
}

impl<T> PartialEq for Column<T> {
    fn eq(&self, other: &Self) -> bool {
        self.qualifier == other.qualifier && self.def.name == other.def.name
    }
}

impl<T: Persisted> IntoExpression<T> for Column<T> {
    fn into_expression(self) -> Expression<T> {
        self.expr()
    }
}

impl<T: Persisted> IntoExpression<T> for &Column<T> {
    fn into_expression(self) -> Expression<T> {
        self.expr()
    }
}

/// An untyped column handle, the unit of a column set's column list.
#[derive(Debug, Clone)]
pub struct AnyColumn {
    def: Arc<ColumnDef>,
    qualifier: Identity,
}

impl AnyColumn {
    pub(crate) fn from_def(def: Arc<ColumnDef>, qualifier: Identity) -> Self {
        AnyColumn { def, qualifier }
    }

    #[inline]
    pub fn name(&self) -> &Identity {
        &self.def.name
    }

    #[inline]
    pub fn qualifier(&self) -> &Identity {
        &self.qualifier
    }

    #[inline]
    pub fn persistent_type(&self) -> PersistentType {
        self.def.ty
    }

    #[inline]
    pub fn definition(&self) -> &ColumnDef {
        &self.def
    }

    /// The reference node: fully qualified, or the bare name for the
    /// alias-less delegating columns of a compound select.
    pub fn node(&self) -> Expr {
        if self.qualifier.unquoted().is_empty() {
            return Expr::AliasRef {
                alias: self.def.name.clone(),
                ty: self.def.ty,
            };
        }
        Expr::Column {
            qualifier: self.qualifier.clone(),
            name: self.def.name.clone(),
            ty: self.def.ty,
        }
    }

    /// Rebinds this column under a different qualifier.
    pub(crate) fn requalified(&self, qualifier: Identity) -> AnyColumn {
        AnyColumn {
            def: self.def.clone(),
            qualifier,
        }
    }

    /// Restores the typed handle. Fails when `T` disagrees with the
    /// declared persistent type.
    pub fn typed<T: Persisted>(&self) -> Result<Column<T>> {
        if T::TYPE != self.def.ty {
            return Err(CoreError::type_mismatch(format!(
                "column {} is declared {:?}, not {:?}",
                self.def.name,
                self.def.ty,
                T::TYPE
            )));
        }
        Ok(Column::new(self.def.clone(), self.qualifier.clone()))
    }
}

impl PartialEq for AnyColumn {
    fn eq(&self, other: &Self) -> bool {
        self.qualifier == other.qualifier && self.def.name == other.def.name
    }
}

impl<T> From<&Column<T>> for AnyColumn {
    fn from(column: &Column<T>) -> Self {
        column.erase()
    }
}

impl<T> crate::expr::IntoOperand for Column<T> {
    fn into_operand(self) -> Expr {
        self.node()
    }
}

impl<T> crate::expr::IntoOperand for &Column<T> {
    fn into_operand(self) -> Expr {
        self.node()
    }
}

impl crate::expr::IntoOperand for &AnyColumn {
    fn into_operand(self) -> Expr {
        self.node()
    }
}
