//! Tables: declaration, typed column handles, and DDL generation.
//!
//! A table is declared through [`TableBuilder`], which hands out
//! [`Column`] handles as columns are added and validates the whole
//! declaration on [`TableBuilder::build`]. The resulting [`Table`] is
//! immutable and lives for the database lifetime.

use super::column::{AnyColumn, Column, ColumnDef, DefaultValue, FkAction, Reference};
use super::join::{Join, JoinType};
use super::{ColumnSet, Creatable, SchemaObjectKind};
use crate::builder::{SqlBuilder, build_str};
use crate::error::{CoreError, Result};
use crate::expr::{Expression, IntoOperandList};
use crate::identity::Identity;
use crate::query::SelectFrom;
use crate::types::{Persisted, PersistentType, StorageClass};
use compact_str::{CompactString, format_compact};
use core::marker::PhantomData;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IndexDef {
    pub(crate) name: Identity,
    pub(crate) columns: Vec<Identity>,
    pub(crate) unique: bool,
}

#[derive(Debug)]
pub(crate) struct TableInner {
    pub(crate) identity: Identity,
    pub(crate) columns: Vec<Arc<ColumnDef>>,
    pub(crate) composite_pk: Option<Vec<Identity>>,
    pub(crate) indices: Vec<IndexDef>,
}

/// A named, ordered set of columns with primary key, indices, and
/// foreign-key references.
#[derive(Debug, Clone)]
pub struct Table {
    inner: Arc<TableInner>,
}

impl Table {
    #[inline]
    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.inner.identity.unquoted()
    }

    /// Ordered column handles, qualified by this table.
    pub fn columns(&self) -> Vec<AnyColumn> {
        self.inner
            .columns
            .iter()
            .map(|def| AnyColumn::from_def(def.clone(), self.inner.identity.clone()))
            .collect()
    }

    /// Tables this table references through column foreign keys.
    pub fn referenced_tables(&self) -> Vec<Identity> {
        let mut out: Vec<Identity> = Vec::new();
        for def in &self.inner.columns {
            if let Some(reference) = def.reference() {
                if !out.contains(&reference.table) {
                    out.push(reference.table.clone());
                }
            }
        }
        out
    }

    /// The declared indices as standalone creatables.
    pub fn indices(&self) -> Vec<Index> {
        self.inner
            .indices
            .iter()
            .map(|def| Index {
                name: def.name.clone(),
                table: self.inner.identity.clone(),
                columns: def.columns.clone(),
                unique: def.unique,
            })
            .collect()
    }

    // ==================== query sugar ====================

    /// `SELECT <columns> FROM <this>`.
    pub fn select(&self, columns: impl IntoOperandList) -> SelectFrom {
        SelectFrom::new(columns.into_operand_list(), self.clone().into())
    }

    /// `SELECT <every declared column> FROM <this>`.
    pub fn select_all(&self) -> SelectFrom {
        let columns = self.columns().iter().map(|c| c.node()).collect();
        SelectFrom::new(columns, self.clone().into())
    }

    /// Every declared column, restricted by a predicate.
    pub fn select_where(&self, predicate: Expression<bool>) -> crate::query::QueryBuilder {
        self.select_all().where_(predicate)
    }

    /// `SELECT COUNT(*) FROM <this> [WHERE <predicate>]`.
    pub fn select_count(&self, predicate: Option<Expression<bool>>) -> crate::query::QueryBuilder {
        let select = SelectFrom::new(Vec::new(), self.clone().into());
        match predicate {
            Some(predicate) => select.where_(predicate).as_count(),
            None => select.all().as_count(),
        }
    }

    // ==================== join sugar ====================

    pub fn inner_join<T: Persisted>(
        &self,
        right: &Table,
        left_column: &Column<T>,
        right_column: &Column<T>,
    ) -> Join {
        Join::new(self.clone()).join(JoinType::Inner, right.clone(), left_column, right_column)
    }

    pub fn left_join<T: Persisted>(
        &self,
        right: &Table,
        left_column: &Column<T>,
        right_column: &Column<T>,
    ) -> Join {
        Join::new(self.clone()).join(JoinType::Left, right.clone(), left_column, right_column)
    }

    pub fn cross_join(&self, right: &Table) -> Join {
        Join::new(self.clone()).unconstrained(JoinType::Cross, right.clone())
    }

    pub fn natural_join(&self, right: &Table) -> Join {
        Join::new(self.clone()).unconstrained(JoinType::Natural, right.clone())
    }

    /// `"<this>" AS "<alias>"` with column handles rebindable onto the
    /// alias.
    pub fn alias(&self, alias: &str) -> super::alias::TableAlias {
        super::alias::TableAlias::new(self.clone(), alias)
    }

    // ==================== DDL ====================

    /// `CREATE [TEMP] TABLE IF NOT EXISTS ...` with column DDLs and
    /// table-level constraints.
    pub fn create_statement(&self, temporary: bool) -> Result<String> {
        build_str(|b| {
            b.append("CREATE ");
            if temporary {
                b.append("TEMP ");
            }
            b.append("TABLE IF NOT EXISTS ");
            b.append_identity(&self.inner.identity);
            b.append(" (");
            let composite: &[Identity] = self.inner.composite_pk.as_deref().unwrap_or(&[]);
            for (i, def) in self.inner.columns.iter().enumerate() {
                if i > 0 {
                    b.append(", ");
                }
                self.append_column_ddl(b, def)?;
            }
            if !composite.is_empty() {
                b.append(", CONSTRAINT ");
                let pk_name = Identity::forced(format_compact!(
                    "pk_{}",
                    self.inner.identity.unquoted()
                ));
                b.append_identity(&pk_name);
                b.append(" PRIMARY KEY ");
                b.append_each(composite, ", ", "(", ")", |b, column| {
                    b.append_identity(column);
                    Ok(())
                })?;
            }
            for def in &self.inner.columns {
                if let Some(reference) = def.reference() {
                    self.append_fk_constraint(b, def, reference)?;
                }
            }
            b.append_char(')');
            Ok(())
        })
    }

    fn append_column_ddl(&self, b: &mut SqlBuilder, def: &ColumnDef) -> Result<()> {
        b.append_identity(&def.name);
        b.append_char(' ').append(def.ty.sql_type());
        if !def.ty.is_nullable() {
            b.append(" NOT NULL");
        }
        if def.primary_key {
            b.append(" PRIMARY KEY");
            if def.descending_key {
                b.append(" DESC");
            }
            if def.autoincrement {
                b.append(" AUTOINCREMENT");
            }
        }
        if def.unique {
            b.append(" UNIQUE");
        }
        if let Some(collation) = &def.collation {
            b.append(" COLLATE ").append(collation);
        }
        if let Some(default) = &def.default {
            b.append(" DEFAULT ");
            match default {
                DefaultValue::Literal(value) => b.register_argument(def.ty, value)?,
                DefaultValue::Expr(expr) => {
                    b.append_char('(');
                    expr.append_to(b)?;
                    b.append_char(')');
                }
                DefaultValue::DbGenerated(raw) => {
                    b.append(raw);
                }
            }
        }
        Ok(())
    }

    fn append_fk_constraint(
        &self,
        b: &mut SqlBuilder,
        def: &ColumnDef,
        reference: &Reference,
    ) -> Result<()> {
        b.append(", CONSTRAINT ");
        let constraint = Identity::forced(format_compact!(
            "fk_{}_{}_{}",
            self.inner.identity.unquoted(),
            def.name.unquoted(),
            reference.column.unquoted()
        ));
        b.append_identity(&constraint);
        b.append(" FOREIGN KEY (");
        b.append_identity(&def.name);
        b.append(") REFERENCES ");
        b.append_identity(&reference.table);
        b.append_char('(');
        b.append_identity(&reference.column);
        b.append_char(')');
        if let Some(action) = reference.on_update {
            b.append(" ON UPDATE ").append(action.keyword());
        }
        if let Some(action) = reference.on_delete {
            b.append(" ON DELETE ").append(action.keyword());
        }
        Ok(())
    }

    /// The full DDL: the table statement followed by each declared index.
    pub fn ddl(&self, temporary: bool) -> Result<Vec<String>> {
        let mut out = vec![self.create_statement(temporary)?];
        for index in self.indices() {
            out.push(index.create_sql(false)?);
        }
        Ok(out)
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.inner.identity == other.inner.identity
    }
}

impl Creatable for Table {
    fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    fn kind(&self) -> SchemaObjectKind {
        SchemaObjectKind::Table
    }

    fn create_sql(&self, temporary: bool) -> Result<String> {
        self.create_statement(temporary)
    }

    fn drop_sql(&self) -> String {
        let mut sql = String::from("DROP TABLE IF EXISTS ");
        self.inner.identity.push_to(&mut sql);
        sql
    }
}

impl From<Table> for ColumnSet {
    fn from(table: Table) -> Self {
        ColumnSet::Table(table)
    }
}

impl From<&Table> for ColumnSet {
    fn from(table: &Table) -> Self {
        ColumnSet::Table(table.clone())
    }
}

/// A secondary index over table columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    name: Identity,
    table: Identity,
    columns: Vec<Identity>,
    unique: bool,
}

impl Index {
    #[inline]
    pub fn name(&self) -> &Identity {
        &self.name
    }

    #[inline]
    pub fn is_unique(&self) -> bool {
        self.unique
    }
}

impl Creatable for Index {
    fn identity(&self) -> &Identity {
        &self.name
    }

    fn kind(&self) -> SchemaObjectKind {
        SchemaObjectKind::Index
    }

    // Temporary is meaningless for an index; it follows its table.
    fn create_sql(&self, _temporary: bool) -> Result<String> {
        build_str(|b| {
            b.append("CREATE ");
            if self.unique {
                b.append("UNIQUE ");
            }
            b.append("INDEX IF NOT EXISTS ");
            b.append_identity(&self.name);
            b.append(" ON ");
            b.append_identity(&self.table);
            b.append_each(&self.columns, ", ", "(", ")", |b, column| {
                b.append_identity(column);
                Ok(())
            })
        })
    }

    fn drop_sql(&self) -> String {
        let mut sql = String::from("DROP INDEX IF EXISTS ");
        self.name.push_to(&mut sql);
        sql
    }
}

// ==================== declaration ====================

/// Collects a table declaration, handing out typed column handles as
/// columns are added. `build` validates the whole declaration.
#[derive(Debug)]
pub struct TableBuilder {
    identity: Identity,
    columns: Vec<Arc<ColumnDef>>,
    composite_pk: Option<Vec<Identity>>,
    indices: Vec<IndexDef>,
    errors: Vec<CoreError>,
}

impl TableBuilder {
    pub fn new(name: &str) -> Result<Self> {
        if name.to_ascii_lowercase().starts_with("sqlite_") {
            return Err(CoreError::schema(format!(
                "{name} is reserved for the system"
            )));
        }
        Ok(Self::new_unchecked(name))
    }

    /// Bypasses the reserved-prefix check; used for the read-only
    /// `sqlite_master` declaration.
    #[doc(hidden)]
    pub fn new_unchecked(name: &str) -> Self {
        TableBuilder {
            identity: Identity::forced(name),
            columns: Vec::new(),
            composite_pk: None,
            indices: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Declares a column of type `T`, configured by `cfg`, and returns
    /// its typed handle.
    pub fn column<T: Persisted>(
        &mut self,
        name: &str,
        cfg: impl FnOnce(ColumnConfig<T>) -> ColumnConfig<T>,
    ) -> Column<T> {
        let config = cfg(ColumnConfig::new());
        let (def, mut errors) = config.into_def(Identity::forced(name), T::TYPE);
        self.errors.append(&mut errors);
        let def = Arc::new(def);
        self.columns.push(def.clone());
        Column::new(def, self.identity.clone())
    }

    /// Declares a composite primary key over previously added columns.
    pub fn primary_key(&mut self, columns: &[&AnyColumn]) -> &mut Self {
        self.composite_pk = Some(columns.iter().map(|c| c.name().clone()).collect());
        self
    }

    /// Declares a non-unique index with the default
    /// `<table>_<col1>_<col2>` name.
    pub fn index(&mut self, columns: &[&AnyColumn]) -> &mut Self {
        self.named_index_inner(None, columns, false)
    }

    /// Declares a unique index with the default name plus `_unique`.
    pub fn unique_index(&mut self, columns: &[&AnyColumn]) -> &mut Self {
        self.named_index_inner(None, columns, true)
    }

    /// Declares an index under a caller-supplied name.
    pub fn named_index(&mut self, name: &str, columns: &[&AnyColumn], unique: bool) -> &mut Self {
        self.named_index_inner(Some(CompactString::new(name)), columns, unique)
    }

    fn named_index_inner(
        &mut self,
        name: Option<CompactString>,
        columns: &[&AnyColumn],
        unique: bool,
    ) -> &mut Self {
        let name = name.unwrap_or_else(|| {
            let mut generated = CompactString::new(self.identity.unquoted());
            for column in columns {
                generated.push('_');
                generated.push_str(column.name().unquoted());
            }
            if unique {
                generated.push_str("_unique");
            }
            generated
        });
        self.indices.push(IndexDef {
            name: Identity::forced(name),
            columns: columns.iter().map(|c| c.name().clone()).collect(),
            unique,
        });
        self
    }

    /// Validates the declaration and freezes it into a [`Table`].
    pub fn build(mut self) -> Result<Table> {
        if let Some(error) = self.errors.drain(..).next() {
            return Err(error);
        }
        self.check_unique_names()?;
        self.check_autoincrement()?;
        self.check_member_names()?;
        Ok(Table {
            inner: Arc::new(TableInner {
                identity: self.identity,
                columns: self.columns,
                composite_pk: self.composite_pk,
                indices: self.indices,
            }),
        })
    }

    fn check_unique_names(&self) -> Result<()> {
        for (i, def) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|other| other.name == def.name) {
                return Err(CoreError::schema(format!(
                    "duplicate column {} in table {}",
                    def.name,
                    self.identity.unquoted()
                )));
            }
        }
        Ok(())
    }

    fn check_autoincrement(&self) -> Result<()> {
        for def in &self.columns {
            if !def.autoincrement {
                continue;
            }
            if !def.primary_key || self.composite_pk.is_some() {
                return Err(CoreError::schema(format!(
                    "AUTOINCREMENT on {} requires a single-column primary key",
                    def.name
                )));
            }
            if def.ty.storage_class() != StorageClass::Integer {
                return Err(CoreError::schema(format!(
                    "AUTOINCREMENT on {} requires INTEGER affinity",
                    def.name
                )));
            }
        }
        let inline_keys = self.columns.iter().filter(|d| d.primary_key).count();
        if inline_keys > 1 {
            return Err(CoreError::schema(format!(
                "table {} declares more than one inline primary key",
                self.identity.unquoted()
            )));
        }
        if inline_keys == 1 && self.composite_pk.is_some() {
            return Err(CoreError::schema(format!(
                "table {} declares both an inline and a composite primary key",
                self.identity.unquoted()
            )));
        }
        Ok(())
    }

    fn check_member_names(&self) -> Result<()> {
        let known = |name: &Identity| self.columns.iter().any(|d| &d.name == name);
        if let Some(composite) = &self.composite_pk {
            for name in composite {
                if !known(name) {
                    return Err(CoreError::schema(format!(
                        "primary key names unknown column {name}"
                    )));
                }
            }
        }
        for index in &self.indices {
            for name in &index.columns {
                if !known(name) {
                    return Err(CoreError::schema(format!(
                        "index {} names unknown column {name}",
                        index.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Per-column constraint configuration, applied inside the closure given
/// to [`TableBuilder::column`].
pub struct ColumnConfig<T> {
    primary_key: bool,
    autoincrement: bool,
    descending_key: bool,
    unique: bool,
    collation: Option<CompactString>,
    default: Option<DefaultValue>,
    reference: Option<Reference>,
    errors: Vec<CoreError>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Persisted> ColumnConfig<T> {
    fn new() -> Self {
        ColumnConfig {
            primary_key: false,
            autoincrement: false,
            descending_key: false,
            unique: false,
            collation: None,
            default: None,
            reference: None,
            errors: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.primary_key = true;
        self.autoincrement = true;
        self
    }

    /// Orders the single-column primary key descending.
    pub fn desc(mut self) -> Self {
        self.descending_key = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn collate(mut self, collation: &str) -> Self {
        self.collation = Some(CompactString::new(collation));
        self
    }

    pub fn default_value(mut self, value: T) -> Self {
        self.default = Some(DefaultValue::Literal(value.into_value()));
        self
    }

    pub fn default_expr(mut self, expr: Expression<T>) -> Self {
        self.default = Some(DefaultValue::Expr(expr.into_node()));
        self
    }

    /// A default the database computes, e.g. `CURRENT_TIMESTAMP`.
    pub fn db_default(mut self, raw: &str) -> Self {
        self.default = Some(DefaultValue::DbGenerated(CompactString::new(raw)));
        self
    }

    /// Declares a foreign key to `column`. The referenced column's value
    /// shape must match this column's.
    pub fn references<U: Persisted>(mut self, column: &Column<U>) -> Self {
        if U::TYPE.shape() != T::TYPE.shape() {
            self.errors.push(CoreError::type_mismatch(format!(
                "reference to {} has shape {:?}, column is {:?}",
                column.name(),
                U::TYPE.shape(),
                T::TYPE.shape()
            )));
        }
        self.reference = Some(Reference {
            table: column.qualifier().clone(),
            column: column.name().clone(),
            column_type: U::TYPE,
            on_delete: None,
            on_update: None,
        });
        self
    }

    pub fn on_delete(mut self, action: FkAction) -> Self {
        match &mut self.reference {
            Some(reference) => reference.on_delete = Some(action),
            None => self.errors.push(CoreError::schema(
                "on_delete requires a preceding references()",
            )),
        }
        self
    }

    pub fn on_update(mut self, action: FkAction) -> Self {
        match &mut self.reference {
            Some(reference) => reference.on_update = Some(action),
            None => self.errors.push(CoreError::schema(
                "on_update requires a preceding references()",
            )),
        }
        self
    }

    fn into_def(self, name: Identity, ty: PersistentType) -> (ColumnDef, Vec<CoreError>) {
        let def = ColumnDef {
            name,
            ty,
            primary_key: self.primary_key,
            autoincrement: self.autoincrement,
            descending_key: self.descending_key,
            unique: self.unique,
            collation: self.collation,
            default: self.default,
            reference: self.reference,
        };
        (def, self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media_table() -> (Table, Column<i64>, Column<Option<String>>) {
        let mut tb = TableBuilder::new("MediaFile").unwrap();
        let id = tb.column::<i64>("_id", |c| c.primary_key());
        let uri = tb.column::<Option<String>>("MediaUri", |c| c);
        (tb.build().unwrap(), id, uri)
    }

    #[test]
    fn simple_table_ddl() {
        let (table, _, _) = media_table();
        assert_eq!(
            table.create_statement(false).unwrap(),
            "CREATE TABLE IF NOT EXISTS \"MediaFile\" (\"_id\" INTEGER NOT NULL PRIMARY KEY, \
             \"MediaUri\" TEXT)"
        );
    }

    #[test]
    fn temporary_table_ddl() {
        let (table, _, _) = media_table();
        assert!(
            table
                .create_statement(true)
                .unwrap()
                .starts_with("CREATE TEMP TABLE IF NOT EXISTS")
        );
    }

    #[test]
    fn composite_primary_key_is_a_table_constraint() {
        let mut tb = TableBuilder::new("Account").unwrap();
        let id1 = tb.column::<i64>("id1", |c| c);
        let id2 = tb.column::<i64>("id2", |c| c);
        tb.primary_key(&[&id1.erase(), &id2.erase()]);
        let table = tb.build().unwrap();
        assert_eq!(
            table.create_statement(false).unwrap(),
            "CREATE TABLE IF NOT EXISTS \"Account\" (\"id1\" INTEGER NOT NULL, \
             \"id2\" INTEGER NOT NULL, CONSTRAINT \"pk_Account\" PRIMARY KEY (\"id1\", \"id2\"))"
        );
    }

    #[test]
    fn foreign_key_renders_as_table_constraint() {
        let mut artist_tb = TableBuilder::new("Artist").unwrap();
        let artist_id = artist_tb.column::<i64>("ArtistId", |c| c.auto_increment());
        artist_tb.column::<String>("ArtistName", |c| c);
        let _artist = artist_tb.build().unwrap();

        let mut album_tb = TableBuilder::new("Album").unwrap();
        album_tb.column::<i64>("AlbumId", |c| c.auto_increment());
        album_tb.column::<i64>("ArtistId", |c| {
            c.references(&artist_id).on_delete(FkAction::Cascade)
        });
        let album = album_tb.build().unwrap();

        let ddl = album.create_statement(false).unwrap();
        assert!(ddl.contains(
            "CONSTRAINT \"fk_Album_ArtistId_ArtistId\" FOREIGN KEY (\"ArtistId\") \
             REFERENCES \"Artist\"(\"ArtistId\") ON DELETE CASCADE"
        ));
    }

    #[test]
    fn autoincrement_requires_integer_single_pk() {
        let mut tb = TableBuilder::new("Bad").unwrap();
        tb.column::<String>("name", |c| c.auto_increment());
        assert!(matches!(tb.build(), Err(CoreError::Schema(_))));
    }

    #[test]
    fn duplicate_columns_rejected() {
        let mut tb = TableBuilder::new("Dup").unwrap();
        tb.column::<i64>("a", |c| c);
        tb.column::<i64>("a", |c| c);
        assert!(matches!(tb.build(), Err(CoreError::Schema(_))));
    }

    #[test]
    fn system_prefix_rejected() {
        assert!(TableBuilder::new("sqlite_master").is_err());
    }

    #[test]
    fn mismatched_reference_shape_rejected() {
        let mut a_tb = TableBuilder::new("A").unwrap();
        let a_id = a_tb.column::<i64>("id", |c| c.primary_key());
        let _a = a_tb.build().unwrap();

        let mut b_tb = TableBuilder::new("B").unwrap();
        b_tb.column::<String>("a_ref", |c| c.references(&a_id));
        assert!(matches!(b_tb.build(), Err(CoreError::TypeMismatch(_))));
    }

    #[test]
    fn default_index_names() {
        let mut tb = TableBuilder::new("Song").unwrap();
        let title = tb.column::<String>("Title", |c| c);
        let year = tb.column::<i64>("Year", |c| c);
        tb.index(&[&title.erase(), &year.erase()]);
        tb.unique_index(&[&title.erase()]);
        let table = tb.build().unwrap();
        let indices = table.indices();
        assert_eq!(indices[0].name().unquoted(), "Song_Title_Year");
        assert_eq!(indices[1].name().unquoted(), "Song_Title_unique");
        assert_eq!(
            indices[1].create_sql(false).unwrap(),
            "CREATE UNIQUE INDEX IF NOT EXISTS \"Song_Title_unique\" ON \"Song\"(\"Title\")"
        );
    }

    #[test]
    fn column_equality_is_owner_and_name() {
        let (_, id, _) = media_table();
        let (_, id_again, _) = media_table();
        assert_eq!(id, id_again);
    }

    #[test]
    fn defaults_render_in_ddl() {
        let mut tb = TableBuilder::new("Prefs").unwrap();
        tb.column::<String>("theme", |c| c.default_value("dark".to_owned()));
        tb.column::<i64>("opened", |c| c.db_default("CURRENT_TIMESTAMP"));
        let table = tb.build().unwrap();
        let ddl = table.create_statement(false).unwrap();
        assert!(ddl.contains("\"theme\" TEXT NOT NULL DEFAULT 'dark'"));
        assert!(ddl.contains("\"opened\" INTEGER NOT NULL DEFAULT CURRENT_TIMESTAMP"));
    }
}
