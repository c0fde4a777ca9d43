//! Views: named, stored selects.

use super::column::{AnyColumn, Column, ColumnDef};
use super::{ColumnSet, Creatable, SchemaObjectKind};
use crate::builder::{SqlBuilder, build_str};
use crate::error::{CoreError, Result};
use crate::expr::IntoOperandList;
use crate::identity::Identity;
use crate::query::{QueryBuilder, QuerySeed, SeedColumn, SelectFrom};
use crate::types::Persisted;
use std::sync::Arc;

/// A view over a stored query. Views are not parameterisable: the backing
/// query must carry no bind placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    identity: Identity,
    seed: QuerySeed,
    /// Explicit column-name list, emitted when the engine supports it.
    aliases: Option<Vec<Identity>>,
}

impl View {
    pub fn new(name: &str, query: &QueryBuilder) -> Result<Self> {
        Self::build(name, query, None)
    }

    /// A view with an explicit column-name list.
    pub fn with_columns(name: &str, query: &QueryBuilder, columns: &[&str]) -> Result<Self> {
        Self::build(
            name,
            query,
            Some(columns.iter().map(|c| Identity::forced(c)).collect()),
        )
    }

    fn build(name: &str, query: &QueryBuilder, aliases: Option<Vec<Identity>>) -> Result<Self> {
        if name.to_ascii_lowercase().starts_with("sqlite_") {
            return Err(CoreError::schema(format!(
                "{name} is reserved for the system"
            )));
        }
        let seed = query.seed()?;
        if !seed.types.is_empty() {
            return Err(CoreError::schema(
                "a view's query must not carry bind placeholders",
            ));
        }
        if let Some(aliases) = &aliases {
            if aliases.len() != seed.columns.len() {
                return Err(CoreError::schema(format!(
                    "view {name} names {} column(s) for {} result column(s)",
                    aliases.len(),
                    seed.columns.len()
                )));
            }
        }
        Ok(View {
            identity: Identity::forced(name),
            seed,
            aliases,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.identity.unquoted()
    }

    fn seed_columns(&self) -> Vec<SeedColumn> {
        match &self.aliases {
            Some(aliases) => self
                .seed
                .columns
                .iter()
                .zip(aliases)
                .map(|(column, alias)| SeedColumn {
                    name: alias.clone(),
                    ty: column.ty,
                })
                .collect(),
            None => self.seed.columns.clone(),
        }
    }

    pub fn columns(&self) -> Vec<AnyColumn> {
        self.seed_columns()
            .into_iter()
            .map(|column| {
                AnyColumn::from_def(
                    Arc::new(ColumnDef::synthetic(column.name, column.ty)),
                    self.identity.clone(),
                )
            })
            .collect()
    }

    /// The view's column at `index` as a typed handle qualified by the
    /// view's name.
    pub fn column_at<T: Persisted>(&self, index: usize) -> Result<Column<T>> {
        let columns = self.seed_columns();
        let column = columns.get(index).ok_or_else(|| {
            CoreError::schema(format!(
                "view {} has {} column(s), index {index} out of range",
                self.name(),
                columns.len()
            ))
        })?;
        if column.ty != T::TYPE {
            return Err(CoreError::type_mismatch(format!(
                "view column {} is {:?}",
                column.name, column.ty
            )));
        }
        let def = Arc::new(ColumnDef::synthetic(column.name.clone(), column.ty));
        Ok(Column::new(def, self.identity.clone()))
    }

    pub fn select(&self, columns: impl IntoOperandList) -> SelectFrom {
        SelectFrom::new(columns.into_operand_list(), self.clone().into())
    }

    pub fn select_all(&self) -> SelectFrom {
        let columns = self.columns().iter().map(|c| c.node()).collect();
        SelectFrom::new(columns, self.clone().into())
    }

    /// Renders `CREATE VIEW`; the column-alias list is emitted only when
    /// the caller reports the engine supports it.
    pub fn render_create(&self, temporary: bool, with_aliases: bool) -> Result<String> {
        build_str(|b| {
            b.append("CREATE ");
            if temporary {
                b.append("TEMP ");
            }
            b.append("VIEW IF NOT EXISTS ");
            b.append_identity(&self.identity);
            if with_aliases {
                if let Some(aliases) = &self.aliases {
                    b.append_char(' ');
                    b.append_each(aliases, ", ", "(", ")", |b, alias| {
                        b.append_identity(alias);
                        Ok(())
                    })?;
                }
            }
            b.append(" AS ").append(&self.seed.sql);
            Ok(())
        })
    }

    pub(crate) fn append_from(&self, b: &mut SqlBuilder) -> Result<()> {
        b.append_identity(&self.identity);
        Ok(())
    }
}

impl Creatable for View {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn kind(&self) -> SchemaObjectKind {
        SchemaObjectKind::View
    }

    fn create_sql(&self, temporary: bool) -> Result<String> {
        self.render_create(temporary, true)
    }

    fn drop_sql(&self) -> String {
        let mut sql = String::from("DROP VIEW IF EXISTS ");
        self.identity.push_to(&mut sql);
        sql
    }
}

impl From<View> for ColumnSet {
    fn from(view: View) -> Self {
        ColumnSet::View(Box::new(view))
    }
}
