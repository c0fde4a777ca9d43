//! # welite-core
//!
//! The engine-independent half of WeLite: a typed, composable SQL DSL for
//! the SQLite dialect. Schemas, expressions, queries, and mutation
//! statements are values; builders serialise them through a pooled
//! [`builder::SqlBuilder`] into `(sql, types)` seeds that the
//! `welite-sqlite` crate compiles, binds, and executes.
//!
//! Layers, bottom up:
//!
//! - [`types`] — persistent types: value shapes, affinities, literals,
//!   primitive binds.
//! - [`identity`] / [`builder`] — identifier quoting and the pooled SQL
//!   builder with its parallel placeholder-type list.
//! - [`expr`] — the sealed expression algebra.
//! - [`source`] — column sets: tables, joins, aliases, compound selects,
//!   views.
//! - [`query`] / [`stmt`] — `SELECT` assembly and INSERT/UPDATE/DELETE.
//! - [`trigger`] / [`deps`] — trigger DSL and the foreign-key dependency
//!   sort.

pub mod builder;
pub mod deps;
pub mod error;
pub mod expr;
pub mod identity;
pub mod query;
pub mod source;
pub mod stmt;
pub mod trigger;
pub mod types;

pub use error::{CoreError, Result};

/// Everything a schema declaration or query site typically needs.
pub mod prelude {
    pub use crate::builder::{StatementSeed, build_seed, build_str, pool_stats};
    pub use crate::deps::TableDependencies;
    pub use crate::error::CoreError;
    pub use crate::expr::{
        Expression, IntoExpression, RaiseAction, bind_arg, case, case_of, concat_with,
        count_star, exists, literal, not, not_exists, raise, raise_ignore,
    };
    pub use crate::identity::Identity;
    pub use crate::query::{QueryBuilder, QuerySeed, SelectFrom, SortOrder};
    pub use crate::source::{
        AnyColumn, Column, ColumnSet, CompoundOp, CompoundSelect, Creatable, FkAction, Index,
        Join, JoinType, QueryAlias, SchemaObjectKind, Table, TableAlias, TableBuilder, View,
    };
    pub use crate::stmt::{
        ColumnValues, ConflictPolicy, DeleteStatement, InsertStatement, UpdateStatement,
    };
    pub use crate::trigger::{Trigger, TriggerScope};
    pub use crate::types::{Persisted, PersistentType, SqliteValue, StorageClass};
}
