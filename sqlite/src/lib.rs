//! # welite-sqlite
//!
//! The engine half of WeLite: binds the `welite-core` DSL to SQLite
//! through rusqlite. Provides the database open/close lifecycle with
//! schema creation, migration, and integrity diagnostics; the statement
//! registry with typed positional binding; lazy cursors with cooperative
//! cancellation; and the scoped transaction kernel.

pub mod bind;
pub mod cache;
pub mod cursor;
pub mod db;
pub mod error;
pub mod master;
pub mod migration;
pub mod pragma;
pub mod token;
pub mod txn;

mod values;

pub use bind::{ArgBinder, no_args};
pub use cache::CacheStats;
pub use cursor::{Cursor, Row};
pub use db::{Database, DbPath, DbState, Lifecycle, OpenParams, Queries, Schema};
pub use error::{Error, Result};
pub use master::{SqliteMaster, sqlite_master};
pub use migration::{Migration, find_migration_path};
pub use pragma::{
    ForeignKeyInfo, ForeignKeyViolation, JournalMode, SynchronousMode, TableColumnInfo,
};
pub use token::CancellationToken;
pub use txn::{Transaction, TransactionOptions, TransactionState};

/// Everything an application module typically needs to open and use a
/// database.
pub mod prelude {
    pub use crate::bind::{ArgBinder, no_args};
    pub use crate::cursor::{Cursor, Row};
    pub use crate::db::{Database, DbPath, DbState, Lifecycle, OpenParams, Queries, Schema};
    pub use crate::error::Error;
    pub use crate::migration::Migration;
    pub use crate::pragma::{JournalMode, SynchronousMode};
    pub use crate::token::CancellationToken;
    pub use crate::txn::{Transaction, TransactionOptions, TransactionState};
}
