//! Error types for welite-sqlite

use compact_str::CompactString;
use thiserror::Error;
use welite_core::CoreError;

/// Errors surfaced by the engine binding, statement execution, schema
/// lifecycle, and the transaction kernel.
#[derive(Debug, Error)]
pub enum Error {
    /// Schema, encoding, and binding failures from the DSL core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Passthrough of SQLite failures: constraint, corruption, busy.
    #[error("engine error: {0}")]
    Engine(#[from] rusqlite::Error),

    /// Work attempted from a thread other than the database's owner while
    /// the thread guard is active.
    #[error("database work attempted on a disallowed thread")]
    WrongThread,

    /// A transaction closed while still `Active` with
    /// `throw_if_no_choice` set.
    #[error("transaction '{0}' closed without success or rollback")]
    UnmarkedTransaction(CompactString),

    /// A failure from user code inside a transaction, wrapped with the
    /// unit-of-work name after rollback.
    #[error("transaction '{unit_of_work}' failed: {source}")]
    Uncaught {
        unit_of_work: CompactString,
        #[source]
        source: Box<Error>,
    },

    /// No migration path covered the version gap and migration was
    /// required.
    #[error("no migration path from version {from} to {to}")]
    MigrationMissing { from: i64, to: i64 },

    /// The cancellation token fired; the transaction rolled back.
    #[error("operation cancelled")]
    Cancelled,

    /// The database has been closed (or is closing under an in-flight
    /// operation).
    #[error("database is closed")]
    Closed,

    /// An operation invalid for the transaction's current state.
    #[error("invalid transaction state: {0}")]
    TransactionState(CompactString),
}

impl Error {
    pub(crate) fn transaction_state(msg: impl AsRef<str>) -> Self {
        Error::TransactionState(CompactString::new(msg.as_ref()))
    }
}

/// Result type for database operations
pub type Result<T> = core::result::Result<T, Error>;
