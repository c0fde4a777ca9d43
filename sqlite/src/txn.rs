//! The transaction kernel.
//!
//! Transactions are scoped: [`Database::transaction`] begins the
//! underlying SQLite transaction (`BEGIN IMMEDIATE`, or `BEGIN EXCLUSIVE`
//! for the exclusive variant), runs the closure with a [`Transaction`]
//! receiver, and ends it when the closure returns. Commit happens only
//! when the receiver was marked successful; a closure error or an
//! unmarked close rolls back. Nested scopes reuse the outer SQLite
//! transaction; a nested rollback poisons the outer commit.

use crate::bind::ArgBinder;
use crate::db::{Database, Queries, view_aliases_supported};
use crate::error::{Error, Result};
use crate::token::CancellationToken;
use compact_str::CompactString;
use welite_core::builder::StatementSeed;
use welite_core::query::QueryBuilder;
use welite_core::source::{CompoundSelect, Creatable, Table, View};
use welite_core::stmt::{DeleteStatement, InsertStatement, UpdateStatement};

/// The transaction state machine:
/// `Active -> {Successful, RolledBack} -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Successful,
    RolledBack,
    Closed,
}

/// Options for [`Database::transaction_with`].
#[derive(Debug, Clone, Default)]
pub struct TransactionOptions {
    /// `BEGIN EXCLUSIVE` instead of `BEGIN IMMEDIATE`.
    pub exclusive: bool,
    /// Mark successful automatically when the closure returns `Ok`.
    pub auto_commit: bool,
    /// Cooperative cancellation; checked before statements and between
    /// cursor rows.
    pub token: Option<CancellationToken>,
}

type CommitCallback = Box<dyn FnOnce() + Send>;

/// The read-write receiver handed to a transaction closure.
pub struct Transaction<'db> {
    db: &'db Database,
    unit_of_work: CompactString,
    state: TransactionState,
    nested: bool,
    callbacks: Vec<CommitCallback>,
    token: Option<CancellationToken>,
}

impl<'db> Transaction<'db> {
    #[inline]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    #[inline]
    pub fn unit_of_work(&self) -> &str {
        &self.unit_of_work
    }

    /// Marks the transaction for commit. Idempotent while marked; an
    /// error once rolled back or closed.
    pub fn set_successful(&mut self) -> Result<()> {
        match self.state {
            TransactionState::Active => {
                self.state = TransactionState::Successful;
                Ok(())
            }
            TransactionState::Successful => Ok(()),
            TransactionState::RolledBack => Err(Error::transaction_state(
                "set_successful after rollback",
            )),
            TransactionState::Closed => {
                Err(Error::transaction_state("set_successful after close"))
            }
        }
    }

    /// Marks the transaction for rollback; also poisons any outer
    /// transaction this scope is nested in.
    pub fn rollback(&mut self) -> Result<()> {
        if self.state == TransactionState::Closed {
            return Err(Error::transaction_state("rollback after close"));
        }
        self.state = TransactionState::RolledBack;
        self.db.txn_rolled_back.set(true);
        Ok(())
    }

    /// Queues a callback fired after the underlying commit succeeds, in
    /// registration order. Panics from callbacks are caught and logged.
    pub fn on_commit(&mut self, f: impl FnOnce() + Send + 'static) {
        self.callbacks.push(Box::new(f));
    }

    /// The read receiver scoped to this transaction.
    pub fn queries(&self) -> Queries<'db> {
        Queries {
            db: self.db,
            token: self.token.clone(),
        }
    }

    fn ensure_usable(&self) -> Result<()> {
        match self.state {
            TransactionState::Active | TransactionState::Successful => {
                if let Some(token) = &self.token {
                    token.ensure_active()?;
                }
                Ok(())
            }
            TransactionState::RolledBack => {
                Err(Error::transaction_state("statement after rollback"))
            }
            TransactionState::Closed => Err(Error::transaction_state("statement after close")),
        }
    }

    // ==================== mutations ====================

    /// Executes the insert; returns the new row id.
    pub fn insert(
        &self,
        statement: &InsertStatement,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
    ) -> Result<i64> {
        self.ensure_usable()?;
        let seed = statement.seed()?;
        self.db.run_insert(&seed, bind, self.token.as_ref())
    }

    /// Executes the update; returns the affected-row count.
    pub fn update(
        &self,
        statement: &UpdateStatement,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
    ) -> Result<usize> {
        self.ensure_usable()?;
        let seed = statement.seed()?;
        self.db.run_update_delete(&seed, bind, self.token.as_ref())
    }

    /// Executes the delete; returns the affected-row count.
    pub fn delete(
        &self,
        statement: &DeleteStatement,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
    ) -> Result<usize> {
        self.ensure_usable()?;
        let seed = statement.seed()?;
        self.db.run_update_delete(&seed, bind, self.token.as_ref())
    }

    /// Executes an arbitrary pre-built seed; returns the affected-row
    /// count.
    pub fn exec_seed(
        &self,
        seed: &StatementSeed,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
    ) -> Result<usize> {
        self.ensure_usable()?;
        self.db.run_update_delete(seed, bind, self.token.as_ref())
    }

    // ==================== queries ====================

    pub fn rows<R>(
        &self,
        query: &QueryBuilder,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
        f: impl FnMut(&crate::cursor::Row<'_>) -> Result<R>,
    ) -> Result<Vec<R>> {
        self.ensure_usable()?;
        self.queries().rows(query, bind, f)
    }

    pub fn count(
        &self,
        query: &QueryBuilder,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
    ) -> Result<i64> {
        self.ensure_usable()?;
        self.queries().count(query, bind)
    }

    pub fn count_compound(
        &self,
        compound: &CompoundSelect,
        bind: impl FnOnce(&mut ArgBinder<'_, '_>) -> welite_core::Result<()>,
    ) -> Result<i64> {
        self.ensure_usable()?;
        self.queries().count_compound(compound, bind)
    }

    // ==================== DDL ====================

    /// Creates the object (`CREATE ... IF NOT EXISTS`).
    pub fn create(&self, object: &dyn Creatable) -> Result<()> {
        self.create_object(object, false)
    }

    /// Creates the object as `TEMP`.
    pub fn create_temporary(&self, object: &dyn Creatable) -> Result<()> {
        self.create_object(object, true)
    }

    fn create_object(&self, object: &dyn Creatable, temporary: bool) -> Result<()> {
        self.ensure_usable()?;
        let sql = object.create_sql(temporary)?;
        self.db.exec_ddl(&sql)
    }

    /// Creates the table and each of its declared indices.
    pub fn create_table(&self, table: &Table) -> Result<()> {
        self.ensure_usable()?;
        for sql in table.ddl(false)? {
            self.db.exec_ddl(&sql)?;
        }
        Ok(())
    }

    /// Creates the view, emitting its column-alias list only when the
    /// linked SQLite supports it.
    pub fn create_view(&self, view: &View) -> Result<()> {
        self.ensure_usable()?;
        let sql = view.render_create(false, view_aliases_supported())?;
        self.db.exec_ddl(&sql)
    }

    /// Drops the object (`DROP ... IF EXISTS`).
    pub fn drop_object(&self, object: &dyn Creatable) -> Result<()> {
        self.ensure_usable()?;
        self.db.exec_ddl(&object.drop_sql())
    }

    /// True when the object is recorded in `sqlite_master`.
    pub fn exists(&self, object: &dyn Creatable) -> Result<bool> {
        self.ensure_usable()?;
        self.db.exists(object)
    }

    pub(crate) fn exec_raw(&self, sql: &str) -> Result<()> {
        self.ensure_usable()?;
        self.db.exec_ddl(sql)
    }
}

impl Database {
    /// A non-exclusive (`BEGIN IMMEDIATE`) transaction. The closure must
    /// call [`Transaction::set_successful`] for the work to commit.
    pub fn transaction<R>(
        &self,
        unit_of_work: &str,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<R>,
    ) -> Result<R> {
        self.transaction_with(unit_of_work, TransactionOptions::default(), f)
    }

    /// An exclusive (`BEGIN EXCLUSIVE`) transaction.
    pub fn exclusive_transaction<R>(
        &self,
        unit_of_work: &str,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<R>,
    ) -> Result<R> {
        self.transaction_with(
            unit_of_work,
            TransactionOptions {
                exclusive: true,
                ..TransactionOptions::default()
            },
            f,
        )
    }

    /// A transaction marked successful automatically when the closure
    /// returns `Ok`.
    pub fn auto_commit<R>(
        &self,
        unit_of_work: &str,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<R>,
    ) -> Result<R> {
        self.transaction_with(
            unit_of_work,
            TransactionOptions {
                auto_commit: true,
                ..TransactionOptions::default()
            },
            f,
        )
    }

    /// The fully configurable transaction entry point.
    pub fn transaction_with<R>(
        &self,
        unit_of_work: &str,
        options: TransactionOptions,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<R>,
    ) -> Result<R> {
        self.guard()?;
        if let Some(token) = &options.token {
            token.ensure_active()?;
        }
        let nested = self.txn_depth.get() > 0;
        if !nested {
            self.txn_rolled_back.set(false);
            self.exec_ddl(if options.exclusive {
                "BEGIN EXCLUSIVE"
            } else {
                "BEGIN IMMEDIATE"
            })?;
        }
        self.txn_depth.set(self.txn_depth.get() + 1);
        let mut tx = Transaction {
            db: self,
            unit_of_work: CompactString::new(unit_of_work),
            state: TransactionState::Active,
            nested,
            callbacks: Vec::new(),
            token: options.token,
        };
        let result = f(&mut tx);
        self.finish(tx, result, options.auto_commit)
    }

    fn finish<R>(
        &self,
        mut tx: Transaction<'_>,
        result: Result<R>,
        auto_commit: bool,
    ) -> Result<R> {
        self.txn_depth.set(self.txn_depth.get() - 1);
        let outer = !tx.nested;

        let value = match result {
            Err(error) => {
                self.txn_rolled_back.set(true);
                if outer {
                    self.end_underlying(false);
                }
                tx.state = TransactionState::Closed;
                return Err(match error {
                    Error::Cancelled => Error::Cancelled,
                    wrapped @ Error::Uncaught { .. } => wrapped,
                    other => Error::Uncaught {
                        unit_of_work: tx.unit_of_work.clone(),
                        source: Box::new(other),
                    },
                });
            }
            Ok(value) => value,
        };

        if auto_commit && tx.state == TransactionState::Active {
            tx.state = TransactionState::Successful;
        }

        let mut unmarked = None;
        let success = match tx.state {
            TransactionState::Successful => true,
            TransactionState::RolledBack | TransactionState::Closed => false,
            TransactionState::Active => {
                tracing::warn!(
                    unit_of_work = %tx.unit_of_work,
                    "transaction closed without set_successful or rollback; rolling back"
                );
                if self.throw_if_no_choice {
                    unmarked = Some(Error::UnmarkedTransaction(tx.unit_of_work.clone()));
                }
                self.txn_rolled_back.set(true);
                false
            }
        };

        if success {
            self.pending_commit_callbacks
                .borrow_mut()
                .append(&mut tx.callbacks);
        }

        if outer {
            let commit = success && !self.txn_rolled_back.get();
            if commit {
                if let Err(error) = self.exec_ddl("COMMIT") {
                    tx.state = TransactionState::Closed;
                    self.pending_commit_callbacks.borrow_mut().clear();
                    self.end_underlying(false);
                    return Err(error);
                }
                self.fire_commit_callbacks();
            } else {
                self.end_underlying(false);
                self.pending_commit_callbacks.borrow_mut().clear();
            }
        }
        tx.state = TransactionState::Closed;

        match unmarked {
            Some(error) => Err(error),
            None => Ok(value),
        }
    }

    fn end_underlying(&self, commit: bool) {
        let sql = if commit { "COMMIT" } else { "ROLLBACK" };
        if let Err(error) = self.exec_ddl(sql) {
            // A failed ROLLBACK usually means the engine already rolled
            // the transaction back (e.g. after SQLITE_FULL).
            tracing::error!(%error, sql, "ending transaction failed");
        }
    }

    fn fire_commit_callbacks(&self) {
        let callbacks: Vec<CommitCallback> =
            self.pending_commit_callbacks.borrow_mut().drain(..).collect();
        for callback in callbacks {
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(callback)).is_err() {
                tracing::warn!("commit callback panicked");
            }
        }
    }
}
